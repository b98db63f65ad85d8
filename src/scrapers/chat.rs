use crate::scrapers::{ensure_success, trim_base, ScraperError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub model: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions API
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(http: Client, base_url: Option<String>, api_key: Option<String>, model: String) -> Self {
        Self {
            http,
            base_url: base_url.as_deref().map(trim_base).filter(|u| !u.is_empty()),
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    /// Send a single-turn conversation and return the first choice
    pub async fn complete(&self, text: &str, system: Option<&str>) -> Result<ChatReply, ScraperError> {
        let base_url = self.base_url.as_ref().ok_or(ScraperError::NotConfigured("chat"))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system.map(str::trim).filter(|s| !s.is_empty()) {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": text }));

        let payload = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });

        let mut request = self
            .http
            .post(format!("{}/chat/completions", base_url))
            .json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!("Requesting chat completion from {} ({})", base_url, self.model);

        let response = ensure_success(request.send().await?).await?;
        let completion: CompletionResponse = response.json().await?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ScraperError::InvalidResponse("completion has no content".into()))?;

        Ok(ChatReply {
            model: completion.model.unwrap_or_else(|| self.model.clone()),
            reply,
            usage: completion.usage,
        })
    }
}
