//! Upstream scrapers, one client per external data source.

pub mod chat;
pub mod metadata;
pub mod shortlink;
pub mod waifu;
pub mod wikipedia;

pub use chat::{ChatClient, ChatReply, ChatUsage};
pub use metadata::PageScraper;
pub use shortlink::{ShortLink, ShortlinkClient};
pub use waifu::{WaifuClient, WaifuImage};
pub use wikipedia::{WikipediaClient, WikiSummary};

use crate::config::UpstreamSettings;
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use thiserror::Error;

/// Longest upstream error body echoed back in error messages
const MAX_ERROR_BODY: usize = 200;

/// Errors that can occur while talking to an upstream
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[source] reqwest::Error),

    #[error("Upstream timed out")]
    Timeout,

    #[error("Upstream returned {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} upstream is not configured")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ScraperError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScraperError::Timeout
        } else if err.is_decode() {
            ScraperError::InvalidResponse(err.to_string())
        } else {
            ScraperError::RequestError(err)
        }
    }
}

/// Every scraper client, cloned into each worker
#[derive(Clone)]
pub struct Scrapers {
    pub chat: ChatClient,
    pub waifu: WaifuClient,
    pub wikipedia: WikipediaClient,
    pub metadata: PageScraper,
    pub shortlink: ShortlinkClient,
}

impl Scrapers {
    pub fn from_settings(settings: &UpstreamSettings) -> Result<Self, ScraperError> {
        let http = build_http_client(settings)?;

        Ok(Self {
            chat: ChatClient::new(
                http.clone(),
                settings.chat_url.clone(),
                settings.chat_api_key.clone(),
                settings.chat_model.clone(),
            ),
            waifu: WaifuClient::new(http.clone(), settings.waifu_url.clone()),
            wikipedia: WikipediaClient::new(http.clone(), settings.wikipedia_url.clone()),
            metadata: PageScraper::from_settings(settings)?,
            shortlink: ShortlinkClient::new(http, settings.shortlink_url.clone()),
        })
    }
}

/// Shared HTTP client with the configured user agent and timeout
pub fn build_http_client(settings: &UpstreamSettings) -> Result<Client, ScraperError> {
    http_client_builder(settings)
        .build()
        .map_err(ScraperError::RequestError)
}

pub(crate) fn http_client_builder(settings: &UpstreamSettings) -> ClientBuilder {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(settings.timeout_secs.min(10)))
}

/// Turn a non-2xx upstream response into `UpstreamStatus`
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = status.canonical_reason().unwrap_or("no body").to_string();
    }

    tracing::debug!("Upstream error {}: {}", status, message);
    Err(ScraperError::UpstreamStatus {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrapers_from_default_settings() {
        let scrapers = Scrapers::from_settings(&UpstreamSettings::default()).unwrap();
        assert!(!scrapers.chat.is_configured());
    }

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("https://api.waifu.pics/"), "https://api.waifu.pics");
        assert_eq!(trim_base("https://is.gd"), "https://is.gd");
    }

    #[test]
    fn test_error_messages() {
        let err = ScraperError::UpstreamStatus {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 503: maintenance");
        assert_eq!(ScraperError::NotConfigured("chat").to_string(), "chat upstream is not configured");
    }
}
