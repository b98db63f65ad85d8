use crate::scrapers::{ensure_success, trim_base, ScraperError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// SFW categories served by waifu.pics
pub const SFW_CATEGORIES: &[&str] = &[
    "waifu", "neko", "shinobu", "megumin", "bully", "cuddle", "cry", "hug", "awoo", "kiss",
    "lick", "pat", "smug", "bonk", "yeet", "blush", "smile", "wave", "highfive", "handhold",
    "nom", "bite", "glomp", "slap", "kill", "kick", "happy", "wink", "poke", "dance", "cringe",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaifuImage {
    pub category: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamImage {
    url: String,
}

/// waifu.pics client
#[derive(Clone)]
pub struct WaifuClient {
    http: Client,
    base_url: String,
}

impl WaifuClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: trim_base(&base_url),
        }
    }

    /// Fetch a random image from a SFW category
    pub async fn random(&self, category: &str) -> Result<WaifuImage, ScraperError> {
        let category = category.trim().to_ascii_lowercase();
        if !SFW_CATEGORIES.contains(&category.as_str()) {
            return Err(ScraperError::InvalidInput(format!(
                "unknown category '{}', expected one of: {}",
                category,
                SFW_CATEGORIES.join(", ")
            )));
        }

        let url = format!("{}/sfw/{}", self.base_url, category);
        tracing::debug!("Fetching random image from: {}", url);

        let response = ensure_success(self.http.get(&url).send().await?).await?;
        let image: UpstreamImage = response.json().await?;

        if image.url.is_empty() {
            return Err(ScraperError::InvalidResponse("empty image url".into()));
        }

        Ok(WaifuImage {
            category,
            url: image.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_random_image() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sfw/neko")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"url":"https://i.waifu.pics/abc.png"}"#)
            .create_async()
            .await;

        let client = WaifuClient::new(Client::new(), format!("{}/", server.url()));
        let image = client.random("Neko").await.unwrap();

        mock.assert_async().await;
        assert_eq!(image.category, "neko");
        assert_eq!(image.url, "https://i.waifu.pics/abc.png");
    }

    #[tokio::test]
    async fn test_unknown_category_skips_upstream() {
        let client = WaifuClient::new(Client::new(), "http://127.0.0.1:9".to_string());
        let err = client.random("nope").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/sfw/waifu")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let client = WaifuClient::new(Client::new(), server.url());
        match client.random("waifu").await {
            Err(ScraperError::UpstreamStatus { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "oops");
            }
            other => panic!("unexpected result: {:?}", other.map(|i| i.url)),
        }
    }
}
