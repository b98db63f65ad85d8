use crate::scrapers::{ensure_success, trim_base, ScraperError};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortLink {
    pub original: String,
    pub short: String,
}

/// is.gd answers 200 for both outcomes and signals failure in the body
#[derive(Debug, Deserialize)]
struct UpstreamShortLink {
    #[serde(default)]
    shorturl: Option<String>,
    #[serde(default)]
    errorcode: Option<u16>,
    #[serde(default)]
    errormessage: Option<String>,
}

/// is.gd URL shortener client
#[derive(Clone)]
pub struct ShortlinkClient {
    http: Client,
    base_url: String,
}

impl ShortlinkClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: trim_base(&base_url),
        }
    }

    pub async fn shorten(&self, url: &str) -> Result<ShortLink, ScraperError> {
        let response = self
            .http
            .get(format!("{}/create.php", self.base_url))
            .query(&[("format", "json"), ("url", url)])
            .send()
            .await?;

        let body: UpstreamShortLink = ensure_success(response).await?.json().await?;

        match (body.shorturl, body.errorcode) {
            (Some(short), None) if !short.is_empty() => Ok(ShortLink {
                original: url.to_string(),
                short,
            }),
            (_, Some(code)) => {
                let message = body.errormessage.unwrap_or_else(|| format!("error code {}", code));
                // 1 and 2 are input problems, anything else is on the upstream side
                if code <= 2 {
                    Err(ScraperError::InvalidInput(message))
                } else {
                    Err(ScraperError::UpstreamStatus { status: 502, message })
                }
            }
            _ => Err(ScraperError::InvalidResponse("missing shorturl".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_shorten() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/create.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("url".into(), "https://example.com/a?b=c".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"shorturl":"https://is.gd/abc123"}"#)
            .create_async()
            .await;

        let client = ShortlinkClient::new(Client::new(), server.url());
        let link = client.shorten("https://example.com/a?b=c").await.unwrap();

        mock.assert_async().await;
        assert_eq!(link.short, "https://is.gd/abc123");
        assert_eq!(link.original, "https://example.com/a?b=c");
    }

    #[tokio::test]
    async fn test_rejected_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/create.php")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errorcode":1,"errormessage":"Please enter a valid URL to shorten"}"#)
            .create_async()
            .await;

        let client = ShortlinkClient::new(Client::new(), server.url());
        let err = client.shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput(ref m) if m.contains("valid URL")));
    }
}
