use crate::scrapers::{ensure_success, trim_base, ScraperError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiSummary {
    pub title: String,
    pub lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub extract: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub disambiguation: bool,
}

#[derive(Debug, Deserialize)]
struct UpstreamSummary {
    title: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    extract: String,
    #[serde(default)]
    thumbnail: Option<UpstreamImage>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct UpstreamImage {
    source: String,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<PageUrls>,
}

#[derive(Debug, Deserialize)]
struct PageUrls {
    page: Option<String>,
}

/// Wikipedia REST API client
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    /// May contain a `{lang}` placeholder
    base_url: String,
}

impl WikipediaClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: trim_base(&base_url),
        }
    }

    /// Fetch the summary of the article best matching `query`
    pub async fn summary(&self, query: &str, lang: &str) -> Result<WikiSummary, ScraperError> {
        let lang = normalize_lang(lang)?;
        let title = normalize_title(query)?;

        let url = format!(
            "{}/page/summary/{}",
            self.base_url.replace("{lang}", &lang),
            urlencoding::encode(&title)
        );
        tracing::debug!("Fetching Wikipedia summary: {}", url);

        let response = self
            .http
            .get(&url)
            .query(&[("redirect", "true")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound(format!("no Wikipedia article for '{}'", query.trim())));
        }

        let summary: UpstreamSummary = ensure_success(response).await?.json().await?;

        Ok(WikiSummary {
            title: summary.title,
            lang,
            description: summary.description,
            extract: summary.extract,
            url: summary.content_urls.and_then(|c| c.desktop).and_then(|d| d.page),
            thumbnail: summary.thumbnail.map(|t| t.source),
            disambiguation: summary.kind.as_deref() == Some("disambiguation"),
        })
    }
}

/// Language codes end up in the upstream host name, so only `[a-z0-9-]` is accepted
fn normalize_lang(lang: &str) -> Result<String, ScraperError> {
    let lang = lang.trim().to_ascii_lowercase();
    let valid = !lang.is_empty()
        && lang.len() <= 12
        && lang.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(lang)
    } else {
        Err(ScraperError::InvalidInput(format!("invalid language code '{}'", lang)))
    }
}

/// Wikipedia titles use underscores and a capitalized first letter
pub(crate) fn normalize_title(query: &str) -> Result<String, ScraperError> {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return Err(ScraperError::InvalidInput("query must not be empty".into()));
    }

    let joined = words.join("_");
    let mut chars = joined.chars();
    Ok(match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => joined,
    })
}
