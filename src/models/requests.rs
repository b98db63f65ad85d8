use serde::{Deserialize, Serialize};
use validator::Validate;

/// `GET /ai/oss`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChatQuery {
    #[validate(length(min = 1, max = 4000))]
    pub text: String,
    #[serde(default, alias = "prompt")]
    #[validate(length(max = 2000))]
    pub system: Option<String>,
}

/// `GET /random/anime`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryQuery {
    #[validate(length(min = 1))]
    pub category: String,
}

/// `GET /search/wikipedia`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WikipediaQuery {
    #[validate(length(min = 1, max = 300))]
    #[serde(alias = "query")]
    pub q: String,
    #[serde(default = "default_lang")]
    #[validate(length(min = 2, max = 12))]
    pub lang: String,
}

fn default_lang() -> String {
    "en".to_string()
}

/// Routes taking a single target URL (`/tools/metadata`, `/tools/shortlink`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UrlQuery {
    #[validate(url)]
    pub url: String,
}

/// `GET /api/endpoints/status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub refresh: bool,
}

/// `GET /api/visitors`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VisitorsQuery {
    #[serde(default = "default_recent_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

fn default_recent_limit() -> u32 {
    10
}

/// `POST /api/visitors`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordVisitRequest {
    #[validate(length(min = 1, max = 512))]
    #[serde(default = "default_visit_path")]
    pub path: String,
    #[serde(default)]
    #[validate(length(max = 1024))]
    pub referrer: Option<String>,
}

fn default_visit_path() -> String {
    "/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wikipedia_query_defaults_to_english() {
        let query: WikipediaQuery = serde_json::from_str(r#"{"q": "Rust"}"#).unwrap();
        assert_eq!(query.lang, "en");
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_blank_chat_text_fails_validation() {
        let query = ChatQuery {
            text: String::new(),
            system: None,
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_url_query_rejects_garbage() {
        let query = UrlQuery {
            url: "not a url".to_string(),
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_visitors_limit_bounds() {
        assert!(VisitorsQuery { limit: 0 }.validate().is_err());
        assert!(VisitorsQuery { limit: 100 }.validate().is_ok());
        assert!(VisitorsQuery { limit: 101 }.validate().is_err());
    }
}
