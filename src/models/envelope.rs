use serde::{Deserialize, Serialize};

/// JSON envelope shared by every route
///
/// Scraper routes put their payload under `result`, internal `/api` routes
/// under `data`. `error` is present exactly when `status` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: bool,
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn result(creator: impl Into<String>, value: T) -> Self {
        Self {
            status: true,
            creator: creator.into(),
            result: Some(value),
            data: None,
            error: None,
        }
    }

    pub fn data(creator: impl Into<String>, value: T) -> Self {
        Self {
            status: true,
            creator: creator.into(),
            result: None,
            data: Some(value),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(creator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: false,
            creator: creator.into(),
            result: None,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_envelope_omits_absent_fields() {
        let body = serde_json::to_value(ApiResponse::result("me", json!({"url": "x"}))).unwrap();
        assert_eq!(body, json!({"status": true, "creator": "me", "result": {"url": "x"}}));
    }

    #[test]
    fn test_error_envelope() {
        let body = serde_json::to_value(ApiResponse::error("me", "boom")).unwrap();
        assert_eq!(body, json!({"status": false, "creator": "me", "error": "boom"}));
    }
}
