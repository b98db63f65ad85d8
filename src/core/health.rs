use serde::{Deserialize, Serialize};
use crate::core::registry::{Category, HttpMethod};

/// Outcome of probing a single endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Online,
    Offline,
    Timeout,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub path: String,
    pub method: HttpMethod,
    pub category: Category,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of one checker run
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub checked_at: chrono::DateTime<chrono::Utc>,
    pub base_url: String,
    pub batch_size: usize,
    pub total: usize,
    pub online: usize,
    pub offline: usize,
    pub timeout: usize,
    pub error: usize,
    pub endpoints: Vec<ProbeResult>,
}

impl StatusReport {
    pub fn new(base_url: impl Into<String>, batch_size: usize, endpoints: Vec<ProbeResult>) -> Self {
        let count = |status: ProbeStatus| endpoints.iter().filter(|r| r.status == status).count();

        Self {
            checked_at: chrono::Utc::now(),
            base_url: base_url.into(),
            batch_size,
            total: endpoints.len(),
            online: count(ProbeStatus::Online),
            offline: count(ProbeStatus::Offline),
            timeout: count(ProbeStatus::Timeout),
            error: count(ProbeStatus::Error),
            endpoints,
        }
    }

    pub fn all_online(&self) -> bool {
        self.online == self.total
    }
}

/// Classify a completed probe from its HTTP status and body
///
/// A 2xx answer still counts as offline when the body is our JSON envelope
/// carrying `"status": false`.
pub fn classify(http_status: u16, body: &[u8]) -> (ProbeStatus, Option<String>) {
    if !(200..300).contains(&http_status) {
        let reason = envelope_error(body).unwrap_or_else(|| format!("HTTP {}", http_status));
        return (ProbeStatus::Offline, Some(reason));
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(json) if json.get("status").and_then(|s| s.as_bool()) == Some(false) => {
            let reason = envelope_error(body).unwrap_or_else(|| "upstream reported failure".to_string());
            (ProbeStatus::Offline, Some(reason))
        }
        _ => (ProbeStatus::Online, None),
    }
}

fn envelope_error(body: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(body).ok()?;
    json.get("error")?.as_str().map(str::to_string)
}

/// Split probe targets into consecutive batches of at most `batch_size`
pub fn batches<T>(items: &[T], batch_size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(batch_size.max(1))
}
