use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::core::health::StatusReport;
use crate::core::registry::{Category, EndpointSpec};
use crate::services::stats::StatsSnapshot;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Payload of `GET /api/status`
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub version: String,
    pub status: &'static str,
    pub endpoints: usize,
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

/// Payload of `GET /api/endpoints`
#[derive(Debug, Clone, Serialize)]
pub struct EndpointCatalog {
    pub total: usize,
    pub categories: BTreeMap<Category, Vec<&'static EndpointSpec>>,
}

/// Payload of `GET /api/endpoints/status`
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStatusResponse {
    pub cached: bool,
    #[serde(flatten)]
    pub report: StatusReport,
}

/// Payload of `POST /api/visitors`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordVisitResponse {
    pub id: String,
    pub total: i64,
}
