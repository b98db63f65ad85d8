//! Apihub - REST aggregator over third-party scrapers
//!
//! Every public route wraps one upstream (a free API or a scraped page) and
//! answers with the same JSON envelope. The crate also carries the endpoint
//! checker that probes those routes in batches and caches the outcome.

pub mod config;
pub mod core;
pub mod logging;
pub mod models;
pub mod routes;
pub mod scrapers;
pub mod services;

// Re-export commonly used types
pub use crate::config::Settings;
pub use crate::core::{registry, StatusReport, ProbeStatus};
pub use models::ApiResponse;
pub use routes::{configure_routes, track_requests, AppState};
pub use services::{CacheManager, EndpointChecker, VisitorStore};
