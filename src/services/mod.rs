// Service exports
pub mod cache;
pub mod postgres;
pub mod stats;
pub mod status;
pub mod visitors;

pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use postgres::{PostgresClient, PostgresError};
pub use stats::{RequestStats, StatsSnapshot};
pub use status::EndpointChecker;
pub use visitors::{Visit, VisitorError, VisitorStore, VisitorSummary};
