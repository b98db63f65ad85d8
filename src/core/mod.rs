// Core logic exports
pub mod health;
pub mod page;
pub mod registry;

pub use health::{classify, batches, ProbeResult, ProbeStatus, StatusReport};
pub use page::{extract_metadata, LinkCounts, PageMetadata};
pub use registry::{Category, EndpointSpec, HttpMethod, ParamSpec, ProbeTarget};
