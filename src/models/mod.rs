// Model exports
pub mod envelope;
pub mod requests;
pub mod responses;

pub use envelope::ApiResponse;
pub use requests::{ChatQuery, CategoryQuery, WikipediaQuery, UrlQuery, StatusQuery, VisitorsQuery, RecordVisitRequest};
pub use responses::{HealthResponse, ServiceStatus, EndpointCatalog, EndpointStatusResponse, RecordVisitResponse};
