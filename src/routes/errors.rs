use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse};
use thiserror::Error;
use crate::models::ApiResponse;
use crate::routes::AppState;
use crate::scrapers::ScraperError;
use crate::services::VisitorError;

/// Failure of a route handler, rendered as an error envelope
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error(transparent)]
    Scraper(#[from] ScraperError),

    #[error(transparent)]
    Visitors(#[from] VisitorError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Scraper(e) => match e {
                ScraperError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ScraperError::NotFound(_) => StatusCode::NOT_FOUND,
                ScraperError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ScraperError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                ScraperError::RequestError(_)
                | ScraperError::UpstreamStatus { .. }
                | ScraperError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Visitors(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(format!("Validation failed: {}", errors))
    }
}

/// Error envelope for payload errors raised before a handler runs
#[derive(Debug)]
pub struct PayloadError {
    pub creator: String,
    pub message: String,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ApiResponse::error(&self.creator, &self.message))
    }
}

fn creator_of(req: &HttpRequest) -> String {
    req.app_data::<web::Data<AppState>>()
        .map(|state| state.creator.clone())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError {
        creator: creator_of(req),
        message: format!("Invalid JSON: {}", err),
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Query error on {}: {}", req.path(), err);
    PayloadError {
        creator: creator_of(req),
        message: format!("Invalid query: {}", err),
    }
    .into()
}

/// Fallback for unknown routes
pub async fn not_found(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    state.fail(ApiError::NotFound(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}

/// Fallback for known paths called with the wrong method
pub async fn method_not_allowed(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    state.fail(ApiError::MethodNotAllowed(format!(
        "Method {} not allowed on {}",
        req.method(),
        req.path()
    )))
}
