// Route exports
pub mod errors;
pub mod scrapers;
pub mod system;

pub use errors::{ApiError, handle_json_payload_error, handle_query_payload_error};

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, HttpResponse, Resource};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use crate::config::Settings;
use crate::models::ApiResponse;
use crate::scrapers::{ScraperError, Scrapers};
use crate::services::{CacheManager, EndpointChecker, RequestStats, VisitorStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub name: String,
    pub creator: String,
    pub scrapers: Scrapers,
    pub cache: Arc<CacheManager>,
    pub checker: Arc<EndpointChecker>,
    pub visitors: Arc<VisitorStore>,
    pub stats: Arc<RequestStats>,
}

impl AppState {
    pub fn new(settings: &Settings, visitors: VisitorStore) -> Result<Self, ScraperError> {
        let checker = EndpointChecker::from_settings(settings).map_err(ScraperError::RequestError)?;

        Ok(Self {
            name: settings.app.name.clone(),
            creator: settings.app.creator.clone(),
            scrapers: Scrapers::from_settings(&settings.upstream)?,
            cache: Arc::new(CacheManager::new(settings.cache.max_capacity, settings.cache.ttl_secs)),
            checker: Arc::new(checker),
            visitors: Arc::new(visitors),
            stats: Arc::new(RequestStats::new()),
        })
    }

    /// Scraper payload under `result`, or an error envelope
    pub fn respond<T: Serialize>(&self, result: Result<T, ApiError>) -> HttpResponse {
        match result {
            Ok(value) => HttpResponse::Ok().json(ApiResponse::result(&self.creator, value)),
            Err(e) => self.fail(e),
        }
    }

    /// Internal payload under `data`, or an error envelope
    pub fn respond_data<T: Serialize>(&self, result: Result<T, ApiError>) -> HttpResponse {
        match result {
            Ok(value) => HttpResponse::Ok().json(ApiResponse::data(&self.creator, value)),
            Err(e) => self.fail(e),
        }
    }

    pub fn fail(&self, error: ApiError) -> HttpResponse {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, error);
        } else {
            tracing::debug!("Request rejected with {}: {}", status, error);
        }
        HttpResponse::build(status).json(ApiResponse::error(&self.creator, error.to_string()))
    }

    /// Serve `key` from the response cache, fetching and storing it on a miss
    pub async fn cached<T, Fut>(&self, key: String, fetch: Fut) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T, ScraperError>>,
    {
        if let Ok(hit) = self.cache.get::<T>(&key).await {
            return Ok(hit);
        }

        let value = fetch.await?;
        if let Err(e) = self.cache.set(&key, &value).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
        Ok(value)
    }
}

/// Count every request by matched route pattern
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let stats = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.stats.clone());

    let res = next.call(req).await?;

    if let Some(stats) = stats {
        stats.record(res.request().match_pattern().as_deref(), res.status().as_u16());
    }
    Ok(res)
}

/// Resource whose unmatched methods answer with a 405 envelope
pub(crate) fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(errors::method_not_allowed))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .service(resource("/health").route(web::get().to(system::health)))
        .service(web::scope("/api").configure(system::configure))
        .configure(scrapers::configure)
        .default_service(web::to(errors::not_found));
}
