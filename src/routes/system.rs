use actix_web::{web, HttpRequest, Responder};
use validator::Validate;
use crate::core::registry;
use crate::models::{
    EndpointCatalog, EndpointStatusResponse, HealthResponse, RecordVisitRequest, RecordVisitResponse,
    ServiceStatus, StatusQuery, VisitorsQuery,
};
use crate::routes::{resource, ApiError, AppState};
use crate::services::Visit;

/// Configure the internal `/api` routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/status").route(web::get().to(service_status)))
        .service(resource("/endpoints").route(web::get().to(list_endpoints)))
        .service(resource("/endpoints/status").route(web::get().to(endpoint_status)))
        .service(resource("/cache/stats").route(web::get().to(cache_stats)))
        .service(resource("/cache/clear").route(web::post().to(clear_cache)))
        .service(
            resource("/visitors")
                .route(web::get().to(visitor_summary))
                .route(web::post().to(record_visit)),
        );
}

/// Health check endpoint
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.visitors.health_check().await;
    let status = if healthy { "healthy" } else { "degraded" };

    state.respond_data(Ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    }))
}

/// GET /api/status
async fn service_status(state: web::Data<AppState>) -> impl Responder {
    state.respond_data(Ok(ServiceStatus {
        name: state.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "online",
        endpoints: registry::all().len(),
        stats: state.stats.snapshot(),
    }))
}

/// GET /api/endpoints
async fn list_endpoints(state: web::Data<AppState>) -> impl Responder {
    state.respond_data(Ok(EndpointCatalog {
        total: registry::all().len(),
        categories: registry::by_category(),
    }))
}

/// Probe every scraper endpoint
///
/// GET /api/endpoints/status?refresh=true
///
/// Reports are reused until they expire unless `refresh` is set.
async fn endpoint_status(state: web::Data<AppState>, query: web::Query<StatusQuery>) -> impl Responder {
    let (report, cached) = state
        .checker
        .report(registry::probe_targets(), query.refresh)
        .await;

    state.respond_data(Ok(EndpointStatusResponse {
        cached,
        report: (*report).clone(),
    }))
}

/// GET /api/cache/stats
async fn cache_stats(state: web::Data<AppState>) -> impl Responder {
    let stats = state.cache.stats().await;
    state.respond_data(Ok(stats))
}

/// POST /api/cache/clear
async fn clear_cache(state: web::Data<AppState>) -> impl Responder {
    let cleared = state.cache.clear().await;
    tracing::info!("Response cache cleared ({} entries)", cleared);
    state.respond_data(Ok(serde_json::json!({ "cleared": cleared })))
}

/// GET /api/visitors?limit={n}
async fn visitor_summary(state: web::Data<AppState>, query: web::Query<VisitorsQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return state.fail(errors.into());
    }

    let result = state.visitors.summary(query.limit).await;
    state.respond_data(result.map_err(ApiError::from))
}

/// Record a page visit
///
/// POST /api/visitors
///
/// Request body:
/// ```json
/// {
///   "path": "/docs",
///   "referrer": "https://example.com"
/// }
/// ```
async fn record_visit(
    state: web::Data<AppState>,
    body: web::Json<RecordVisitRequest>,
    req: HttpRequest,
) -> impl Responder {
    if let Err(errors) = body.validate() {
        return state.fail(errors.into());
    }

    let ip = req.connection_info().realip_remote_addr().map(str::to_string);
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = body.into_inner();
    let visit = Visit::new(body.path, ip, user_agent, body.referrer);

    let result = state.visitors.record(&visit).await.map(|total| RecordVisitResponse {
        id: visit.id.to_string(),
        total,
    });

    state.respond_data(result.map_err(ApiError::from))
}
