use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use apihub::config::{LoggingSettings, Settings};
use apihub::routes::{self, track_requests, AppState};
use apihub::services::VisitorStore;
use apihub::{logging, registry};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    logging::init(&settings.logging);
    info!("Starting {} aggregator...", settings.app.name);

    let visitors = VisitorStore::from_settings(&settings.database)
        .await
        .map_err(|e| {
            error!("Failed to open visitor store: {}", e);
            std::io::Error::other(e.to_string())
        })?;

    info!("Visitor store ready ({})", visitors.backend());

    let app_state = AppState::new(&settings, visitors).map_err(|e| {
        error!("Failed to build upstream clients: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    info!(
        "Endpoint checker probing {} (batch {}, timeout {}s, report ttl {}s)",
        app_state.checker.base_url(),
        settings.status.batch_size,
        settings.status.probe_timeout_secs,
        settings.status.ttl_secs
    );
    info!(
        "Response cache: {} entries, TTL {}s",
        settings.cache.max_capacity, settings.cache.ttl_secs
    );
    if !app_state.scrapers.chat.is_configured() {
        info!("upstream.chat_url is not set, /ai/oss will answer 503");
    }

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!(
        "Starting HTTP server on {}:{} with {} endpoints",
        host,
        port,
        registry::all().len()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::from_fn(track_requests))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
