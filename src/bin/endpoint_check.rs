//! One-shot endpoint check against a deployed instance
//!
//! Probes every scraper route of the deployment at BASE_URL (or
//! `status.base_url` from config) with the same batching and timeout as the
//! in-process checker, prints the report as JSON and exits non-zero when any
//! endpoint is not online.
//!
//! Run: cargo run --bin endpoint-check -- https://api.example.com
use apihub::config::{LoggingSettings, Settings};
use apihub::{logging, registry, EndpointChecker};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            logging::init_with_writer(&LoggingSettings::default(), std::io::stderr);
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    logging::init_with_writer(&settings.logging, std::io::stderr);

    if let Some(base_url) = std::env::args().nth(1) {
        settings.status.base_url = Some(base_url);
    }

    let checker = match EndpointChecker::from_settings(&settings) {
        Ok(checker) => checker,
        Err(e) => {
            tracing::error!("Failed to build HTTP client: {}", e);
            return ExitCode::from(2);
        }
    };

    let report = checker.check(&registry::probe_targets()).await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!("Failed to serialize report: {}", e);
            return ExitCode::from(2);
        }
    }

    if report.all_online() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
