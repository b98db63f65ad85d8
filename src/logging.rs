use crate::config::LoggingSettings;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stdout
///
/// `RUST_LOG` wins over `logging.level`. `logging.format` is `json`,
/// `pretty`, or anything else for the compact default.
pub fn init(settings: &LoggingSettings) {
    init_with_writer(settings, std::io::stdout);
}

/// Same as [`init`] with a custom writer, e.g. `std::io::stderr` for tools
/// whose stdout is their output
pub fn init_with_writer<W>(settings: &LoggingSettings, writer: W)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_level(true);

    let result = match settings.format.as_str() {
        "pretty" => subscriber.pretty().try_init(),
        "json" => subscriber.json().try_init(),
        _ => subscriber.try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
