use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub status: StatusSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// Value of the `creator` field stamped on every response
    #[serde(default = "default_creator")]
    pub creator: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            creator: default_creator(),
        }
    }
}

fn default_app_name() -> String { "apihub".to_string() }
fn default_creator() -> String { "apihub".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_waifu_url")]
    pub waifu_url: String,
    /// `{lang}` is replaced with the requested language code
    #[serde(default = "default_wikipedia_url")]
    pub wikipedia_url: String,
    #[serde(default = "default_shortlink_url")]
    pub shortlink_url: String,
    /// OpenAI-compatible chat API; `/ai/oss` answers 503 while unset
    pub chat_url: Option<String>,
    pub chat_api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Allow `/tools/metadata` to fetch loopback and private-network hosts
    #[serde(default)]
    pub allow_private_targets: bool,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_upstream_timeout(),
            user_agent: default_user_agent(),
            waifu_url: default_waifu_url(),
            wikipedia_url: default_wikipedia_url(),
            shortlink_url: default_shortlink_url(),
            chat_url: None,
            chat_api_key: None,
            chat_model: default_chat_model(),
            allow_private_targets: false,
        }
    }
}

fn default_upstream_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    format!("apihub/{} (+https://github.com/apihub)", env!("CARGO_PKG_VERSION"))
}
fn default_waifu_url() -> String { "https://api.waifu.pics".to_string() }
fn default_wikipedia_url() -> String { "https://{lang}.wikipedia.org/api/rest_v1".to_string() }
fn default_shortlink_url() -> String { "https://is.gd".to_string() }
fn default_chat_model() -> String { "gpt-oss-120b".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_ttl() -> u64 { 300 }
fn default_cache_capacity() -> u64 { 1000 }

#[derive(Debug, Clone, Deserialize)]
pub struct StatusSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_report_ttl")]
    pub ttl_secs: u64,
    /// Base URL probed by the checker; defaults to the local listener
    pub base_url: Option<String>,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            probe_timeout_secs: default_probe_timeout(),
            ttl_secs: default_report_ttl(),
            base_url: None,
        }
    }
}

fn default_batch_size() -> usize { 5 }
fn default_probe_timeout() -> u64 { 8 }
fn default_report_ttl() -> u64 { 60 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    /// Visitor data stays in memory when unset
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with APIHUB_)
    /// 5. `DATABASE_URL` and `PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let files = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        Self::build(files, |key| std::env::var(key).ok())
    }

    /// Load configuration from a custom path, with the same environment layers
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let files = Config::builder().add_source(File::from(path.as_ref()));
        Self::build(files, |key| std::env::var(key).ok())
    }

    fn build(
        files: ConfigBuilder<DefaultState>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = files
            // e.g., APIHUB__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("APIHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings, var)?.try_deserialize()
    }

    /// Base URL the endpoint checker probes when none is configured
    pub fn status_base_url(&self) -> String {
        match &self.status.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.server.host.as_str() {
                    "0.0.0.0" | "::" => "127.0.0.1",
                    other => other,
                };
                format!("http://{}:{}", host, self.server.port)
            }
        }
    }
}

/// Apply well-known unprefixed variables on top of the layered config
fn apply_env_overrides(settings: Config, var: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    // Hosting platforms hand the connection string over as DATABASE_URL
    if let Some(database_url) = var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Some(port) = var("PORT") {
        builder = builder.set_override("server.port", port)?;
    }

    builder.build()
}
