use crate::logger::Level;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub storage: StorageSettings,
    pub http: HttpSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub db_path: String,
    pub db_cache_size_mb: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    pub enable: bool,
    pub bind_address: SocketAddr,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookSettings {
    /// When set, webhook requests must carry it in the `x-webhook-secret` header.
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: Level,
}

impl AppConfig {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let builder =
            Config::builder()
                .add_source(File::with_name(path).required(true))
                .add_source(Environment::with_prefix("FSCAN").try_parsing(true).separator("__"));
        builder.build()?.try_deserialize()
    }
}
