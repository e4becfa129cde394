use api_client::ApiClientConfig;
use common::config::PipelineConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Path of the optional config file, without extension. Overridable with
/// `COMMENTGUARD_CONFIG`.
const DEFAULT_CONFIG_PATH: &str = "config/config";

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Graph API client.
    #[serde(default)]
    pub meta: ApiClientConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("COMMENTGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .add_source(File::with_name(path).required(false))
            // Override from environment (e.g., COMMENTGUARD__META__APP_SECRET)
            .add_source(Environment::with_prefix("COMMENTGUARD").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
