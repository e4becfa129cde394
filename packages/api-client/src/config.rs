use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Graph API client configuration (the `meta` config section).
#[derive(Deserialize, Clone)]
pub struct ApiClientConfig {
    /// Default: "https://graph.facebook.com".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Default: "v18.0".
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Required only for token exchange.
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_secret: Option<String>,
    /// Minimum gap between two requests of one client. Default: 1000.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// Retries after the first attempt. Default: 3.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base of the exponential retry delay. Default: 2000.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Default: 30.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://graph.facebook.com".into()
}
fn default_api_version() -> String {
    "v18.0".into()
}
fn default_rate_limit_delay_ms() -> u64 {
    1000
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            app_id: None,
            app_secret: None,
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ApiClientConfig {
    /// Versioned root, e.g. `https://graph.facebook.com/v18.0`.
    pub fn graph_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
