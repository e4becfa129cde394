pub mod client;
pub mod config;
pub mod error;
pub mod platform;
pub mod rate_limit;
pub mod types;

pub use client::MetaClient;
pub use config::ApiClientConfig;
pub use error::{ApiError, Result};
pub use platform::{LongLivedToken, PlatformApi, TokenValidation};
pub use rate_limit::{RateLimiter, RetryPolicy, Throttle};
