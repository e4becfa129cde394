use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Graph error codes that mean "slow down".
const RATE_LIMIT_CODES: &[i64] = &[4, 17, 32, 613];
/// Invalid or expired access token.
const TOKEN_ERROR_CODE: i64 = 190;
/// Code 100 with subcode 33: the object does not exist (or is already deleted).
const MISSING_OBJECT: (i64, i64) = (100, 33);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Rate limited (status {status}): {message}")]
    RateLimited {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Authorization failed (status {status}): {message}")]
    Unauthorized {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Object not found (status {status}): {message}")]
    NotFound { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    error_subcode: Option<i64>,
}

impl ApiError {
    /// Classify a non-success response from its status and body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<GraphErrorEnvelope>(body).ok();
        let code = parsed.as_ref().and_then(|e| e.error.code);
        let subcode = parsed.as_ref().and_then(|e| e.error.error_subcode);
        let message = match parsed {
            Some(e) if !e.error.message.is_empty() => e.error.message,
            _ => body.chars().take(500).collect(),
        };

        if status == 429 || code.is_some_and(|c| RATE_LIMIT_CODES.contains(&c)) {
            ApiError::RateLimited {
                status,
                code,
                message,
            }
        } else if status >= 500 {
            ApiError::Server { status, message }
        } else if status == 401 || status == 403 || code == Some(TOKEN_ERROR_CODE) {
            ApiError::Unauthorized {
                status,
                code,
                message,
            }
        } else if status == 404 || code.zip(subcode) == Some(MISSING_OBJECT) {
            ApiError::NotFound { status, message }
        } else {
            ApiError::Api {
                status,
                code,
                message,
            }
        }
    }

    /// Retried inside the client with exponential backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Timeout
        )
    }

    /// Worth retrying later at the job level.
    pub fn is_transient(&self) -> bool {
        self.is_retryable() || matches!(self, Self::Network(_))
    }

    /// Invalid or expired credential. Never retried.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}
