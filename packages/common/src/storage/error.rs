use std::fmt;

/// Errors raised by comment and tenant stores.
#[derive(Debug)]
pub enum StorageError {
    /// The requested row was not found.
    NotFound(String),
    /// The backing database failed.
    Backend(String),
    /// A stored document could not be (de)serialized.
    Serialization(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Backend(msg) => write!(f, "storage backend error: {msg}"),
            Self::Serialization(err) => write!(f, "storage serialization error: {err}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}
