use common::CommentRecord;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const DEFAULT_SUSPICIOUS_THRESHOLD: u8 = 70;

#[derive(Debug, Deserialize)]
pub struct SuspiciousQuery {
    /// Minimum score, 0-100. Default: 70.
    pub threshold: Option<u16>,
}

impl SuspiciousQuery {
    pub fn threshold(&self) -> Result<u8, AppError> {
        match self.threshold {
            None => Ok(DEFAULT_SUSPICIOUS_THRESHOLD),
            Some(t) if t <= 100 => Ok(t as u8),
            Some(t) => Err(AppError::Validation(format!(
                "threshold must be between 0 and 100, got {t}"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuspiciousListResponse {
    pub tenant_id: String,
    pub threshold: u8,
    pub count: usize,
    /// Pending or flagged records, highest score first.
    pub comments: Vec<CommentRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_defaults_and_bounds() {
        assert_eq!(SuspiciousQuery { threshold: None }.threshold().unwrap(), 70);
        assert_eq!(SuspiciousQuery { threshold: Some(100) }.threshold().unwrap(), 100);
        assert!(matches!(
            SuspiciousQuery { threshold: Some(101) }.threshold(),
            Err(AppError::Validation(_))
        ));
    }
}
