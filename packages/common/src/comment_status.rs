#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a comment record.
///
/// A record is created `Pending` and moves to exactly one terminal status.
/// When the `sea-orm` feature is enabled, this enum maps to a string column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    /// Discovered, decision not yet applied.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// Analyzed and left alone.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "processed"))]
    Processed,
    /// Removed from the platform.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "deleted"))]
    Deleted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "whitelisted"))]
    Whitelisted,
    /// Needs a human look, either by score or because an action failed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "flagged"))]
    Flagged,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "hidden"))]
    Hidden,
}

impl CommentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub const ALL: &'static [CommentStatus] = &[
        Self::Pending,
        Self::Processed,
        Self::Deleted,
        Self::Whitelisted,
        Self::Flagged,
        Self::Hidden,
    ];

    /// Terminal statuses that cleanup may purge once past retention.
    /// `Flagged` is kept for manual review.
    pub const PURGEABLE: &'static [CommentStatus] = &[
        Self::Processed,
        Self::Deleted,
        Self::Whitelisted,
        Self::Hidden,
    ];

    /// Statuses listed by the suspicious-comment query.
    pub const REVIEWABLE: &'static [CommentStatus] = &[Self::Pending, Self::Flagged];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Deleted => "deleted",
            Self::Whitelisted => "whitelisted",
            Self::Flagged => "flagged",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            CommentStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for CommentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError {
                invalid: s.to_string(),
            })
    }
}
