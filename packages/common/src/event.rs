use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::comment::{ActionType, CommentRecord};
use crate::job::MonitorSummary;

/// Core event trait
pub trait Event: Send + Sync + Sized + Serialize + DeserializeOwned {
    /// Event name delivered to sinks (e.g. "comment-processed").
    fn topic(&self) -> &str;

    /// Convert event to a generic event
    fn to_generic_event(&self) -> GenericEvent {
        GenericEvent {
            topic: self.topic().to_string(),
            payload: serde_json::to_value(self).unwrap_or_default(),
        }
    }

    /// Create an event from a generic event
    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        let payload: Self = serde_json::from_value(e.payload.clone())?;
        Ok(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event for GenericEvent {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn from_generic_event(e: &GenericEvent) -> Result<Self, anyhow::Error> {
        Ok(e.clone())
    }
}

/// Notifications the pipeline sends to a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    CommentProcessed {
        comment_id: String,
        platform: crate::platform::Platform,
        action: ActionType,
        success: bool,
        suspicious_score: u8,
        excerpt: String,
        author: Option<String>,
    },
    DeletionSummary {
        deleted: u64,
        processed: u64,
        summary: MonitorSummary,
    },
    /// A platform rejected the tenant's token; monitoring resumes once it is replaced.
    ReauthorizationRequired {
        platform: crate::platform::Platform,
        error: String,
    },
}

impl NotificationEvent {
    pub fn comment_processed(record: &CommentRecord) -> Self {
        Self::CommentProcessed {
            comment_id: record.comment_id.clone(),
            platform: record.platform,
            action: record.action.action_type,
            success: record.action.success,
            suspicious_score: record.analysis.suspicious_score,
            excerpt: record.excerpt(),
            author: record
                .author_username
                .clone()
                .or_else(|| record.author_display_name.clone()),
        }
    }

    pub fn deletion_summary(summary: &MonitorSummary) -> Self {
        Self::DeletionSummary {
            deleted: summary.total_deleted(),
            processed: summary.total_processed(),
            summary: summary.clone(),
        }
    }
}

impl Event for NotificationEvent {
    fn topic(&self) -> &str {
        match self {
            Self::CommentProcessed { .. } => "comment-processed",
            Self::DeletionSummary { .. } => "deletion-summary",
            Self::ReauthorizationRequired { .. } => "reauthorization-required",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_event_carries_topic_and_roundtrips() {
        let summary = MonitorSummary::new("t1");
        let event = NotificationEvent::deletion_summary(&summary);
        let generic = event.to_generic_event();
        assert_eq!(generic.topic, "deletion-summary");
        assert_eq!(NotificationEvent::from_generic_event(&generic).unwrap(), event);
    }
}
