use common::event::GenericEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Fire-and-forget delivery of tenant notifications.
pub trait NotificationSink: Send + Sync {
    fn emit(&self, tenant_id: &str, event: GenericEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantEvent {
    pub tenant_id: String,
    #[serde(flatten)]
    pub event: GenericEvent,
}

/// Fans notifications out to in-process subscribers, such as the server's
/// per-tenant event stream, and logs each one.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<TenantEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TenantEvent> {
        self.tx.subscribe()
    }
}

impl NotificationSink for BroadcastSink {
    fn emit(&self, tenant_id: &str, event: GenericEvent) {
        info!(tenant_id, topic = %event.topic, payload = %event.payload, "Notification");
        let topic = event.topic.clone();
        let delivered = self
            .tx
            .send(TenantEvent {
                tenant_id: tenant_id.to_string(),
                event,
            })
            .unwrap_or(0);
        debug!(tenant_id, topic, delivered, "Notification delivered");
    }
}
