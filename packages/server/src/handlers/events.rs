use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::{instrument, warn};
use worker::TenantEvent;

use crate::state::AppState;

/// GET /api/v1/tenants/{tenant_id}/events
///
/// Server-sent stream of the tenant's notifications, named by topic.
#[instrument(skip(state))]
pub async fn stream_events(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let stream = tenant_events(state.events.subscribe(), tenant_id).filter_map(|e| {
        SseEvent::default()
            .event(e.event.topic)
            .json_data(&e.event.payload)
            .ok()
            .map(Ok)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Events for one tenant. A subscriber that falls behind skips what it missed.
pub fn tenant_events(
    rx: broadcast::Receiver<TenantEvent>,
    tenant_id: String,
) -> impl Stream<Item = TenantEvent> {
    BroadcastStream::new(rx).filter_map(move |item| match item {
        Ok(event) if event.tenant_id == tenant_id => Some(event),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(tenant_id = %tenant_id, skipped, "Event subscriber lagged");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use common::event::GenericEvent;
    use serde_json::json;
    use worker::{BroadcastSink, NotificationSink};

    use super::*;

    fn event(topic: &str) -> GenericEvent {
        GenericEvent {
            topic: topic.into(),
            payload: json!({}),
        }
    }

    #[tokio::test]
    async fn only_the_requested_tenant_is_streamed() {
        let sink = BroadcastSink::new(16);
        let stream = tenant_events(sink.subscribe(), "t1".into());

        sink.emit("t2", event("deletion-summary"));
        sink.emit("t1", event("comment-processed"));
        sink.emit("t2", event("comment-processed"));
        sink.emit("t1", event("deletion-summary"));
        drop(sink);

        let events: Vec<TenantEvent> = stream.collect().await;
        let topics: Vec<&str> = events.iter().map(|e| e.event.topic.as_str()).collect();
        assert_eq!(topics, ["comment-processed", "deletion-summary"]);
        assert!(events.iter().all(|e| e.tenant_id == "t1"));
    }

    #[tokio::test]
    async fn lagged_subscriber_keeps_receiving() {
        let sink = BroadcastSink::new(2);
        let stream = tenant_events(sink.subscribe(), "t1".into());

        for topic in ["a", "b", "c", "d"] {
            sink.emit("t1", event(topic));
        }
        drop(sink);

        let topics: Vec<String> = stream.map(|e| e.event.topic).collect().await;
        assert_eq!(topics, ["c", "d"]);
    }
}
