use std::sync::Arc;

use common::storage::CommentStore;
use worker::{BroadcastSink, Pipeline};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub comments: Arc<dyn CommentStore>,
    pub events: BroadcastSink,
}
