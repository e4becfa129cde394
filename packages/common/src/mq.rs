use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// Core trait for payloads carried by the job queue.
pub trait JobMessage: Serialize + DeserializeOwned + Debug + Send + Sync + Clone + 'static {
    /// Named queue this payload is routed to.
    fn queue_name(&self) -> &'static str;

    /// Owning tenant, used to remove or count a tenant's pending jobs.
    fn tenant_id(&self) -> Option<&str> {
        None
    }
}
