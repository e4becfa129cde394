mod error;
mod traits;

pub mod memory;

pub use error::StorageError;
pub use traits::{CommentStore, InsertOutcome, TenantSource};
