//! Postgres implementations of the pipeline's storage traits.

mod comments;
mod tenants;

pub use comments::SeaCommentStore;
pub use tenants::SeaTenantSource;

use common::storage::StorageError;
use sea_orm::DbErr;

pub(crate) fn backend(err: DbErr) -> StorageError {
    StorageError::Backend(err.to_string())
}
