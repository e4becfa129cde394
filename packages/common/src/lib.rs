pub mod comment;
pub mod comment_status;
pub mod config;
pub mod event;
pub mod job;
pub mod mq;
pub mod platform;
pub mod retry;
pub mod social;
pub mod storage;
pub mod tenant;

pub use comment::{CommentKey, CommentRecord};
pub use comment_status::CommentStatus;
pub use platform::Platform;
pub use tenant::Tenant;
