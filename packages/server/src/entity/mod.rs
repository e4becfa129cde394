pub mod comment_record;
pub mod tenant;
