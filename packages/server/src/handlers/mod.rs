pub mod events;
pub mod health;
pub mod moderation;
pub mod monitoring;
pub mod tenant;
