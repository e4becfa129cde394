mod common;
mod events;
mod health;
mod moderation;
mod monitoring;
mod store;
mod suspicious;
