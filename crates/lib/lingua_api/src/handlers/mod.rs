//! Request handlers, grouped by resource.

pub mod auth;
pub mod conversations;
pub mod health;
pub mod messages;
