//! Domain models shared across crates.

pub mod auth;
