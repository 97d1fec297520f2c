//! # lingua_core
//!
//! Core domain logic for LinguaChat: conversation/message persistence,
//! prompt composition, the language-model invoker and its reply contract,
//! and auth primitives shared with the API crate.

pub mod auth;
pub mod conversations;
pub mod db;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod prompt;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
