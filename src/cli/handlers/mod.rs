//! CLI command handlers.

pub mod chat;
pub mod graph;
