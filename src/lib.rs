//! shop-scout - conversational product search over Amazon India
//!
//! A free-text shopping request is interpreted by a language model, searched
//! on the marketplace, and the scraped listings are ranked by embedding
//! similarity. The pipeline is exposed as a tool to a chat agent served over
//! HTTP or in the terminal.

pub mod agent;
pub mod amazon;
pub mod commands;
pub mod config;
pub mod filters;
pub mod format;
pub mod interpreter;
pub mod llm;
pub mod ranker;
pub mod server;

#[cfg(test)]
mod testing;

pub use amazon::models::{ProductRecord, SearchOutcome};
pub use config::Config;
pub use interpreter::{InterpretError, QueryIntent};
