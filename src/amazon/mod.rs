//! Amazon-specific modules for HTTP client, parsing, and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod selectors;

pub use client::{fetch_listings, AmazonClient, AmazonSearch};
pub use models::{ProductRecord, SearchOutcome, UNKNOWN};
pub use parser::Parser;
