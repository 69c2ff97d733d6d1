//! Data models for scraped listings and search outcomes.

use serde::{Deserialize, Serialize};

/// Placeholder for string fields that could not be extracted.
pub const UNKNOWN: &str = "unknown";

/// One listing scraped from a search-results page.
///
/// Numeric fields use `0` for "not extractable" and string fields use
/// [`UNKNOWN`]. The title is never a placeholder: listings without one are
/// dropped by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Normalized product title
    pub title: String,
    /// Amazon Standard Identification Number
    pub asin: String,
    /// Absolute product URL
    pub link: String,
    /// Marketplace currency symbol
    pub currency: String,
    /// Whole-unit price, fraction truncated
    pub price: u64,
    /// Star rating (0.0 - 5.0)
    pub rating: f32,
    /// Number of ratings
    #[serde(rename = "reviews")]
    pub review_count: u32,
    /// Product image URL
    #[serde(rename = "featured_image")]
    pub image_url: String,
    pub is_prime: bool,
    pub is_best_seller: bool,
    pub is_amazon_choice: bool,
}

impl ProductRecord {
    /// Creates a record with the given title and all other fields at their sentinels.
    pub fn new(title: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            asin: UNKNOWN.to_string(),
            link: UNKNOWN.to_string(),
            currency: currency.into(),
            price: 0,
            rating: 0.0,
            review_count: 0,
            image_url: UNKNOWN.to_string(),
            is_prime: false,
            is_best_seller: false,
            is_amazon_choice: false,
        }
    }

    /// Returns the price, or `None` when the page did not show one.
    pub fn known_price(&self) -> Option<u64> {
        (self.price > 0).then_some(self.price)
    }

    /// One-line summary used as embedding input.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | Rating: {} | Reviews: {}",
            self.title, self.price, self.rating, self.review_count
        )
    }
}

/// Result of a single marketplace search.
///
/// Blocked and failed searches both look like "no results" to callers that
/// only want records, but stay distinguishable for logging and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Listings parsed from the page (possibly none).
    Listings(Vec<ProductRecord>),
    /// The marketplace answered with a bot-challenge page.
    Blocked,
    /// The request failed or returned a non-success status.
    Failed(String),
}

impl SearchOutcome {
    /// Collapses the outcome into the record list, empty unless listings were parsed.
    pub fn into_records(self) -> Vec<ProductRecord> {
        match self {
            SearchOutcome::Listings(records) => records,
            SearchOutcome::Blocked | SearchOutcome::Failed(_) => Vec::new(),
        }
    }

    /// Returns true if the marketplace served a bot challenge.
    pub fn is_blocked(&self) -> bool {
        matches!(self, SearchOutcome::Blocked)
    }
}
