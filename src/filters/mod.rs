//! Product filtering applied before ranking.

pub mod price;

use crate::amazon::ProductRecord;

pub use price::{PriceFilter, PriceMode};

/// Trait for filtering products.
pub trait Filter: Send + Sync {
    /// Returns true if the product passes the filter.
    fn matches(&self, product: &ProductRecord) -> bool;

    /// Returns a description of this filter.
    fn description(&self) -> String;

    /// Filters a collection of products, preserving order.
    fn apply(&self, products: Vec<ProductRecord>) -> Vec<ProductRecord> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}
