//! Price range filter.

use super::Filter;
use crate::amazon::ProductRecord;

/// How the two bounds of a price range combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceMode {
    /// Keep a product that satisfies either bound, or when a bound is absent.
    #[default]
    Union,
    /// Keep a product only inside both bounds. Unknown prices pass.
    Strict,
}

/// Filters products by price range.
pub struct PriceFilter {
    min: Option<u64>,
    max: Option<u64>,
    mode: PriceMode,
}

impl PriceFilter {
    /// Creates a new price filter with optional min/max bounds.
    pub fn new(min: Option<u64>, max: Option<u64>, mode: PriceMode) -> Self {
        Self { min, max, mode }
    }

    fn above_min(&self, price: u64) -> bool {
        self.min.map_or(true, |min| price >= min)
    }

    fn below_max(&self, price: u64) -> bool {
        self.max.map_or(true, |max| price <= max)
    }
}

impl Filter for PriceFilter {
    fn matches(&self, product: &ProductRecord) -> bool {
        match self.mode {
            PriceMode::Union => self.above_min(product.price) || self.below_max(product.price),
            PriceMode::Strict => {
                // Products without price pass the filter (don't exclude them)
                let Some(price) = product.known_price() else {
                    return true;
                };
                self.above_min(price) && self.below_max(price)
            }
        }
    }

    fn description(&self) -> String {
        let joiner = match self.mode {
            PriceMode::Union => "or",
            PriceMode::Strict => "and",
        };

        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("Price: >= ₹{} {} <= ₹{}", min, joiner, max),
            (Some(min), None) => format!("Price: >= ₹{}", min),
            (None, Some(max)) => format!("Price: <= ₹{}", max),
            (None, None) => "Price: any".to_string(),
        }
    }
}
