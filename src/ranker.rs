//! Relevance ranking of fetched listings against the user's query.

use crate::amazon::ProductRecord;
use crate::filters::{Filter, PriceFilter, PriceMode};
use crate::llm::Embedder;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Compute cosine similarity between two vectors.
///
/// Mismatched lengths, empty vectors and zero norms score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Filters listings by price and orders them by embedding similarity.
#[derive(Clone)]
pub struct Ranker {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    mode: PriceMode,
}

impl Ranker {
    pub fn new(embedder: Arc<dyn Embedder>, top_k: usize, mode: PriceMode) -> Self {
        Self { embedder, top_k, mode }
    }

    /// Returns at most `top_k` records, most relevant to `query` first.
    ///
    /// Equal scores keep their fetch order. Nothing is embedded when the price
    /// filter leaves no records.
    pub async fn rank(
        &self,
        query: &str,
        min_price: Option<u64>,
        max_price: Option<u64>,
        records: Vec<ProductRecord>,
    ) -> Result<Vec<ProductRecord>> {
        let filter = PriceFilter::new(min_price, max_price, self.mode);
        let fetched = records.len();
        let filtered = filter.apply(records);
        debug!("{}: {} of {} listings kept", filter.description(), filtered.len(), fetched);

        if filtered.is_empty() {
            return Ok(Vec::new());
        }

        let summaries: Vec<String> = filtered.iter().map(ProductRecord::summary).collect();
        let query_input = [query.to_string()];

        let (product_vectors, query_vectors) = tokio::try_join!(
            self.embedder.embed(&summaries),
            self.embedder.embed(&query_input)
        )?;

        if product_vectors.len() != filtered.len() {
            anyhow::bail!(
                "Embedding count mismatch: {} listings, {} vectors",
                filtered.len(),
                product_vectors.len()
            );
        }

        let query_vector = query_vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned for the query"))?;

        let mut scored: Vec<(f32, ProductRecord)> = product_vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .zip(filtered)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        info!("Ranked {} listings for {:?}", scored.len(), query);
        Ok(scored.into_iter().map(|(_, record)| record).collect())
    }
}
