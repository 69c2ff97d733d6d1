//! Search command implementation.

use crate::amazon::{fetch_listings, AmazonClient, AmazonSearch, SearchOutcome};
use crate::config::Config;
use crate::filters::{Filter, PriceFilter};
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Executes a raw marketplace search, without query interpretation or ranking.
pub struct SearchCommand {
    config: Config,
}

impl SearchCommand {
    /// Creates a new search command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the search and returns formatted output.
    pub async fn execute(
        &self,
        query: &str,
        min_price: Option<u64>,
        max_price: Option<u64>,
    ) -> Result<String> {
        let client = AmazonClient::new(&self.config).context("Failed to create HTTP client")?;

        self.execute_with_client(&client, query, min_price, max_price).await
    }

    /// Executes the search with a provided client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &dyn AmazonSearch,
        query: &str,
        min_price: Option<u64>,
        max_price: Option<u64>,
    ) -> Result<String> {
        info!("Searching for: {}", query);

        let outcome = fetch_listings(
            client,
            query,
            min_price,
            max_price,
            self.config.fetch_limit,
            &self.config.currency,
        )
        .await;

        let records = match outcome {
            SearchOutcome::Listings(records) => records,
            SearchOutcome::Blocked => {
                anyhow::bail!("Amazon served a robot check instead of results; try again later")
            }
            SearchOutcome::Failed(reason) => anyhow::bail!("Search failed: {}", reason),
        };

        let filter = PriceFilter::new(min_price, max_price, self.config.price_mode());
        let fetched = records.len();
        let products = filter.apply(records);
        debug!("{}: {} of {} listings kept", filter.description(), products.len(), fetched);

        info!("Found {} products matching criteria", products.len());

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_products(&products))
    }
}
