//! Top-products command: interpret, search and rank a free-text query.

use crate::agent::ProductAdvisor;
use crate::config::{api_key_from_env, Config};
use crate::format::Formatter;
use crate::llm::OpenAiClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct TopCommand {
    config: Config,
}

impl TopCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the full pipeline against the live services.
    pub async fn execute(&self, query: &str) -> Result<String> {
        let llm = Arc::new(OpenAiClient::new(&self.config, api_key_from_env()?)?);
        let advisor = super::build_advisor(&self.config, llm)?;

        self.execute_with_advisor(&advisor, query).await
    }

    /// Runs the pipeline with a provided advisor (for testing).
    pub async fn execute_with_advisor(&self, advisor: &ProductAdvisor, query: &str) -> Result<String> {
        info!("Finding top products for: {}", query);

        let products = advisor.top_products(query).await?;

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_products(&products))
    }
}
