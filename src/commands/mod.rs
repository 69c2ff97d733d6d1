//! CLI command implementations.

pub mod chat;
pub mod search;
pub mod serve;
pub mod top;

pub use chat::ChatCommand;
pub use search::SearchCommand;
pub use serve::ServeCommand;
pub use top::TopCommand;

use crate::agent::{Agent, ProductAdvisor};
use crate::amazon::AmazonClient;
use crate::config::{api_key_from_env, Config};
use crate::interpreter::QueryInterpreter;
use crate::llm::OpenAiClient;
use crate::ranker::Ranker;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Wires interpreter, marketplace client and ranker around one model client.
pub fn build_advisor(config: &Config, llm: Arc<OpenAiClient>) -> Result<ProductAdvisor> {
    let search = AmazonClient::new(config).context("Failed to create HTTP client")?;

    Ok(ProductAdvisor::new(
        QueryInterpreter::new(llm.clone()),
        Arc::new(search),
        Ranker::new(llm, config.top_k, config.price_mode()),
        config.fetch_limit,
        config.currency.clone(),
    ))
}

/// Builds the chat agent, reading the API key from the environment.
pub fn build_agent(config: &Config) -> Result<Agent> {
    let llm = Arc::new(OpenAiClient::new(config, api_key_from_env()?)?);
    let advisor = build_advisor(config, llm.clone())?;
    Ok(Agent::new(llm, advisor, config.llm.max_tool_rounds).with_max_threads(config.server.max_threads))
}
