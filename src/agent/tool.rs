//! The `top_products` tool: interpret, fetch and rank in one call.

use crate::amazon::{fetch_listings, AmazonSearch, ProductRecord, SearchOutcome};
use crate::interpreter::{InterpretError, QueryInterpreter};
use crate::ranker::Ranker;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const TOOL_NAME: &str = "top_products";

const TOOL_DESCRIPTION: &str = "Use this tool extract an evaluate if the query is related to shopping of a product. And check if it complete or further information is required. Then return top 5 products available on amazon according to the query.";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error("ranking failed: {0:#}")]
    Ranking(anyhow::Error),
}

#[derive(Debug, Deserialize)]
struct ToolArguments {
    query: String,
}

/// Composes the interpreter, the marketplace search and the ranker.
#[derive(Clone)]
pub struct ProductAdvisor {
    interpreter: QueryInterpreter,
    search: Arc<dyn AmazonSearch>,
    ranker: Ranker,
    fetch_limit: usize,
    currency: String,
}

impl ProductAdvisor {
    pub fn new(
        interpreter: QueryInterpreter,
        search: Arc<dyn AmazonSearch>,
        ranker: Ranker,
        fetch_limit: usize,
        currency: impl Into<String>,
    ) -> Self {
        Self { interpreter, search, ranker, fetch_limit, currency: currency.into() }
    }

    /// OpenAI function definition advertised to the chat model.
    pub fn schema() -> Value {
        json!({
            "type": "function",
            "function": {
                "name": TOOL_NAME,
                "description": TOOL_DESCRIPTION,
                "parameters": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The user's shopping request, including any price limits"
                        }
                    },
                    "required": ["query"]
                }
            }
        })
    }

    /// Best matches for a free-text shopping query.
    pub async fn top_products(&self, query: &str) -> Result<Vec<ProductRecord>, ToolError> {
        let intent = self.interpreter.interpret(query).await?;

        let outcome = fetch_listings(
            self.search.as_ref(),
            &intent.rephrased_query,
            intent.min_price,
            intent.max_price,
            self.fetch_limit,
            &self.currency,
        )
        .await;

        match &outcome {
            SearchOutcome::Blocked => warn!("Marketplace served a bot challenge for {:?}", query),
            SearchOutcome::Failed(reason) => warn!("Search for {:?} failed: {}", query, reason),
            SearchOutcome::Listings(_) => {}
        }

        let ranked = self
            .ranker
            .rank(query, intent.min_price, intent.max_price, outcome.into_records())
            .await
            .map_err(ToolError::Ranking)?;

        info!("Returning {} products for {:?}", ranked.len(), query);
        Ok(ranked)
    }

    /// Runs the tool for raw JSON arguments and renders the result for the model.
    ///
    /// Failures come back as `error: ...` text so the model can apologise or
    /// ask the user for the missing detail.
    pub async fn call(&self, arguments: &str) -> String {
        let args: ToolArguments = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("error: invalid arguments: {}", e),
        };

        match self.top_products(&args.query).await {
            Ok(records) => serde_json::to_string(&records)
                .unwrap_or_else(|e| format!("error: failed to encode products: {}", e)),
            Err(e) => {
                info!("Tool call failed: {}", e);
                format!("error: {}", e)
            }
        }
    }
}
