//! Mock collaborators shared by unit tests.

use crate::amazon::AmazonSearch;
use crate::llm::{ChatMessage, ChatModel, Embedder, FunctionCall, Role, TextModel, ToolCall};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Marketplace stub serving one fixed page.
pub struct MockSearch {
    html: Option<String>,
    calls: AtomicU32,
    last_bounds: Mutex<Option<(Option<u64>, Option<u64>)>>,
}

impl MockSearch {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: Some(html.into()), calls: AtomicU32::new(0), last_bounds: Mutex::new(None) }
    }

    /// A marketplace that fails every request.
    pub fn failing() -> Self {
        Self { html: None, calls: AtomicU32::new(0), last_bounds: Mutex::new(None) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_bounds(&self) -> Option<(Option<u64>, Option<u64>)> {
        *self.last_bounds.lock().unwrap()
    }
}

#[async_trait]
impl AmazonSearch for MockSearch {
    async fn search(&self, _query: &str, min: Option<u64>, max: Option<u64>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bounds.lock().unwrap() = Some((min, max));
        self.html.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
    }

    fn origin(&self) -> &str {
        "https://www.amazon.in"
    }
}

/// Text model answering the classification prompt and the extraction prompt.
pub struct RuleModel {
    pub classification: String,
    pub extraction: String,
}

impl RuleModel {
    pub fn shopping(extraction: impl Into<String>) -> Self {
        Self { classification: "True".to_string(), extraction: extraction.into() }
    }
}

#[async_trait]
impl TextModel for RuleModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.starts_with("Return True") {
            Ok(self.classification.clone())
        } else {
            Ok(self.extraction.clone())
        }
    }
}

/// Embeds every text identically, so ranking keeps fetch order.
pub struct FlatEmbedder;

#[async_trait]
impl Embedder for FlatEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|_| vec![1.0, 1.0]).collect())
    }
}

/// Chat model replaying scripted replies and recording every request.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<ChatMessage>>>,
    requests: Mutex<Vec<(Vec<ChatMessage>, usize)>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<ChatMessage>>) -> Self {
        Self { replies: Mutex::new(replies.into()), requests: Mutex::new(Vec::new()) }
    }

    /// Messages and tool count of each request, oldest first.
    pub fn requests(&self) -> Vec<(Vec<ChatMessage>, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        self.requests.lock().unwrap().push((messages.to_vec(), tools.len()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted reply")))
    }
}

/// Assistant message requesting one tool call.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
    ChatMessage {
        role: Role::Assistant,
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall { name: name.to_string(), arguments: arguments.to_string() },
        }],
        tool_call_id: None,
    }
}

/// Search page with one well-formed result card per `(asin, title, price)`.
pub fn search_html(products: &[(&str, &str, u64)]) -> String {
    let mut html = String::from("<html><body>");
    for (asin, title, price) in products {
        html.push_str(&format!(
            r#"<div data-component-type="s-search-result" data-asin="{asin}">
                <h2><a class="a-link-normal s-no-outline" href="/dp/{asin}"><span class="a-text-normal">{title}</span></a></h2>
                <span class="a-price-whole">{price}</span>
                <span class="a-icon-alt">4.2 out of 5 stars</span>
            </div>"#
        ));
    }
    html.push_str("</body></html>");
    html
}
