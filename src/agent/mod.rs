//! Conversational agent exposing the product pipeline as a tool.
//!
//! Each thread keeps its own append-only history in memory. A turn sends the
//! system prompt, the thread history and the new user message to the chat
//! model, runs any tool calls it asks for and repeats until the model answers
//! in plain text.

pub mod tool;

use crate::llm::{ChatMessage, ChatModel};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub use tool::{ProductAdvisor, ToolError, TOOL_NAME};

const SYSTEM_PROMPT: &str = "You are a shopping assistant for customers in India. \
Use the top_products tool to look up products on Amazon India. \
For every product you recommend, include its link and a short report covering price, rating and reviews. \
If the tool returns an error, apologise or ask the user for the missing detail instead of guessing.";

/// Shown to the user when a turn fails outright.
pub const APOLOGY: &str =
    "Sorry, something went wrong while looking for products. Please try again in a moment.";

/// Wraps the user's words in the instruction sent to the model.
pub fn frame_user_message(query: &str) -> String {
    format!(
        "Provide users with link of the product with detailed report for each of the top 5 products found based on the query:{}",
        query
    )
}

/// Generates a fresh thread id.
pub fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Threads kept in memory before the least recently used one is dropped.
pub const DEFAULT_MAX_THREADS: usize = 1000;

struct Thread {
    messages: Vec<ChatMessage>,
    last_used: u64,
}

/// Per-thread conversation histories, capped at `max_threads` entries.
///
/// Appending to a new thread when the store is full evicts the thread that
/// was touched least recently.
pub struct SessionStore {
    threads: Mutex<HashMap<String, Thread>>,
    max_threads: usize,
    clock: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_THREADS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_threads: usize) -> Self {
        Self {
            threads: Mutex::new(HashMap::new()),
            max_threads: max_threads.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Copy of a thread's history; empty for unknown threads.
    pub async fn history(&self, thread_id: &str) -> Vec<ChatMessage> {
        let mut threads = self.threads.lock().await;
        match threads.get_mut(thread_id) {
            Some(thread) => {
                thread.last_used = self.tick();
                thread.messages.clone()
            }
            None => Vec::new(),
        }
    }

    pub async fn append(&self, thread_id: &str, messages: Vec<ChatMessage>) {
        let mut threads = self.threads.lock().await;

        if !threads.contains_key(thread_id) && threads.len() >= self.max_threads {
            let oldest = threads
                .iter()
                .min_by_key(|(_, thread)| thread.last_used)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                debug!("Session store full, dropping thread {}", id);
                threads.remove(&id);
            }
        }

        let thread = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| Thread { messages: Vec::new(), last_used: 0 });
        thread.messages.extend(messages);
        thread.last_used = self.tick();
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.lock().await.len()
    }
}

/// Tool-calling chat agent.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    advisor: ProductAdvisor,
    sessions: SessionStore,
    max_tool_rounds: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, advisor: ProductAdvisor, max_tool_rounds: usize) -> Self {
        Self { model, advisor, sessions: SessionStore::new(), max_tool_rounds }
    }

    /// Caps how many conversation threads are kept in memory.
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.sessions = SessionStore::with_capacity(max_threads);
        self
    }

    pub fn advisor(&self) -> &ProductAdvisor {
        &self.advisor
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Runs one turn and returns the assistant's reply.
    ///
    /// The thread history only grows when the turn succeeds.
    pub async fn reply(&self, thread_id: &str, message: &str) -> Result<String> {
        let history = self.sessions.history(thread_id).await;
        let mut turn = vec![ChatMessage::user(frame_user_message(message))];
        let tools = [ProductAdvisor::schema()];

        for round in 0..=self.max_tool_rounds {
            // The last round offers no tools, forcing a plain answer.
            let offered: &[serde_json::Value] =
                if round < self.max_tool_rounds { &tools } else { &[] };

            let mut conversation = Vec::with_capacity(history.len() + turn.len() + 1);
            conversation.push(ChatMessage::system(SYSTEM_PROMPT));
            conversation.extend(history.iter().cloned());
            conversation.extend(turn.iter().cloned());

            let response = self.model.chat(&conversation, offered).await?;
            let calls = response.tool_calls.clone();
            turn.push(response);

            if calls.is_empty() {
                let reply = turn.last().map(|m| m.content_text().to_string()).unwrap_or_default();
                self.sessions.append(thread_id, turn).await;
                info!("Thread {} answered after {} tool round(s)", thread_id, round);
                return Ok(reply);
            }

            for call in calls {
                debug!("Tool call {}: {}({})", call.id, call.function.name, call.function.arguments);
                let output = if call.function.name == TOOL_NAME {
                    self.advisor.call(&call.function.arguments).await
                } else {
                    warn!("Model requested unknown tool {:?}", call.function.name);
                    format!("error: unknown tool {}", call.function.name)
                };
                turn.push(ChatMessage::tool(call.id, output));
            }
        }

        anyhow::bail!("No answer after {} tool rounds", self.max_tool_rounds)
    }

    /// Like [`Agent::reply`], but renders failures as an apology.
    pub async fn respond(&self, thread_id: &str, message: &str) -> String {
        match self.reply(thread_id, message).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat turn failed for thread {}: {:#}", thread_id, e);
                APOLOGY.to_string()
            }
        }
    }
}
