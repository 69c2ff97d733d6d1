//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::filters::PriceMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Marketplace origin searched for listings
    #[serde(default = "default_marketplace_url")]
    pub marketplace_url: String,

    /// Currency symbol stamped on every record
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Referral tag sent with the price filter
    #[serde(default = "default_referral_tag")]
    pub referral_tag: String,

    /// Listings parsed per search
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// Listings returned after ranking
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Whole-request timeout for every outbound call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connect timeout for every outbound call, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Require prices inside both bounds instead of either
    #[serde(default)]
    pub strict_price_filter: bool,

    /// Language model settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Chat server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings for the hosted language model API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model used for classification, extraction and chat
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Upper bound on tool round-trips per chat turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

/// Bind address for the chat server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Conversation threads kept in memory
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
}

fn default_marketplace_url() -> String {
    "https://www.amazon.in".to_string()
}

fn default_currency() -> String {
    "₹".to_string()
}

fn default_referral_tag() -> String {
    "sr_nr_p_36_5".to_string()
}

fn default_fetch_limit() -> usize {
    20
}

fn default_top_k() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tool_rounds() -> usize {
    4
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8003
}

fn default_max_threads() -> usize {
    crate::agent::DEFAULT_MAX_THREADS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marketplace_url: default_marketplace_url(),
            currency: default_currency(),
            referral_tag: default_referral_tag(),
            fetch_limit: default_fetch_limit(),
            top_k: default_top_k(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            format: OutputFormat::Table,
            strict_price_filter: false,
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: 0.0,
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), max_threads: default_max_threads() }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("shop-scout").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("SHOP_SCOUT_MARKETPLACE") {
            self.marketplace_url = url;
        }

        if let Ok(timeout) = std::env::var("SHOP_SCOUT_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.request_timeout_secs = t;
            }
        }

        if let Ok(model) = std::env::var("SHOP_SCOUT_MODEL") {
            self.llm.chat_model = model;
        }

        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            self.llm.api_base = base;
        }

        if let Ok(host) = std::env::var("SHOP_SCOUT_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("SHOP_SCOUT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        self
    }

    /// Timeout applied to whole requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timeout applied to connection setup.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// How price bounds combine when filtering listings.
    pub fn price_mode(&self) -> PriceMode {
        if self.strict_price_filter {
            PriceMode::Strict
        } else {
            PriceMode::Union
        }
    }
}

/// Reads the API key from the environment; it is never stored in config files.
pub fn api_key_from_env() -> Result<String> {
    let key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    if key.trim().is_empty() {
        anyhow::bail!("OPENAI_API_KEY is empty");
    }
    Ok(key)
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
