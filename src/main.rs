//! shop-scout - conversational product search over Amazon India

use anyhow::Result;
use clap::{Parser, Subcommand};
use shop_scout::commands::{ChatCommand, SearchCommand, ServeCommand, TopCommand};
use shop_scout::config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "shop-scout",
    version,
    about = "Conversational product search over Amazon India",
    long_about = "Interprets free-text shopping requests with a language model, searches Amazon India and ranks the listings by relevance."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the marketplace directly, without interpretation or ranking
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Maximum number of listings to parse
        #[arg(short, long)]
        max: Option<usize>,

        /// Minimum price in rupees
        #[arg(long)]
        min_price: Option<u64>,

        /// Maximum price in rupees
        #[arg(long)]
        max_price: Option<u64>,

        /// Require prices inside both bounds
        #[arg(long)]
        strict: bool,
    },

    /// Find the five best matches for a free-text shopping request
    #[command(alias = "t")]
    Top {
        /// Shopping request, e.g. "gaming laptop under 80000"
        query: String,
    },

    /// Chat with the shopping assistant in the terminal
    Chat,

    /// Serve the shopping assistant over HTTP
    Serve {
        /// Address to bind
        #[arg(long, env = "SHOP_SCOUT_HOST")]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long, env = "SHOP_SCOUT_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }

    match cli.command {
        Commands::Search { query, max, min_price, max_price, strict } => {
            if let Some(max) = max {
                config.fetch_limit = max;
            }
            if strict {
                config.strict_price_filter = true;
            }

            let cmd = SearchCommand::new(config);
            let output = cmd.execute(&query, min_price, max_price).await?;
            println!("{}", output);
        }

        Commands::Top { query } => {
            let cmd = TopCommand::new(config);
            let output = cmd.execute(&query).await?;
            println!("{}", output);
        }

        Commands::Chat => {
            ChatCommand::new(config).execute().await?;
        }

        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            ServeCommand::new(config).execute().await?;
        }
    }

    Ok(())
}
