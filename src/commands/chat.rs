//! Interactive terminal chat with the agent.

use crate::agent::{new_thread_id, Agent};
use crate::config::Config;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

const GREETING: &str = "Hi, how may I help you? (type \"exit\" to quit)";

pub struct ChatCommand {
    config: Config,
}

impl ChatCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the REPL on stdin/stdout until EOF or `exit`.
    pub async fn execute(&self) -> Result<()> {
        let agent = super::build_agent(&self.config)?;
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();

        run(&agent, stdin, stdout).await
    }
}

/// Reads one message per line and writes each reply, all in a single thread.
pub async fn run<R, W>(agent: &Agent, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let thread_id = new_thread_id();
    info!("Chat thread {}", thread_id);

    output.write_all(format!("{}\n> ", GREETING).as_bytes()).await?;
    output.flush().await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let message = line.trim();

        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if !message.is_empty() {
            let reply = agent.respond(&thread_id, message).await;
            output.write_all(format!("\n{}\n\n", reply).as_bytes()).await?;
        }

        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.flush().await?;
    Ok(())
}
