//! Serve command: run the chat agent over HTTP.

use crate::config::Config;
use crate::server;
use anyhow::Result;
use std::sync::Arc;

pub struct ServeCommand {
    config: Config,
}

impl ServeCommand {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn execute(&self) -> Result<()> {
        let agent = Arc::new(super::build_agent(&self.config)?);
        server::start(&self.config.server.host, self.config.server.port, agent).await
    }
}
