pub mod cli;
pub mod core;
pub mod messaging;
pub mod providers;
pub mod server;

use crate::core::config::AppConfig;
use crate::messaging::whatsapp::WhatsAppClient;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Run the webhook server
    Serve,
    /// Print one price report and exit
    Price,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    match config_path {
        Some(path) => Ok(AppConfig::load_from_path(path)?.with_env_overrides()),
        None => AppConfig::load(),
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    debug!(
        bind_addr = %config.server.bind_addr,
        settings = ?config.aggregation,
        "Loaded config"
    );

    let aggregator = providers::build_aggregator(&config)?;

    match command {
        AppCommand::Serve => {
            info!("Gold price bot starting...");
            let state = server::AppState {
                aggregator: Arc::new(aggregator),
                sender: Arc::new(WhatsAppClient::new(&config.whatsapp)?),
                verify_token: config.whatsapp.verify_token.clone(),
            };
            server::serve(&config.server.bind_addr, state).await
        }
        AppCommand::Price => cli::price::price(&aggregator).await,
    }
}
