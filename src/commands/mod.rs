pub mod chat;
pub mod respond;
pub mod session;

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::provider;
use crate::session::{SessionError, TurnError, TurnOrchestrator};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Turn failed: {0}")]
    Turn(#[from] TurnError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Orchestrator over the adapter the configuration selects
pub fn build_orchestrator(config: &AppConfig) -> Result<TurnOrchestrator, CommandError> {
    let adapter = provider::from_config(config)?;
    log::debug!("Using {} completion adapter", adapter.name());
    Ok(TurnOrchestrator::new(adapter, config.timeout))
}
