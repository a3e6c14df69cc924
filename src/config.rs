use std::time::Duration;

use clap::{ArgAction, Args, builder::BoolishValueParser};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Live provider mode requires {0}; set it or enable STUB_MODE")]
    MissingSetting(&'static str),

    #[error("Timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Connection parameters for the live provider
#[derive(Clone, PartialEq, Eq)]
pub struct LiveSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl std::fmt::Debug for LiveSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSettings")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderMode {
    /// Deterministic offline extraction
    Stub,
    Live(LiveSettings),
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub mode: ProviderMode,
    /// Upper bound on every adapter call
    pub timeout: Duration,
    /// Log raw provider replies at debug level
    pub debug_raw: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: ProviderMode::Stub,
            timeout: Duration::from_secs(30),
            debug_raw: false,
        }
    }
}

/// Provider flags shared by every subcommand; each falls back to an
/// environment variable
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Use the deterministic offline stub instead of a live provider
    #[arg(
        long,
        global = true,
        env = "STUB_MODE",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub stub_mode: bool,

    /// API key for the live provider
    #[arg(long, global = true, env = "LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible provider, e.g. https://api.example.com
    #[arg(long, global = true, env = "LLM_BASE_URL")]
    pub base_url: Option<String>,

    /// Model identifier sent to the live provider
    #[arg(long, global = true, env = "LLM_MODEL")]
    pub model: Option<String>,

    /// Seconds to wait for the provider before giving up
    #[arg(long, global = true, env = "LLM_TIMEOUT_S", default_value_t = 30.0)]
    pub timeout_secs: f64,

    /// Log raw provider output (visible with RUST_LOG=debug)
    #[arg(
        long,
        global = true,
        env = "DEBUG_LLM_RAW",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub debug_raw: bool,
}

impl ProviderArgs {
    pub fn resolve(&self) -> Result<AppConfig, ConfigError> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }

        // finite but too large for a Duration is rejected, not a panic
        let timeout = Duration::try_from_secs_f64(self.timeout_secs)
            .map_err(|_| ConfigError::InvalidTimeout(self.timeout_secs))?;

        let mode = if self.stub_mode {
            ProviderMode::Stub
        } else {
            ProviderMode::Live(LiveSettings {
                api_key: required(&self.api_key, "LLM_API_KEY")?,
                base_url: required(&self.base_url, "LLM_BASE_URL")?,
                model: required(&self.model, "LLM_MODEL")?,
            })
        };

        Ok(AppConfig {
            mode,
            timeout,
            debug_raw: self.debug_raw,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingSetting(name)),
    }
}
