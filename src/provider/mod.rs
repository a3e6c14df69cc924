//! Completion adapters: the only code that talks to the text-generation
//! provider.
//!
//! [`CompletionAdapter::extract`] turns the conversation plus the current
//! document into an [`ExtractionResult`]. The live adapter wraps an HTTP
//! [`CompletionClient`] in [`RepairingAdapter`], which owns the single
//! reformatting pass. [`StubAdapter`] answers deterministically without any
//! network, and [`ScriptedAdapter`] replays canned results for tests.

mod live;
mod prompts;
mod protocol;
mod repair;
mod scripted;
mod stub;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, ConfigError, ProviderMode};
use crate::conversation::Message;
use crate::prd::{PrdDocument, PrdFragment};

pub use live::HttpCompletionClient;
pub use prompts::{REPAIR_SYSTEM_PROMPT, SYSTEM_PROMPT, build_repair_prompt, build_user_context};
pub use protocol::{EXTRACTION_SCHEMA, extract_json_object, parse_extraction};
pub use repair::{CompletionClient, RepairingAdapter};
pub use scripted::ScriptedAdapter;
pub use stub::{GOALS_QUESTION, METRICS_QUESTION, StubAdapter, USERS_QUESTION};

/// What the provider derived from the conversation for one turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub assistant_text: String,
    pub questions: Vec<String>,
    pub prd_fragment: PrdFragment,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Network failure, timeout or error status; the caller may resubmit
    #[error("Completion provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The reply could not be read as an extraction, even after the repair pass
    #[error("Completion provider returned malformed output: {reason}")]
    MalformedOutput { reason: String, raw_output: String },
}

#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Derive this turn's extraction from the full history and current document
    async fn extract(
        &self,
        history: &[Message],
        current: &PrdDocument,
    ) -> Result<ExtractionResult, AdapterError>;
}

/// Build the adapter selected by the configuration
pub fn from_config(config: &AppConfig) -> Result<Arc<dyn CompletionAdapter>, ConfigError> {
    match &config.mode {
        ProviderMode::Stub => Ok(Arc::new(StubAdapter::new())),
        ProviderMode::Live(settings) => {
            let client = HttpCompletionClient::new(settings, config.timeout)?;
            Ok(Arc::new(
                RepairingAdapter::new(client).with_debug_raw(config.debug_raw),
            ))
        }
    }
}
