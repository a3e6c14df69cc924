use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{AdapterError, CompletionAdapter, ExtractionResult};
use crate::conversation::Message;
use crate::prd::PrdDocument;

/// Adapter that replays a fixed queue of results, one per call.
///
/// Used to drive the orchestrator through exact extraction sequences without
/// a provider. Records the history length it saw on each call.
#[derive(Debug, Default)]
pub struct ScriptedAdapter {
    script: Mutex<VecDeque<Result<ExtractionResult, AdapterError>>>,
    seen_history_lens: Mutex<Vec<usize>>,
    delay: Option<Duration>,
}

impl ScriptedAdapter {
    pub fn new(script: Vec<Result<ExtractionResult, AdapterError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// History length passed to each call so far, in call order
    pub fn seen_history_lens(&self) -> Vec<usize> {
        self.seen_history_lens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl CompletionAdapter for ScriptedAdapter {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn extract(
        &self,
        history: &[Message],
        _current: &PrdDocument,
    ) -> Result<ExtractionResult, AdapterError> {
        self.seen_history_lens
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(history.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                Err(AdapterError::ProviderUnavailable(
                    "scripted adapter has no results left".to_string(),
                ))
            })
    }
}
