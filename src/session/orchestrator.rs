use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use super::phases::TurnPhase;
use super::state::SessionState;
use crate::conversation::Message;
use crate::merge::merge;
use crate::prd::{PrdDocument, PrdFragment};
use crate::provider::{AdapterError, CompletionAdapter, ExtractionResult};
use crate::questions;

/// Reply when the provider gave neither text nor new questions
pub const ACKNOWLEDGMENT: &str = "Thanks. I've added that to the PRD.";

/// Reply once goals, metrics and requirements are all captured
pub const COMPLETION_TEXT: &str =
    "The PRD now covers goals, metrics and requirements. Add more detail any time, or start over.";

const QUESTIONS_FALLBACK_PREFACE: &str = "To keep refining the PRD, could you tell me:";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TurnError {
    /// Rejected before any state was touched
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl TurnError {
    /// Whether resubmitting the same turn can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TurnError::Adapter(_))
    }
}

/// What a completed turn hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub assistant_text: String,
    pub questions: Vec<String>,
    pub document: PrdDocument,
    pub complete: bool,
}

/// Runs one user message through adapter, merger and deduplicator
pub struct TurnOrchestrator {
    adapter: Arc<dyn CompletionAdapter>,
    timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(adapter: Arc<dyn CompletionAdapter>, timeout: Duration) -> Self {
        Self { adapter, timeout }
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Take the session lock for the whole turn, so turns on one session
    /// queue instead of interleaving.
    pub async fn handle_turn(
        &self,
        session: &Mutex<SessionState>,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let mut state = session.lock().await;
        self.run_turn(&mut state, user_text).await
    }

    /// Run a turn against state the caller already owns exclusively.
    ///
    /// The adapter call is the only await. Merge, dedup and the assistant
    /// append all happen after it without yielding, so dropping this future
    /// never leaves a half-applied document.
    pub async fn run_turn(
        &self,
        state: &mut SessionState,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if user_text.trim().is_empty() {
            return Err(TurnError::Validation("message is empty".to_string()));
        }

        state.messages.append(Message::user(user_text));
        state.set_phase(TurnPhase::AwaitingCompletion);

        let result = self.extract(state).await;
        let extraction = match result {
            Ok(extraction) => extraction,
            Err(err) => {
                log::warn!(
                    "Turn failed for session {} via {} adapter: {}",
                    state.id,
                    self.adapter.name(),
                    err
                );
                state.set_phase(TurnPhase::Failed);
                return Err(err.into());
            }
        };

        state.set_phase(TurnPhase::Merging);
        let mut document = merge(&extraction.prd_fragment, &state.prd);
        let complete = document.is_complete();

        state.set_phase(TurnPhase::Dedup);
        let (surfaced, asked) = if complete {
            (Vec::new(), state.asked_questions.clone())
        } else {
            questions::filter(&extraction.questions, &state.asked_questions)
        };

        // Every question put to the user stays listed in the document
        if !surfaced.is_empty() {
            let asked_now = PrdFragment {
                open_questions: Some(surfaced.clone()),
                ..PrdFragment::default()
            };
            document = merge(&asked_now, &document);
        }

        let assistant_text = if complete {
            COMPLETION_TEXT.to_string()
        } else {
            compose_reply(&extraction.assistant_text, &surfaced)
        };

        state.messages.append(Message::assistant(&assistant_text));
        state.prd = document;
        state.asked_questions = asked;
        state.turn_count += 1;
        state.set_phase(TurnPhase::Done);

        log::info!(
            "Session {} turn {} done: {} new question(s), complete={}",
            state.id,
            state.turn_count,
            surfaced.len(),
            complete
        );

        Ok(TurnOutcome {
            assistant_text,
            questions: surfaced,
            document: state.prd.clone(),
            complete,
        })
    }

    async fn extract(&self, state: &SessionState) -> Result<ExtractionResult, AdapterError> {
        let call = self.adapter.extract(state.messages.history(), &state.prd);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::ProviderUnavailable(format!(
                "no response within {:.1}s",
                self.timeout.as_secs_f64()
            ))),
        }
    }
}

/// Provider text if it has any; otherwise list the surfaced questions;
/// otherwise a fixed acknowledgment
fn compose_reply(assistant_text: &str, surfaced: &[String]) -> String {
    let text = assistant_text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    if surfaced.is_empty() {
        return ACKNOWLEDGMENT.to_string();
    }
    let bullets: Vec<String> = surfaced.iter().map(|q| format!("- {}", q)).collect();
    format!("{}\n{}", QUESTIONS_FALLBACK_PREFACE, bullets.join("\n"))
}
