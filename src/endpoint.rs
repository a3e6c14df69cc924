//! The chat request/response contract consumed by transport layers.
//!
//! Callers send the whole message history (ending with the new user message)
//! and their copy of the document; the response carries the full merged
//! document so they can replace their copy wholesale.

use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};
use crate::prd::PrdDocument;
use crate::session::{SessionState, TurnError, TurnOrchestrator, TurnOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub prd: Option<PrdDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub assistant_text: String,
    #[serde(default)]
    pub questions: Vec<String>,
    pub prd: PrdDocument,
}

impl From<TurnOutcome> for ChatResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            assistant_text: outcome.assistant_text,
            questions: outcome.questions,
            prd: outcome.document,
        }
    }
}

/// Run one stateless turn: rebuild the session from the request, process the
/// trailing user message, and echo back the merged document.
pub async fn chat(
    orchestrator: &TurnOrchestrator,
    request: ChatRequest,
) -> Result<ChatResponse, TurnError> {
    let mut messages = request.messages;
    let Some(last) = messages.pop() else {
        return Err(TurnError::Validation(
            "request carries no messages".to_string(),
        ));
    };
    if last.role != Role::User {
        return Err(TurnError::Validation(format!(
            "last message must come from the user, got {}",
            last.role
        )));
    }

    let mut state = SessionState::from_parts(messages, request.prd.unwrap_or_default());
    let outcome = orchestrator.run_turn(&mut state, &last.content).await?;
    Ok(outcome.into())
}
