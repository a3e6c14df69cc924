use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::phases::TurnPhase;
use crate::conversation::{ConversationStore, Message};
use crate::prd::PrdDocument;
use crate::questions::AskedQuestions;

/// Everything one conversation carries between turns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,

    #[serde(default)]
    pub turn_count: u32,

    /// Phase most recently entered. A turn dropped mid-call leaves
    /// `AwaitingCompletion` here until the next turn starts.
    #[serde(default)]
    pub last_phase: TurnPhase,

    #[serde(default)]
    pub messages: ConversationStore,

    #[serde(default)]
    pub prd: PrdDocument,

    #[serde(default)]
    pub asked_questions: AskedQuestions,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            turn_count: 0,
            last_phase: TurnPhase::Idle,
            messages: ConversationStore::new(),
            prd: PrdDocument::new(),
            asked_questions: AskedQuestions::new(),
        }
    }

    /// Rebuild a session from the two persisted blobs. The asked-question set
    /// is recovered from the assistant turns in the history.
    pub fn from_parts(messages: Vec<Message>, prd: PrdDocument) -> Self {
        let asked_questions = AskedQuestions::seed_from_history(&messages);
        Self {
            messages: ConversationStore::from_messages(messages),
            prd,
            asked_questions,
            ..Self::new()
        }
    }

    /// "Start over": drop the conversation, document and asked questions
    pub fn reset(&mut self) {
        self.messages.clear();
        self.prd = PrdDocument::new();
        self.asked_questions.clear();
        self.turn_count = 0;
        self.last_phase = TurnPhase::Idle;
    }

    pub fn set_phase(&mut self, phase: TurnPhase) {
        log::debug!("Session {}: {} -> {}", self.id, self.last_phase, phase);
        self.last_phase = phase;
    }

    pub fn is_fresh(&self) -> bool {
        self.turn_count == 0 && self.messages.is_empty()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// A session behind its own lock: turns on the same session queue here
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Independent sessions keyed by id. The map lock is only held for lookups,
/// never across a turn.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session and return its id and handle
    pub async fn create(&self) -> (String, SharedSession) {
        let state = SessionState::new();
        let id = state.id.clone();
        let shared = self.insert(state).await;
        (id, shared)
    }

    /// Register an existing session, replacing any with the same id
    pub async fn insert(&self, state: SessionState) -> SharedSession {
        let id = state.id.clone();
        let shared = Arc::new(Mutex::new(state));
        self.sessions.write().await.insert(id, Arc::clone(&shared));
        shared
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<SharedSession> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
