use serde::{Deserialize, Serialize};

/// Where a session is within its current (or most recent) turn.
///
/// `Idle → AwaitingCompletion → Merging → Dedup → Done`, or
/// `AwaitingCompletion → Failed` when the adapter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingCompletion,
    Merging,
    Dedup,
    Done,
    Failed,
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "Idle"),
            TurnPhase::AwaitingCompletion => write!(f, "AwaitingCompletion"),
            TurnPhase::Merging => write!(f, "Merging"),
            TurnPhase::Dedup => write!(f, "Dedup"),
            TurnPhase::Done => write!(f, "Done"),
            TurnPhase::Failed => write!(f, "Failed"),
        }
    }
}
