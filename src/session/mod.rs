//! Per-session state and the turn orchestrator that advances it.

pub mod file;
pub mod orchestrator;
pub mod phases;
pub mod state;

pub use file::{DEFAULT_SESSION_FILE, SessionError, SessionFile};
pub use orchestrator::{TurnError, TurnOrchestrator, TurnOutcome};
pub use phases::TurnPhase;
pub use state::{SessionRegistry, SessionState, SharedSession};
