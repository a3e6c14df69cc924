use std::path::Path;

use crate::config::AppConfig;
use crate::endpoint::ChatResponse;
use crate::session::{SessionError, SessionFile};

use super::{CommandError, build_orchestrator};

/// Run one turn against the session file at `path`, creating it if needed.
/// The file is saved even when the turn fails, so the user's message is kept.
pub async fn run_turn(
    config: &AppConfig,
    path: &Path,
    message: &str,
) -> Result<ChatResponse, CommandError> {
    let orchestrator = build_orchestrator(config)?;
    let mut session = SessionFile::open_or_create(path)?;

    let result = orchestrator.run_turn(&mut session.state, message).await;
    // a rejected first message leaves nothing worth persisting
    if !session.state.messages.is_empty() {
        session.save()?;
    }

    Ok(result?.into())
}

/// The stored document as pretty JSON
pub fn show(path: &Path) -> Result<String, CommandError> {
    let session = SessionFile::load(path)?;
    Ok(serde_json::to_string_pretty(&session.state.prd)?)
}

/// Delete the session file; false when there was nothing to delete
pub fn reset(path: &Path) -> Result<bool, CommandError> {
    match SessionFile::load(path) {
        Ok(session) => {
            session.cleanup()?;
            log::info!("Removed session {} at {}", session.state.id, path.display());
            Ok(true)
        }
        Err(SessionError::NotFound(_)) => Ok(false),
        Err(SessionError::ParseError(_)) => {
            // unreadable session: still honour the request to start over
            std::fs::remove_file(path)?;
            Ok(true)
        }
        Err(err) => Err(err.into()),
    }
}
