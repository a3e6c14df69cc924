use crate::config::AppConfig;
use crate::endpoint::{ChatRequest, chat};

use super::{CommandError, build_orchestrator};

/// Answer one chat request given as JSON; returns the response as pretty JSON
pub async fn respond(config: &AppConfig, request_json: &str) -> Result<String, CommandError> {
    let request: ChatRequest = serde_json::from_str(request_json)?;
    let orchestrator = build_orchestrator(config)?;
    let response = chat(&orchestrator, request).await?;
    Ok(serde_json::to_string_pretty(&response)?)
}
