use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::state::SessionState;

/// Default session file, relative to the working directory
pub const DEFAULT_SESSION_FILE: &str = ".prd-session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read session file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse session file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error(
        "Session file {0} exists but --resume not specified. Use --resume to continue or --force to overwrite."
    )]
    SessionExists(PathBuf),

    #[error("No session file at {0}")]
    NotFound(PathBuf),
}

/// A session persisted as JSON between CLI invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(skip)]
    path: PathBuf,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Last save time
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub state: SessionState,
}

impl SessionFile {
    /// A fresh, unsaved session at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            path: path.into(),
            created_at: now,
            updated_at: now,
            state: SessionState::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        if !path.exists() {
            return Err(SessionError::NotFound(path));
        }
        let content = std::fs::read_to_string(&path)?;
        let mut session: SessionFile = serde_json::from_str(&content)?;
        session.path = path;
        Ok(session)
    }

    /// Load an existing session or create a new one
    pub fn load_or_create(
        path: impl Into<PathBuf>,
        resume: bool,
        force: bool,
    ) -> Result<Self, SessionError> {
        let path = path.into();

        if path.exists() {
            if resume {
                Self::load(path)
            } else if force {
                std::fs::remove_file(&path)?;
                Ok(Self::new(path))
            } else {
                Err(SessionError::SessionExists(path))
            }
        } else {
            Ok(Self::new(path))
        }
    }

    /// Continue the session at `path` if there is one
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        Self::load_or_create(path, true, false)
    }

    /// Write the session to disk, creating parent directories as needed
    pub fn save(&mut self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        self.updated_at = Utc::now();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Delete the session file
    pub fn cleanup(&self) -> Result<(), std::io::Error> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
