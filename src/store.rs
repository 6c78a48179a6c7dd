//! Durable holder of the agent's current state.
//!
//! [`JsonFileStore`] keeps the state in a small JSON file so it survives
//! restarts. A missing or unreadable file loads as the default state instead
//! of failing startup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::state_machine::AgentState;

/// Minimal key-value store for the state machine's current state.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<AgentState, AgentError>;
    fn save(&self, state: AgentState) -> Result<(), AgentError>;
}

/// On-disk record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub state: AgentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// State persisted as JSON at a fixed path.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record, `None` if it is missing or corrupt.
    pub fn read_record(&self) -> Result<Option<PersistedState>, AgentError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<PersistedState>(&contents) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "corrupt state file, resetting");
                Ok(None)
            }
        }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<AgentState, AgentError> {
        Ok(self
            .read_record()?
            .map(|record| record.state)
            .unwrap_or_default())
    }

    /// Writes a sibling temp file and renames it over the target so a crash
    /// mid-write never leaves a truncated file.
    fn save(&self, state: AgentState) -> Result<(), AgentError> {
        let record = PersistedState {
            state,
            updated_at: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: std::sync::Mutex<AgentState>,
    saves: std::sync::Mutex<u32>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new(state: AgentState) -> Self {
        Self {
            state: std::sync::Mutex::new(state),
            saves: std::sync::Mutex::new(0),
        }
    }

    /// Number of times `save` has been called.
    pub fn save_count(&self) -> u32 {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
impl StateStore for MemoryStore {
    fn load(&self) -> Result<AgentState, AgentError> {
        Ok(*self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn save(&self, state: AgentState) -> Result<(), AgentError> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}
