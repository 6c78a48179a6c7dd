use thiserror::Error;

use crate::printer::PrinterError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Printer unavailable: {0}")]
    Printer(#[from] PrinterError),

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tick panicked: {0}")]
    Panicked(String),
}

impl AgentError {
    /// Printer or backend unreachable, slow, or answering garbage. These
    /// leave the state untouched and clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AgentError::Printer(_) | AgentError::Timeout { .. } | AgentError::Http(_)
        )
    }
}
