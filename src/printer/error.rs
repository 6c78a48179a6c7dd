//! Error types for the Duet printer adapter.
//!
//! Any [`PrinterError`] makes the tick treat the printer as unavailable for
//! that round.

use thiserror::Error;

/// Errors raised while querying the printer's `rr_*` endpoints.
#[derive(Debug, Error)]
pub enum PrinterError {
    /// `rr_connect` answered, but refused the session
    /// (HTTP status or a non-zero `err` code in the body).
    #[error("printer refused connection (code {code})")]
    ConnectRejected { code: u16 },

    /// An object model query returned a non-200 status.
    #[error("object model query `{key}` failed with status {status}")]
    BadStatus { key: &'static str, status: u16 },

    /// The reply did not have the expected shape.
    #[error("unexpected printer response: {0}")]
    Parse(String),

    /// Underlying network failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_rejected_display() {
        let err = PrinterError::ConnectRejected { code: 2 };
        assert_eq!(err.to_string(), "printer refused connection (code 2)");
    }

    #[test]
    fn bad_status_display() {
        let err = PrinterError::BadStatus {
            key: "state.status",
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "object model query `state.status` failed with status 503"
        );
    }
}
