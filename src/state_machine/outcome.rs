use std::fmt;

/// What the backend said when asked for the next job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadySignal {
    /// A job was offered; the printer should now be showing its confirmation dialog.
    JobOffered,
    /// No job for this printer right now (any non-200 reply).
    NoJob { status: u16 },
}

/// What the backend said when told to push the confirmed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendResult {
    Dispatched,
    Rejected { status: u16 },
}

impl fmt::Display for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadySignal::JobOffered => write!(f, "job offered"),
            ReadySignal::NoJob { status } => write!(f, "no job (status {status})"),
        }
    }
}

impl fmt::Display for SendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendResult::Dispatched => write!(f, "dispatched"),
            SendResult::Rejected { status } => write!(f, "rejected (status {status})"),
        }
    }
}
