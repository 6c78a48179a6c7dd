pub mod client;
pub mod error;
pub mod types;

pub use client::{DuetClient, PrinterStatusSource};
pub use error::PrinterError;
pub use types::{PrinterSnapshot, PrinterStatus};
