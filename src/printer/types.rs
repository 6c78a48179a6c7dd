//! Wire types for the Duet `rr_connect` / `rr_model` endpoints and the
//! snapshot the state machine consumes.

use serde::Deserialize;
use serde_json::Value;

/// Coarse printer status as far as job handoff is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterStatus {
    Idle,
    Busy,
    /// Paused, halted, off, updating and anything unrecognised.
    Other,
}

impl PrinterStatus {
    /// Map a `state.status` value from the Duet object model.
    pub fn from_duet(status: &str) -> Self {
        match status {
            "idle" => Self::Idle,
            "busy" | "processing" | "simulating" | "changingTool" | "pausing"
            | "resuming" | "cancelling" => Self::Busy,
            _ => Self::Other,
        }
    }
}

/// One consistent view of the printer, fetched fresh every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterSnapshot {
    pub status: PrinterStatus,
    /// An unacknowledged confirmation dialog is showing on the display.
    pub message_box_present: bool,
}

impl PrinterSnapshot {
    pub fn is_idle(&self) -> bool {
        self.status == PrinterStatus::Idle
    }
}

/// Body of `GET /rr_connect`. `err` is 0 on success.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub err: u16,
}

/// Body of `GET /rr_model?key=...`.
///
/// `result` is `null` (or absent) when the keyed object does not exist, which
/// is how a cleared message box is reported.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_maps_to_idle() {
        assert_eq!(PrinterStatus::from_duet("idle"), PrinterStatus::Idle);
    }

    #[test]
    fn job_activity_maps_to_busy() {
        for s in ["busy", "processing", "simulating", "changingTool"] {
            assert_eq!(PrinterStatus::from_duet(s), PrinterStatus::Busy, "{s}");
        }
    }

    #[test]
    fn unknown_values_map_to_other() {
        for s in ["paused", "halted", "off", "updating", "IDLE", ""] {
            assert_eq!(PrinterStatus::from_duet(s), PrinterStatus::Other, "{s}");
        }
    }

    #[test]
    fn model_response_deserialize_status() {
        let json = r#"{"key":"state.status","flags":"","result":"idle"}"#;
        let resp: ModelResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.key, "state.status");
        assert_eq!(resp.result.as_str(), Some("idle"));
    }

    #[test]
    fn model_response_null_and_missing_result() {
        let resp: ModelResponse =
            serde_json::from_str(r#"{"key":"state.messageBox","flags":"","result":null}"#)
                .unwrap();
        assert!(resp.result.is_null());

        let resp: ModelResponse = serde_json::from_str(r#"{"key":"state.messageBox"}"#).unwrap();
        assert!(resp.result.is_null());
    }

    #[test]
    fn connect_response_defaults_err_to_zero() {
        let resp: ConnectResponse =
            serde_json::from_str(r#"{"sessionTimeout":8000,"boardType":"duetwifi102"}"#)
                .unwrap();
        assert_eq!(resp.err, 0);
    }
}
