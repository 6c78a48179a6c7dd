use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::error::PrinterError;
use super::types::{ConnectResponse, ModelResponse, PrinterSnapshot, PrinterStatus};

const STATUS_KEY: &str = "state.status";
const MESSAGE_BOX_KEY: &str = "state.messageBox";

/// Source of printer snapshots. An error means the printer is unavailable
/// this round.
pub trait PrinterStatusSource: Send + Sync {
    fn fetch_snapshot(&self) -> impl Future<Output = Result<PrinterSnapshot, PrinterError>> + Send;
}

/// Client for a Duet board's local `rr_*` HTTP API.
pub struct DuetClient {
    client: Client,
    base_url: String,
}

impl DuetClient {
    /// Create a client for the printer at `printer_ip` (a host, host:port, or full URL).
    pub fn new(printer_ip: &str, timeout: Duration) -> Result<Self, PrinterError> {
        let base_url = if printer_ip.starts_with("http://") || printer_ip.starts_with("https://") {
            printer_ip.to_string()
        } else {
            format!("http://{printer_ip}")
        };
        Self::with_base_url(base_url, timeout)
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, PrinterError> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Open a session. The board answers `{"err":0,...}` when it accepts.
    async fn connect(&self) -> Result<(), PrinterError> {
        let response = self
            .client
            .get(format!("{}/rr_connect", self.base_url))
            .query(&[("password", "")])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PrinterError::ConnectRejected {
                code: status.as_u16(),
            });
        }

        let body = response.json::<ConnectResponse>().await?;
        if body.err != 0 {
            return Err(PrinterError::ConnectRejected { code: body.err });
        }
        Ok(())
    }

    async fn model_value(&self, key: &'static str) -> Result<ModelResponse, PrinterError> {
        let response = self
            .client
            .get(format!("{}/rr_model", self.base_url))
            .query(&[("key", key)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PrinterError::BadStatus {
                key,
                status: status.as_u16(),
            });
        }

        let body = response.json::<ModelResponse>().await?;
        tracing::debug!(key = %body.key, result = %body.result, "printer object model");
        Ok(body)
    }
}

impl PrinterStatusSource for DuetClient {
    async fn fetch_snapshot(&self) -> Result<PrinterSnapshot, PrinterError> {
        self.connect().await?;

        // Both halves must land before anything is decided.
        let (status, message_box) =
            tokio::join!(self.model_value(STATUS_KEY), self.model_value(MESSAGE_BOX_KEY));
        let status = status?;
        let message_box = message_box?;

        let status = status
            .result
            .as_str()
            .map(PrinterStatus::from_duet)
            .ok_or_else(|| {
                PrinterError::Parse(format!("`{STATUS_KEY}` is not a string: {}", status.result))
            })?;

        Ok(PrinterSnapshot {
            status,
            message_box_present: !message_box.result.is_null(),
        })
    }
}
