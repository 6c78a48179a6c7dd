use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::AgentError;
use crate::state_machine::{ReadySignal, SendResult};

/// The backend job queue as seen by one printer.
///
/// Non-200 replies are normal negative results; only transport failures are errors.
pub trait JobSource: Send + Sync {
    /// Ask whether a job is ready for this printer.
    fn request_readiness(&self) -> impl Future<Output = Result<ReadySignal, AgentError>> + Send;

    /// Tell the backend to push the job the operator just confirmed.
    fn dispatch_confirmed_job(&self)
    -> impl Future<Output = Result<SendResult, AgentError>> + Send;
}

/// HTTP client for `{BACKEND_URL}/jobs/{PRINTER_IP}/...`.
pub struct BackendClient {
    client: Client,
    jobs_url: String,
}

impl BackendClient {
    pub fn new(backend_url: &str, printer_ip: &str, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()?;
        let jobs_url = format!("{}/jobs/{printer_ip}", backend_url.trim_end_matches('/'));
        Ok(Self { client, jobs_url })
    }
}

impl JobSource for BackendClient {
    async fn request_readiness(&self) -> Result<ReadySignal, AgentError> {
        let response = self
            .client
            .post(format!("{}/ready", self.jobs_url))
            .json("")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(ReadySignal::NoJob {
                status: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) => tracing::debug!(%body, "backend offered a job"),
            Err(e) => tracing::debug!(error = %e, "backend offered a job, body unreadable"),
        }
        Ok(ReadySignal::JobOffered)
    }

    async fn dispatch_confirmed_job(&self) -> Result<SendResult, AgentError> {
        let response = self
            .client
            .get(format!("{}/send", self.jobs_url))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::warn!(status = status.as_u16(), %message, "backend rejected dispatch");
            return Ok(SendResult::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(SendResult::Dispatched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRINTER_IP: &str = "10.0.0.7";

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(&server.uri(), PRINTER_IP, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn readiness_200_offers_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs/10.0.0.7/ready"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"job":"benchy.gcode"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let signal = client_for(&server).request_readiness().await.unwrap();
        assert_eq!(signal, ReadySignal::JobOffered);
    }

    #[tokio::test]
    async fn readiness_non_200_is_no_job() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/jobs/10.0.0.7/ready"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let signal = client_for(&server).request_readiness().await.unwrap();
        assert_eq!(signal, ReadySignal::NoJob { status: 404 });
    }

    #[tokio::test]
    async fn dispatch_200_is_dispatched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/10.0.0.7/send"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).dispatch_confirmed_job().await.unwrap();
        assert_eq!(result, SendResult::Dispatched);
    }

    #[tokio::test]
    async fn dispatch_failure_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/10.0.0.7/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("printer offline"))
            .mount(&server)
            .await;

        let result = client_for(&server).dispatch_confirmed_job().await.unwrap();
        assert_eq!(result, SendResult::Rejected { status: 500 });
    }

    #[tokio::test]
    async fn trailing_slash_on_backend_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/10.0.0.7/send"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/", server.uri());
        let client = BackendClient::new(&url, PRINTER_IP, Duration::from_secs(2)).unwrap();
        assert_eq!(
            client.dispatch_confirmed_job().await.unwrap(),
            SendResult::Dispatched
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client =
            BackendClient::new("http://127.0.0.1:9", PRINTER_IP, Duration::from_millis(500))
                .unwrap();
        let err = client.request_readiness().await.unwrap_err();
        assert!(err.is_transient());
    }
}
