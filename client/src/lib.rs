//! Diagnosis endpoint client and result mapping.
//!
//! # Architecture
//!
//! - [`DiagnosisClient`] - `POST`s a free-text description to the diagnosis endpoint
//!   and decodes the loosely-shaped JSON response into [`UpstreamPayload`]
//! - [`mapper`] - turns an [`UpstreamPayload`] into a canonical
//!   [`hwdiag_types::DiagnosticResult`]
//! - [`DiagnosisBackend`] - object-safe seam the session controller talks to, so
//!   the transport can be replaced by scripted backends in tests
//!
//! # Error Handling
//!
//! Transport problems, non-2xx statuses and undecodable bodies are all reported as
//! [`ClientError`]. There is no automatic retry: a failed request ends the session
//! and the user resubmits.

pub mod mapper;
pub mod wire;

use std::time::Duration;

use futures_util::future::BoxFuture;
use hwdiag_types::FailureKind;

pub use mapper::MapError;
pub use wire::{DiagnoseRequest, UpstreamCandidate, UpstreamPayload};

/// Diagnosis endpoint used when nothing is configured.
pub const DEFAULT_DIAGNOSE_URL: &str = "http://localhost:8000/api/v1/diagnose";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const TCP_KEEPALIVE_SECS: u64 = 60;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Where and how long to wait for diagnoses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    url: String,
    timeout: Duration,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSE_URL)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("diagnosis endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    #[must_use]
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ClientError::Build(_) | ClientError::Transport(_) => FailureKind::Transport,
            ClientError::Status { status, .. } => FailureKind::HttpStatus(status.as_u16()),
            ClientError::Decode(_) => FailureKind::Decode,
        }
    }
}

/// Anything that can turn a description into an upstream payload.
///
/// Returned futures must be `'static` so the controller can spawn them
/// without borrowing the backend.
pub trait DiagnosisBackend: Send + Sync {
    fn diagnose(&self, text: String) -> BoxFuture<'static, Result<UpstreamPayload, ClientError>>;
}

/// HTTP client for the diagnosis endpoint.
#[derive(Debug, Clone)]
pub struct DiagnosisClient {
    http: reqwest::Client,
    config: EndpointConfig,
}

impl DiagnosisClient {
    pub fn new(config: EndpointConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
            .user_agent(concat!("hwdiag/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Submit one description and decode the response body.
    pub async fn request_diagnosis(&self, text: &str) -> Result<UpstreamPayload, ClientError> {
        let response = self
            .http
            .post(self.config.url())
            .json(&DiagnoseRequest {
                text_description: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            tracing::warn!(%status, "Diagnosis endpoint returned an error status");
            return Err(ClientError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let payload = serde_json::from_slice(&bytes).inspect_err(|e| {
            tracing::warn!(%e, body_bytes = bytes.len(), "Undecodable diagnosis response");
        })?;
        Ok(payload)
    }
}

impl DiagnosisBackend for DiagnosisClient {
    fn diagnose(&self, text: String) -> BoxFuture<'static, Result<UpstreamPayload, ClientError>> {
        let client = self.clone();
        Box::pin(async move { client.request_diagnosis(&text).await })
    }
}

/// Read at most 32 KiB of an error body for diagnostics.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::{ClientError, DiagnosisBackend, DiagnosisClient, EndpointConfig};
    use hwdiag_types::FailureKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DiagnosisClient {
        let config = EndpointConfig::new(format!("{}/api/v1/diagnose", server.uri()))
            .with_timeout(Duration::from_secs(5));
        DiagnosisClient::new(config).expect("client builds")
    }

    #[tokio::test]
    async fn posts_description_and_decodes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/diagnose"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "text_description": "fans spin, no POST" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "results": [{ "diagnosis_name": "CPU Failure", "severity": "critical" }],
                "symptoms_detected": ["no_post"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .request_diagnosis("fans spin, no POST")
            .await
            .unwrap();
        assert!(payload.is_success());
        assert_eq!(payload.symptoms_detected, vec!["no_post"]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("engine warming up"))
            .mount(&server)
            .await;

        let err = client_for(&server).request_diagnosis("x").await.unwrap_err();
        match &err {
            ClientError::Status { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "engine warming up");
            }
            other => panic!("expected Status, got {other:?}"),
        }
        assert_eq!(err.failure_kind(), FailureKind::HttpStatus(503));
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).request_diagnosis("x").await.unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
        assert_eq!(err.failure_kind(), FailureKind::Decode);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let config = EndpointConfig::new("http://127.0.0.1:9/api/v1/diagnose")
            .with_timeout(Duration::from_secs(2));
        let client = DiagnosisClient::new(config).unwrap();

        let err = client.diagnose("x".to_string()).await.unwrap_err();
        assert_eq!(err.failure_kind(), FailureKind::Transport);
    }

    #[test]
    fn default_endpoint_points_at_local_engine() {
        let config = EndpointConfig::default();
        assert_eq!(config.url(), "http://localhost:8000/api/v1/diagnose");
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }
}
