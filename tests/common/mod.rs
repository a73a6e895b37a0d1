//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use hwdiag_engine::{App, DiagnosisClient, EndpointConfig, UiOptions};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DIAGNOSE_PATH: &str = "/api/v1/diagnose";

/// Start a mock server that simulates the diagnosis engine
pub async fn start_engine_mock() -> MockServer {
    MockServer::start().await
}

pub fn endpoint_for(server: &MockServer) -> EndpointConfig {
    EndpointConfig::new(format!("{}{DIAGNOSE_PATH}", server.uri()))
        .with_timeout(Duration::from_secs(5))
}

/// App wired to the mock server through the real HTTP client.
pub fn app_for(server: &MockServer) -> App {
    let client = DiagnosisClient::new(endpoint_for(server)).expect("client builds");
    App::with_backend(Arc::new(client), Duration::from_secs(10), UiOptions::default())
}

/// Mount a JSON body for every diagnose request
pub async fn mount_diagnosis(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path(DIAGNOSE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a non-2xx response
pub async fn mount_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(DIAGNOSE_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// A successful single-candidate payload.
pub fn diagnosis_body(name: &str, confidence: f64, severity: &str) -> Value {
    json!({
        "status": "success",
        "results": [{
            "diagnosis_name": name,
            "confidence": confidence,
            "explanation": format!("Symptoms are consistent with {name}"),
            "repair_steps": ["Power down and unplug", "Reseat the suspect component"],
            "severity": severity,
            "diagnosis_id": name.to_ascii_lowercase().replace(' ', "_")
        }],
        "symptoms_detected": ["beep_code", "no_display"]
    })
}

pub fn type_description(app: &mut App, text: &str) {
    match app.draft_mut() {
        hwdiag_engine::DraftMut::Active(draft) => {
            draft.clear();
            draft.enter_text(text);
        }
        hwdiag_engine::DraftMut::Locked => panic!("draft is locked while processing"),
    }
}
