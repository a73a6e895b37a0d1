//! End-to-end session tests against a mock diagnosis endpoint

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use hwdiag_engine::{FailureKind, Phase, Severity, SubmitOutcome};

use crate::common::{
    DIAGNOSE_PATH, app_for, diagnosis_body, mount_diagnosis, mount_status, start_engine_mock,
    type_description,
};

#[tokio::test]
async fn successful_diagnosis_reaches_succeeded() {
    let server = start_engine_mock().await;
    Mock::given(method("POST"))
        .and(path(DIAGNOSE_PATH))
        .and(body_json(json!({ "text_description": "Computer beeps 3 times, no display" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(diagnosis_body("RAM Failure", 0.87, "high")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_description(&mut app, "Computer beeps 3 times, no display");
    assert!(matches!(app.submit_input(), SubmitOutcome::Started(_)));
    assert_eq!(app.settle().await, Phase::Succeeded);

    let result = app.result().expect("result stored");
    assert_eq!(result.diagnosis_name(), "RAM Failure");
    assert_eq!(result.diagnosis_id(), Some("ram_failure"));
    assert_eq!(result.severity(), Severity::High);
    assert_eq!(result.confidence().value(), 0.87);
    assert_eq!(result.symptoms().len(), 2);
    assert_eq!(result.reasoning().len(), 1);
    assert_eq!(result.repair_steps().len(), 2);
    assert!(app.error().is_none());
}

#[tokio::test]
async fn empty_results_show_no_specific_diagnosis() {
    let server = start_engine_mock().await;
    mount_diagnosis(&server, json!({ "status": "success", "results": [] })).await;

    let mut app = app_for(&server);
    type_description(&mut app, "something is off");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);

    let result = app.result().unwrap();
    assert!(result.is_no_diagnosis());
    assert_eq!(result.diagnosis_name(), "No Specific Diagnosis Found");
    assert_eq!(result.estimated_cost(), "N/A");
    assert_eq!(
        result.repair_steps()[0].as_str(),
        "Please provide more details about the issue."
    );
}

#[tokio::test]
async fn non_success_status_field_is_treated_as_no_diagnosis() {
    let server = start_engine_mock().await;
    let mut body = diagnosis_body("PSU Failure", 0.9, "critical");
    body["status"] = json!("error");
    mount_diagnosis(&server, body).await;

    let mut app = app_for(&server);
    type_description(&mut app, "no power at all");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);
    assert!(app.result().unwrap().is_no_diagnosis());
}

#[tokio::test]
async fn server_error_fails_then_recovers_on_resubmit() {
    let server = start_engine_mock().await;
    mount_status(&server, 500, "inference engine crashed").await;

    let mut app = app_for(&server);
    type_description(&mut app, "blue screen on boot");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);

    let error = app.error().unwrap();
    assert_eq!(error.kind(), FailureKind::HttpStatus(500));
    assert_eq!(error.headline(), "Diagnosis failed");
    assert!(app.result().is_none());

    assert!(app.dismiss_error());
    assert_eq!(app.phase(), Phase::Idle);

    server.reset().await;
    mount_diagnosis(&server, diagnosis_body("Corrupted Boot Sector", 0.6, "medium")).await;
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);
    assert_eq!(
        app.result().unwrap().diagnosis_name(),
        "Corrupted Boot Sector"
    );
}

#[tokio::test]
async fn failed_session_accepts_resubmission_without_dismiss() {
    let server = start_engine_mock().await;
    mount_status(&server, 503, "warming up").await;

    let mut app = app_for(&server);
    type_description(&mut app, "fans at full speed");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);

    assert!(matches!(app.submit_input(), SubmitOutcome::Started(_)));
    assert_eq!(app.phase(), Phase::Processing);
    assert!(app.error().is_none());
    app.settle().await;
}

#[tokio::test]
async fn unknown_severity_is_reported_as_mapping_failure() {
    let server = start_engine_mock().await;
    mount_diagnosis(&server, diagnosis_body("GPU Failure", 0.7, "catastrophic")).await;

    let mut app = app_for(&server);
    type_description(&mut app, "artifacts everywhere");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);
    assert_eq!(app.error().unwrap().kind(), FailureKind::Mapping);
}

#[tokio::test]
async fn malformed_body_is_reported_as_decode_failure() {
    let server = start_engine_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_description(&mut app, "clicking hard drive");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);
    assert_eq!(app.error().unwrap().kind(), FailureKind::Decode);
}

#[tokio::test]
async fn blank_description_never_reaches_the_network() {
    let server = start_engine_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut app = app_for(&server);
    type_description(&mut app, " \n \t ");
    assert_eq!(app.submit_input(), SubmitOutcome::IgnoredBlank);
    assert_eq!(app.phase(), Phase::Idle);
}

#[tokio::test]
async fn confidence_outside_unit_range_is_clamped() {
    let server = start_engine_mock().await;
    mount_diagnosis(&server, diagnosis_body("Overheating", 1.7, "low")).await;

    let mut app = app_for(&server);
    type_description(&mut app, "hot to the touch");
    app.submit_input();
    app.settle().await;

    let result = app.result().unwrap();
    assert_eq!(result.confidence().value(), 1.0);
    assert_eq!(result.reasoning()[0].certainty().value(), 1.0);
}
