//! Upstream payload quirks as seen through the whole stack

use serde_json::json;

use hwdiag_engine::{FailureKind, Phase};

use crate::common::{
    app_for, diagnosis_body, mount_diagnosis, mount_status, start_engine_mock, type_description,
};

#[tokio::test]
async fn terminal_escapes_in_upstream_text_are_stripped() {
    let server = start_engine_mock().await;
    let mut body = diagnosis_body("RAM Failure", 0.5, "high");
    body["results"][0]["diagnosis_name"] = json!("RAM\x1b[31m Failure\x07");
    body["results"][0]["repair_steps"] = json!(["Reseat\x1b]0;pwned\x07 the modules"]);
    mount_diagnosis(&server, body).await;

    let mut app = app_for(&server);
    type_description(&mut app, "three beeps");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);

    let result = app.result().unwrap();
    assert!(!result.diagnosis_name().contains('\x1b'));
    assert!(result.diagnosis_name().starts_with("RAM"));
    assert!(
        result
            .repair_steps()
            .iter()
            .all(|s| !s.as_str().contains('\x1b') && !s.as_str().contains('\x07'))
    );
}

#[tokio::test]
async fn numeric_diagnosis_id_is_kept_as_text() {
    let server = start_engine_mock().await;
    let mut body = diagnosis_body("SSD Wearout", 0.4, "medium");
    body["results"][0]["diagnosis_id"] = json!(17);
    mount_diagnosis(&server, body).await;

    let mut app = app_for(&server);
    type_description(&mut app, "slow writes");
    app.submit_input();
    app.settle().await;
    assert_eq!(app.result().unwrap().diagnosis_id(), Some("17"));
}

#[tokio::test]
async fn missing_severity_fails_the_session() {
    let server = start_engine_mock().await;
    let mut body = diagnosis_body("Loose Cable", 0.3, "low");
    body["results"][0]
        .as_object_mut()
        .unwrap()
        .remove("severity");
    mount_diagnosis(&server, body).await;

    let mut app = app_for(&server);
    type_description(&mut app, "intermittent signal");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);
    assert_eq!(app.error().unwrap().kind(), FailureKind::Mapping);
    assert!(app.result().is_none());
}

#[tokio::test]
async fn null_collections_still_produce_a_result() {
    let server = start_engine_mock().await;
    mount_diagnosis(
        &server,
        json!({
            "status": "success",
            "results": [{ "diagnosis_name": "PSU Failure", "severity": "critical", "repair_steps": null }],
            "symptoms_detected": null
        }),
    )
    .await;

    let mut app = app_for(&server);
    type_description(&mut app, "no power");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);

    let result = app.result().unwrap();
    assert!(result.symptoms().is_empty());
    assert_eq!(result.repair_steps().len(), 1);
    assert_eq!(result.reasoning().len(), 1);
}

#[tokio::test]
async fn long_error_bodies_are_truncated_in_the_detail() {
    let server = start_engine_mock().await;
    mount_status(&server, 502, &"x".repeat(4000)).await;

    let mut app = app_for(&server);
    type_description(&mut app, "anything");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Failed);

    let detail = app.error().unwrap().detail();
    assert!(detail.ends_with("..."));
    assert!(detail.chars().count() <= 243);
}

#[tokio::test]
async fn wrongly_typed_fields_do_not_fail_the_session() {
    let server = start_engine_mock().await;
    mount_diagnosis(
        &server,
        json!({
            "status": "success",
            "results": [{
                "diagnosis_name": "RAM",
                "confidence": "0.9",
                "severity": "high",
                "repair_steps": ["a", null]
            }],
            "symptoms_detected": ["beep", 3]
        }),
    )
    .await;

    let mut app = app_for(&server);
    type_description(&mut app, "three beeps");
    app.submit_input();
    assert_eq!(app.settle().await, Phase::Succeeded);

    let result = app.result().unwrap();
    assert_eq!(result.confidence().value(), 0.9);
    assert_eq!(result.repair_steps().len(), 1);
    assert_eq!(result.symptoms().len(), 1);
}
