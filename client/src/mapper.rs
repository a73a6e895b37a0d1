//! Upstream payload -> canonical [`DiagnosticResult`].
//!
//! Mapping never fails on missing or malformed optional fields; those degrade
//! to safe defaults. Severity is the exception: it drives the alarm level the
//! user sees, so an absent or unrecognized value is a [`MapError`] instead of
//! a silent default.

use hwdiag_types::{
    Confidence, DiagnosticResult, NonEmptyString, ReasoningEntry, Severity, SeverityParseError,
    Symptom, sanitize_display_text,
};
use thiserror::Error;

use crate::wire::{UpstreamCandidate, UpstreamPayload};

/// Rule name of the single synthetic reasoning step.
pub const INFERENCE_RULE: &str = "INFERENCE_ENGINE";

const UNNAMED_DIAGNOSIS: &str = "Unidentified Fault";
const MISSING_EXPLANATION: &str = "No explanation provided.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error(transparent)]
    UnknownSeverity(#[from] SeverityParseError),
    #[error("diagnosis result has no severity")]
    MissingSeverity,
}

/// Translate a raw endpoint payload into a canonical result.
///
/// The first candidate is trusted as the best match; no re-ranking happens here.
pub fn map(payload: &UpstreamPayload) -> Result<DiagnosticResult, MapError> {
    let top = match payload.results.first() {
        Some(top) if payload.is_success() => top,
        _ => return Ok(DiagnosticResult::no_diagnosis()),
    };

    let severity = parse_severity(top)?;
    let confidence =
        Confidence::clamped(top.confidence.filter(|c| c.is_finite()).unwrap_or(0.0));

    let name = clean_text(top.diagnosis_name.as_deref())
        .unwrap_or_else(|| NonEmptyString::from_static(UNNAMED_DIAGNOSIS));
    let explanation = clean_text(top.explanation.as_deref())
        .map(NonEmptyString::into_inner)
        .unwrap_or_else(|| MISSING_EXPLANATION.to_string());

    let symptoms = payload
        .symptoms_detected
        .iter()
        .filter_map(|id| clean_text(Some(id.as_str())))
        .map(Symptom::detected)
        .collect();

    let repair_steps = top
        .repair_steps
        .iter()
        .flatten()
        .filter_map(|step| clean_text(Some(step.as_str())))
        .collect();

    let result = DiagnosticResult::diagnosed(
        name,
        confidence,
        severity,
        ReasoningEntry {
            rule: INFERENCE_RULE.to_string(),
            conclusion: explanation,
            certainty: confidence,
        },
    )
    .with_symptoms(symptoms)
    .with_repair_steps(repair_steps)
    .with_diagnosis_id(top.diagnosis_id_text());

    Ok(result)
}

fn parse_severity(candidate: &UpstreamCandidate) -> Result<Severity, MapError> {
    match candidate.severity.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Ok(Severity::parse(raw)?),
        _ => Err(MapError::MissingSeverity),
    }
}

fn clean_text(raw: Option<&str>) -> Option<NonEmptyString> {
    let sanitized = sanitize_display_text(raw?);
    NonEmptyString::new(sanitized.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::{INFERENCE_RULE, MapError, map};
    use crate::wire::UpstreamPayload;
    use hwdiag_types::{
        Confidence, DiagnosticResult, ESTIMATED_COST_PLACEHOLDER, FALLBACK_REPAIR_STEP, Severity,
    };
    use serde_json::{Value, json};

    fn payload(value: Value) -> UpstreamPayload {
        serde_json::from_value(value).expect("test payload must decode")
    }

    fn single(candidate: Value) -> UpstreamPayload {
        payload(json!({
            "status": "success",
            "results": [candidate],
            "symptoms_detected": ["beep_3x", "no_display"]
        }))
    }

    fn ram_failure() -> Value {
        json!({
            "diagnosis_name": "RAM Failure",
            "confidence": 0.87,
            "explanation": "Three beeps at POST indicate a memory fault",
            "repair_steps": ["Reseat the RAM modules", "Test each stick individually"],
            "severity": "High",
            "diagnosis_id": "ram_failure"
        })
    }

    #[test]
    fn empty_results_yield_sentinel() {
        let result = map(&payload(json!({ "status": "success", "results": [] }))).unwrap();
        assert_eq!(result, DiagnosticResult::no_diagnosis());
        assert_eq!(result.confidence(), Confidence::ZERO);
        assert_eq!(result.severity(), Severity::Low);
        assert_eq!(result.repair_steps().len(), 1);
        assert!(result.reasoning().is_empty());
        assert!(result.symptoms().is_empty());
    }

    #[test]
    fn non_success_status_yields_sentinel_even_with_results() {
        let mut raw = single(ram_failure());
        raw.status = Some("error".to_string());
        assert_eq!(map(&raw).unwrap(), DiagnosticResult::no_diagnosis());

        raw.status = None;
        assert_eq!(map(&raw).unwrap(), DiagnosticResult::no_diagnosis());
    }

    #[test]
    fn maps_top_candidate() {
        let result = map(&single(ram_failure())).unwrap();

        assert_eq!(result.diagnosis_name(), "RAM Failure");
        assert_eq!(result.diagnosis_id(), Some("ram_failure"));
        assert_eq!(result.confidence().value(), 0.87);
        assert_eq!(result.severity(), Severity::High);
        assert_eq!(result.estimated_cost(), ESTIMATED_COST_PLACEHOLDER);

        let steps: Vec<&str> = result.repair_steps().iter().map(|s| s.as_str()).collect();
        assert_eq!(
            steps,
            vec!["Reseat the RAM modules", "Test each stick individually"]
        );

        let ids: Vec<&str> = result.symptoms().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["beep_3x", "no_display"]);
        assert!(result.symptoms().iter().all(|s| s.detected));
        assert_eq!(
            result.symptoms()[0].description,
            "Detected symptom: beep_3x"
        );
    }

    #[test]
    fn single_reasoning_step_mirrors_confidence() {
        let result = map(&single(ram_failure())).unwrap();
        assert_eq!(result.reasoning().len(), 1);
        let step = &result.reasoning()[0];
        assert_eq!(step.step(), 1);
        assert_eq!(step.rule(), INFERENCE_RULE);
        assert_eq!(step.conclusion(), "Three beeps at POST indicate a memory fault");
        assert_eq!(step.certainty(), result.confidence());
    }

    #[test]
    fn first_candidate_wins_without_reranking() {
        let raw = payload(json!({
            "status": "success",
            "results": [
                { "diagnosis_name": "GPU Artifacting", "confidence": 0.4, "severity": "medium" },
                { "diagnosis_name": "PSU Failure", "confidence": 0.95, "severity": "critical" }
            ]
        }));
        let result = map(&raw).unwrap();
        assert_eq!(result.diagnosis_name(), "GPU Artifacting");
        assert_eq!(result.severity(), Severity::Medium);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut high = ram_failure();
        high["confidence"] = json!(1.4);
        assert_eq!(map(&single(high)).unwrap().confidence().value(), 1.0);

        let mut low = ram_failure();
        low["confidence"] = json!(-0.2);
        let result = map(&single(low)).unwrap();
        assert_eq!(result.confidence().value(), 0.0);
        assert_eq!(result.reasoning()[0].certainty().value(), 0.0);
    }

    #[test]
    fn missing_optional_fields_degrade() {
        let result = map(&payload(json!({
            "status": "success",
            "results": [{ "severity": "low" }]
        })))
        .unwrap();

        assert_eq!(result.diagnosis_name(), "Unidentified Fault");
        assert_eq!(result.confidence(), Confidence::ZERO);
        assert_eq!(result.reasoning()[0].conclusion(), "No explanation provided.");
        assert_eq!(result.repair_steps()[0].as_str(), FALLBACK_REPAIR_STEP);
        assert!(result.symptoms().is_empty());
        assert_eq!(result.diagnosis_id(), None);
    }

    #[test]
    fn blank_repair_steps_fall_back() {
        let mut candidate = ram_failure();
        candidate["repair_steps"] = json!(["", "   "]);
        let result = map(&single(candidate)).unwrap();
        assert_eq!(result.repair_steps().len(), 1);
        assert_eq!(result.repair_steps()[0].as_str(), FALLBACK_REPAIR_STEP);
    }

    #[test]
    fn severity_is_case_normalized() {
        let mut candidate = ram_failure();
        candidate["severity"] = json!("CRITICAL");
        assert_eq!(map(&single(candidate)).unwrap().severity(), Severity::Critical);
    }

    #[test]
    fn unknown_severity_is_a_mapping_error() {
        let mut candidate = ram_failure();
        candidate["severity"] = json!("apocalyptic");
        let err = map(&single(candidate)).unwrap_err();
        assert!(matches!(err, MapError::UnknownSeverity(ref e) if e.0 == "apocalyptic"));
    }

    #[test]
    fn missing_severity_is_a_mapping_error() {
        let mut candidate = ram_failure();
        candidate.as_object_mut().unwrap().remove("severity");
        assert_eq!(map(&single(candidate)).unwrap_err(), MapError::MissingSeverity);
    }

    #[test]
    fn strips_terminal_escapes_from_upstream_text() {
        let mut candidate = ram_failure();
        candidate["diagnosis_name"] = json!("RAM\x1b[2J Failure");
        let result = map(&single(candidate)).unwrap();
        assert_eq!(result.diagnosis_name(), "RAM Failure");
    }

    #[test]
    fn wrongly_typed_optional_fields_still_map() {
        let raw = payload(json!({
            "status": "success",
            "results": [{
                "diagnosis_name": "RAM",
                "confidence": "0.9",
                "severity": "high",
                "repair_steps": ["a", null]
            }],
            "symptoms_detected": ["beep", 3]
        }));
        let result = map(&raw).unwrap();

        assert_eq!(result.diagnosis_name(), "RAM");
        assert_eq!(result.confidence().value(), 0.9);
        assert_eq!(result.severity(), Severity::High);
        let steps: Vec<&str> = result.repair_steps().iter().map(|s| s.as_str()).collect();
        assert_eq!(steps, vec!["a"]);
        assert_eq!(result.symptoms().len(), 1);
        assert_eq!(result.symptoms()[0].id, "beep");
    }

    #[test]
    fn blank_symptom_ids_are_skipped() {
        let raw = payload(json!({
            "status": "success",
            "results": [ram_failure()],
            "symptoms_detected": ["", "fan_noise", "  "]
        }));
        let result = map(&raw).unwrap();
        assert_eq!(result.symptoms().len(), 1);
        assert_eq!(result.symptoms()[0].id, "fan_noise");
    }
}
