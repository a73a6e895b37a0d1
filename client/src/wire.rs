//! Upstream wire types for the diagnosis endpoint.
//!
//! The endpoint contract is not guaranteed stable, so every field is optional
//! and `null` is treated like an absent field. Unknown fields are ignored, and
//! a field of the wrong type reads as absent instead of failing the body.
//! Numeric strings are accepted for `confidence`; non-string entries are
//! dropped from string lists.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Request body for `POST /api/v1/diagnose`.
#[derive(Debug, Serialize)]
pub struct DiagnoseRequest<'a> {
    pub text_description: &'a str,
}

/// Raw response body, before mapping to a canonical result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_candidates")]
    pub results: Vec<UpstreamCandidate>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub symptoms_detected: Vec<String>,
}

impl UpstreamPayload {
    pub const SUCCESS_STATUS: &'static str = "success";

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(Self::SUCCESS_STATUS)
    }
}

/// One ranked diagnosis candidate. Upstream orders candidates best-first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpstreamCandidate {
    #[serde(default, deserialize_with = "lenient_string")]
    pub diagnosis_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub explanation: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string_list")]
    pub repair_steps: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    /// Upstream has used both string and numeric identifiers.
    #[serde(default)]
    pub diagnosis_id: Option<serde_json::Value>,
}

impl UpstreamCandidate {
    #[must_use]
    pub fn diagnosis_id_text(&self) -> Option<String> {
        match self.diagnosis_id.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn string_entries(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_entries(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_entries(Value::deserialize(deserializer)?))
}

/// Entries that are not objects are dropped; candidate order is preserved.
fn lenient_candidates<'de, D>(deserializer: D) -> Result<Vec<UpstreamCandidate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
