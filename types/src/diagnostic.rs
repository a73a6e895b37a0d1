//! Canonical diagnostic result types.
//!
//! These are the only result shapes the presentation layer ever sees. The
//! upstream wire format lives in `hwdiag-client` and is translated into these
//! types by the result mapper.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::NonEmptyString;

/// Diagnosis name of the "no diagnosis found" sentinel.
pub const NO_DIAGNOSIS_NAME: &str = "No Specific Diagnosis Found";

/// Repair instruction used whenever the upstream engine supplies none.
pub const FALLBACK_REPAIR_STEP: &str = "Please provide more details about the issue.";

/// Cost text used while the upstream engine does not price repairs.
pub const ESTIMATED_COST_PLACEHOLDER: &str = "Variable";

const SENTINEL_COST: &str = "N/A";

// ============================================================================
// Confidence
// ============================================================================

/// A certainty value guaranteed to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    /// Clamp an arbitrary upstream value into range. NaN collapses to zero.
    #[must_use]
    pub fn clamped(raw: f64) -> Self {
        if raw.is_nan() {
            return Self::ZERO;
        }
        Self(raw.clamp(0.0, 1.0))
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Percentage with one decimal of precision, e.g. `87.5`.
    #[must_use]
    pub fn percent(self) -> f64 {
        (self.0 * 1000.0).round() / 10.0
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Alarm level of a diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized severity {0:?}")]
pub struct SeverityParseError(pub String);

impl Severity {
    /// Parse an upstream severity label. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Result<Self, SeverityParseError> {
        let trimmed = raw.trim();
        [
            Severity::Low,
            Severity::Medium,
            Severity::High,
            Severity::Critical,
        ]
        .into_iter()
        .find(|severity| severity.as_str().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| SeverityParseError(trimmed.to_string()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Symptoms & reasoning
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symptom {
    pub id: String,
    pub description: String,
    pub detected: bool,
}

impl Symptom {
    /// A symptom the upstream engine reported as present.
    #[must_use]
    pub fn detected(id: NonEmptyString) -> Self {
        let id = id.into_inner();
        Self {
            description: format!("Detected symptom: {id}"),
            id,
            detected: true,
        }
    }
}

/// Input for one reasoning step; the step number is assigned on insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningEntry {
    pub rule: String,
    pub conclusion: String,
    pub certainty: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningStep {
    step: u32,
    rule: String,
    conclusion: String,
    certainty: Confidence,
}

impl ReasoningStep {
    /// 1-based position in the audit trail.
    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    #[must_use]
    pub fn conclusion(&self) -> &str {
        &self.conclusion
    }

    #[must_use]
    pub const fn certainty(&self) -> Confidence {
        self.certainty
    }
}

// ============================================================================
// DiagnosticResult
// ============================================================================

/// Canonical, upstream-independent diagnostic payload.
///
/// Invariants held by construction:
/// - `repair_steps` is never empty;
/// - `reasoning` is non-empty for every result except the no-diagnosis sentinel;
/// - reasoning step numbers start at 1 and increase by one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticResult {
    diagnosis_name: NonEmptyString,
    diagnosis_id: Option<String>,
    confidence: Confidence,
    symptoms: Vec<Symptom>,
    reasoning: Vec<ReasoningStep>,
    repair_steps: Vec<NonEmptyString>,
    severity: Severity,
    estimated_cost: NonEmptyString,
}

impl DiagnosticResult {
    /// A positive diagnosis. The first reasoning step becomes step 1.
    #[must_use]
    pub fn diagnosed(
        diagnosis_name: NonEmptyString,
        confidence: Confidence,
        severity: Severity,
        first_step: ReasoningEntry,
    ) -> Self {
        let mut result = Self {
            diagnosis_name,
            diagnosis_id: None,
            confidence,
            symptoms: Vec::new(),
            reasoning: Vec::new(),
            repair_steps: vec![NonEmptyString::from_static(FALLBACK_REPAIR_STEP)],
            severity,
            estimated_cost: NonEmptyString::from_static(ESTIMATED_COST_PLACEHOLDER),
        };
        result.push_reasoning(first_step);
        result
    }

    /// The fixed result used when the upstream engine has no candidates.
    #[must_use]
    pub fn no_diagnosis() -> Self {
        Self {
            diagnosis_name: NonEmptyString::from_static(NO_DIAGNOSIS_NAME),
            diagnosis_id: None,
            confidence: Confidence::ZERO,
            symptoms: Vec::new(),
            reasoning: Vec::new(),
            repair_steps: vec![NonEmptyString::from_static(FALLBACK_REPAIR_STEP)],
            severity: Severity::Low,
            estimated_cost: NonEmptyString::from_static(SENTINEL_COST),
        }
    }

    /// Append a reasoning step, numbered after the current last step.
    pub fn push_reasoning(&mut self, entry: ReasoningEntry) {
        let step = u32::try_from(self.reasoning.len())
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1);
        self.reasoning.push(ReasoningStep {
            step,
            rule: entry.rule,
            conclusion: entry.conclusion,
            certainty: entry.certainty,
        });
    }

    #[must_use]
    pub fn with_symptoms(mut self, symptoms: Vec<Symptom>) -> Self {
        self.symptoms = symptoms;
        self
    }

    /// Replace the repair steps. An empty list keeps the fallback instruction.
    #[must_use]
    pub fn with_repair_steps(mut self, steps: Vec<NonEmptyString>) -> Self {
        if !steps.is_empty() {
            self.repair_steps = steps;
        }
        self
    }

    #[must_use]
    pub fn with_diagnosis_id(mut self, id: Option<String>) -> Self {
        self.diagnosis_id = id;
        self
    }

    #[must_use]
    pub fn is_no_diagnosis(&self) -> bool {
        self.reasoning.is_empty() && self.diagnosis_name.as_str() == NO_DIAGNOSIS_NAME
    }

    #[must_use]
    pub fn diagnosis_name(&self) -> &str {
        self.diagnosis_name.as_str()
    }

    #[must_use]
    pub fn diagnosis_id(&self) -> Option<&str> {
        self.diagnosis_id.as_deref()
    }

    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    #[must_use]
    pub fn symptoms(&self) -> &[Symptom] {
        &self.symptoms
    }

    #[must_use]
    pub fn reasoning(&self) -> &[ReasoningStep] {
        &self.reasoning
    }

    #[must_use]
    pub fn repair_steps(&self) -> &[NonEmptyString] {
        &self.repair_steps
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn estimated_cost(&self) -> &str {
        self.estimated_cost.as_str()
    }
}
