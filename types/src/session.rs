//! Session lifecycle vocabulary shared by the engine and the presentation layer.

use std::fmt;

use serde::Serialize;

/// Discrete lifecycle state of a diagnosis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Phase {
    #[default]
    Idle,
    Processing,
    Succeeded,
    Failed,
}

impl Phase {
    #[must_use]
    pub const fn is_processing(self) -> bool {
        matches!(self, Phase::Processing)
    }

    /// Whether a canonical result is available to render.
    #[must_use]
    pub const fn has_result(self) -> bool {
        matches!(self, Phase::Succeeded)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Processing => "processing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic per-controller request token.
///
/// Only the completion carrying the currently outstanding token may commit a
/// transition out of `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestSeq(u64);

impl RequestSeq {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, DNS, timeout.
    Transport,
    /// Endpoint answered with a non-success status.
    HttpStatus(u16),
    /// Response body was not the expected JSON shape.
    Decode,
    /// Payload parsed but could not be mapped to a canonical result.
    Mapping,
}

/// Failure marker stored on a `Failed` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    kind: FailureKind,
    detail: String,
}

impl ErrorInfo {
    pub const HEADLINE: &'static str = "Diagnosis failed";

    #[must_use]
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    #[must_use]
    pub fn headline(&self) -> &'static str {
        Self::HEADLINE
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(Self::HEADLINE)
        } else {
            write!(f, "{}: {}", Self::HEADLINE, self.detail)
        }
    }
}
