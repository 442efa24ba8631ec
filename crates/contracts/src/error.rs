//! Layered error definitions
//!
//! Categorized by source: time / postprocess / merge / sample / path / config

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum TelemetryError {
    // ===== Time Errors =====
    /// Relative clock moved beyond a jump threshold without an override
    #[error("time ordering violation: jump of {diff_s:.3}s rejected ({direction})")]
    TimeOrdering { direction: &'static str, diff_s: f64 },

    // ===== Postprocess Errors =====
    /// A pass lacks a required named input
    #[error("pass '{pass}' is missing prerequisite '{input}'")]
    MissingPrerequisite { pass: String, input: String },

    /// Two inputs of a pass disagree on their epoch baseline
    #[error("pass '{pass}': '{first}' and '{second}' have different epoch baselines")]
    UnsyncedBaselines {
        pass: String,
        first: String,
        second: String,
    },

    // ===== Store Errors =====
    /// A unit exists with a different representation than requested
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A sample failed a sanity bound
    #[error("malformed sample for '{path}': {message}")]
    MalformedSample { path: String, message: String },

    /// Path could not be normalized
    #[error("invalid data path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Search pattern did not compile
    #[error("invalid search pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl TelemetryError {
    /// Create time ordering error
    pub fn time_ordering(backward: bool, diff_s: f64) -> Self {
        Self::TimeOrdering {
            direction: if backward { "backward" } else { "forward" },
            diff_s,
        }
    }

    /// Create missing prerequisite error
    pub fn missing_prerequisite(pass: impl Into<String>, input: impl Into<String>) -> Self {
        Self::MissingPrerequisite {
            pass: pass.into(),
            input: input.into(),
        }
    }

    /// Create unsynced baselines error
    pub fn unsynced_baselines(
        pass: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::UnsyncedBaselines {
            pass: pass.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create type mismatch error
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create malformed sample error
    pub fn malformed_sample(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSample {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this is a condition the pipeline treats as "skip" rather than failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::MissingPrerequisite { .. })
    }
}
