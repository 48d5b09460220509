//! Structured error types shared across PGM crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`PgmError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (node paths, type names, slot names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the model author resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the PGM runtime.
///
/// `Config` errors are raised while building a model or synthesizing its
/// moves and abort construction. `Usage` and `Numeric` errors are raised
/// while sampling and abort the run. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PgmError {
    /// Model or move declaration mistakes detected at build/synthesis time.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// Accessibility graph lookups against unknown or mismatched nodes.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Protocol misuse detected while executing moves.
    #[error("usage error: {0}")]
    Usage(ErrorInfo),
    /// Numeric anomalies such as a log density evaluating to NaN.
    #[error("numeric error: {0}")]
    Numeric(ErrorInfo),
    /// Failures reported by a downstream sweep processor.
    #[error("processor error: {0}")]
    Processor(ErrorInfo),
    /// Serialization, parsing and configuration IO errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl PgmError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PgmError::Config(info)
            | PgmError::Graph(info)
            | PgmError::Usage(info)
            | PgmError::Numeric(info)
            | PgmError::Processor(info)
            | PgmError::Serde(info) => info,
        }
    }

    /// Returns the stable error code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Shorthand for a configuration error.
    pub fn config(code: impl Into<String>, message: impl Into<String>) -> Self {
        PgmError::Config(ErrorInfo::new(code, message))
    }

    /// Shorthand for a graph lookup error.
    pub fn graph(code: impl Into<String>, message: impl Into<String>) -> Self {
        PgmError::Graph(ErrorInfo::new(code, message))
    }
}
