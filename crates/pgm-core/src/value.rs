use std::fmt;

use serde::{Deserialize, Serialize};

/// Snapshot of a variable's state.
///
/// Snapshots are plain copies: restoring one reproduces the same bits
/// exactly, which is what rejection rollback relies on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum VariableValue {
    /// Real-valued state.
    Real(f64),
    /// Integer-valued state.
    Integer(i64),
}

impl VariableValue {
    /// Returns the real payload, if this is a real value.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            VariableValue::Real(value) => Some(*value),
            VariableValue::Integer(_) => None,
        }
    }

    /// Returns the integer payload, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            VariableValue::Integer(value) => Some(*value),
            VariableValue::Real(_) => None,
        }
    }

    /// Numeric view used for summaries (integers are widened).
    pub fn to_f64(&self) -> f64 {
        match self {
            VariableValue::Real(value) => *value,
            VariableValue::Integer(value) => *value as f64,
        }
    }

    /// Short label naming the value kind.
    pub fn kind(&self) -> &'static str {
        match self {
            VariableValue::Real(_) => "real",
            VariableValue::Integer(_) => "integer",
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Real(value) => write!(f, "{value}"),
            VariableValue::Integer(value) => write!(f, "{value}"),
        }
    }
}
