//! Quality gate errors.

/// Error type for gate registry and configuration operations.
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors surfaced to callers of the gate engine.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// No gate is registered under the id
    #[error("Quality gate '{0}' not found")]
    NotFound(String),

    /// Gate configuration file is malformed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gate configuration is inconsistent
    #[error("Invalid gate configuration: {0}")]
    Config(String),
}

/// Why a single gate could not be evaluated.
///
/// Recovered at the per-gate boundary and reported as an `Error` status.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// The extraction table has no entry for the gate type
    #[error("Unsupported quality gate type: {0}")]
    UnsupportedType(String),

    /// The extracted metric is NaN or infinite
    #[error("Metric {metric} is not a finite number ({value})")]
    NonFiniteValue {
        /// Gate type the metric was extracted for
        metric: String,
        /// Offending value
        value: f64,
    },
}

impl EvaluationError {
    /// Short kind name used in detail blocks.
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationError::UnsupportedType(_) => "UnsupportedType",
            EvaluationError::NonFiniteValue { .. } => "NonFiniteValue",
        }
    }
}
