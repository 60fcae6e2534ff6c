//! testwatch core data models.
//!
//! This crate defines the records shared by the session store, the quality
//! gate engine and the analysis engine, plus the operation recorder
//! capability they report to.

#![warn(missing_docs)]

// Core identities
mod id;

// Session data
mod result;
mod coverage;
mod session;

// Gates
mod quality;

// Observability
mod recorder;

// Re-exports
pub use id::*;

pub use result::{TestResult, TestStatus};
pub use coverage::{CoverageMetrics, CoverageGrade, CoverageCounts};
pub use session::{TestSession, SessionStatus, SessionStatistics};
pub use quality::{
    QualityGateDefinition, QualityGateType, ComparisonOperator, RiskLevel,
    GateOutcome, QualityGateStatus, EQUALITY_EPSILON,
};
pub use recorder::{
    OperationRecorder, NoopRecorder, TracingRecorder, MemoryRecorder, RecordedOperation,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
