//! Quality model - gate definitions and gate outcomes.

use serde::{Deserialize, Serialize};
use crate::Time;

/// Tolerance used by the equality operators.
pub const EQUALITY_EPSILON: f64 = 0.001;

/// Metric a gate is evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityGateType {
    /// Session pass rate (%)
    TestPassRate,
    /// Mean of the four coverage percentages (%)
    CodeCoverage,
    /// Total session duration (ms)
    ExecutionTime,
    /// Failed / total (%)
    ErrorRate,
    /// Mean test duration (ms)
    Performance,
    /// A metric with no built-in extractor
    Custom(String),
}

impl QualityGateType {
    /// Whether the threshold is a percentage in [0, 100].
    pub fn is_percentage(&self) -> bool {
        matches!(self, QualityGateType::TestPassRate | QualityGateType::CodeCoverage)
    }
}

impl std::fmt::Display for QualityGateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityGateType::TestPassRate => f.write_str("TestPassRate"),
            QualityGateType::CodeCoverage => f.write_str("CodeCoverage"),
            QualityGateType::ExecutionTime => f.write_str("ExecutionTime"),
            QualityGateType::ErrorRate => f.write_str("ErrorRate"),
            QualityGateType::Performance => f.write_str("Performance"),
            QualityGateType::Custom(name) => write!(f, "Custom({})", name),
        }
    }
}

/// Comparison between the observed value and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// Mathematical symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Equal => "=",
            ComparisonOperator::NotEqual => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
        }
    }

    /// Whether `current <op> threshold` holds.
    ///
    /// `Equal` and `NotEqual` tolerate [`EQUALITY_EPSILON`]; the ordering
    /// operators compare exactly.
    pub fn holds(&self, current: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::Equal => (current - threshold).abs() < EQUALITY_EPSILON,
            ComparisonOperator::NotEqual => (current - threshold).abs() >= EQUALITY_EPSILON,
            ComparisonOperator::GreaterThan => current > threshold,
            ComparisonOperator::GreaterThanOrEqual => current >= threshold,
            ComparisonOperator::LessThan => current < threshold,
            ComparisonOperator::LessThanOrEqual => current <= threshold,
        }
    }
}

impl std::fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Severity of a gate or a risk item. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// A named threshold rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateDefinition {
    /// Registry key
    pub id: String,

    /// Display name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Metric to extract
    pub gate_type: QualityGateType,

    /// Threshold, unit depends on the gate type
    pub threshold: f64,

    /// How the observed value is compared to the threshold
    pub operator: ComparisonOperator,

    /// Severity
    #[serde(default)]
    pub severity: RiskLevel,

    /// Disabled gates are skipped during checks
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Rendered when the gate fails
    #[serde(default)]
    pub failure_message: String,

    /// Rendered when the gate passes
    #[serde(default)]
    pub success_message: String,
}

fn enabled_by_default() -> bool {
    true
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GateOutcome {
    /// Evaluation has not finished
    #[default]
    Checking,
    Passed,
    Failed,
    /// The gate could not be evaluated
    Error,
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateOutcome::Checking => "Checking",
            GateOutcome::Passed => "Passed",
            GateOutcome::Failed => "Failed",
            GateOutcome::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Outcome of evaluating one definition against one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateStatus {
    pub gate_id: String,
    pub gate_name: String,
    pub gate_type: QualityGateType,
    pub threshold: f64,
    pub current_value: f64,
    pub status: GateOutcome,
    pub message: String,
    pub details: String,
    pub checked_at: Time,
}

impl QualityGateStatus {
    /// A status in `Checking` state for the given definition.
    pub fn checking(gate: &QualityGateDefinition) -> Self {
        Self {
            gate_id: gate.id.clone(),
            gate_name: gate.name.clone(),
            gate_type: gate.gate_type.clone(),
            threshold: gate.threshold,
            current_value: 0.0,
            status: GateOutcome::Checking,
            message: String::new(),
            details: String::new(),
            checked_at: chrono::Utc::now(),
        }
    }

    /// Whether the gate passed.
    pub fn is_passed(&self) -> bool {
        self.status == GateOutcome::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_operators_use_epsilon() {
        assert!(ComparisonOperator::Equal.holds(80.0004, 80.0));
        assert!(!ComparisonOperator::Equal.holds(80.002, 80.0));
        assert!(ComparisonOperator::NotEqual.holds(80.002, 80.0));
        assert!(!ComparisonOperator::NotEqual.holds(80.0004, 80.0));
    }

    #[test]
    fn test_ordering_operators_are_exact() {
        assert!(ComparisonOperator::GreaterThanOrEqual.holds(80.0, 80.0));
        assert!(!ComparisonOperator::GreaterThanOrEqual.holds(79.999, 80.0));
        assert!(!ComparisonOperator::GreaterThan.holds(80.0, 80.0));
        assert!(ComparisonOperator::LessThanOrEqual.holds(5.0, 5.0));
        assert!(!ComparisonOperator::LessThan.holds(5.0, 5.0));
        assert!(ComparisonOperator::LessThan.holds(4.9999, 5.0));
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Critical > RiskLevel::High);
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!(RiskLevel::default(), RiskLevel::Low);
    }

    #[test]
    fn test_percentage_types() {
        assert!(QualityGateType::TestPassRate.is_percentage());
        assert!(QualityGateType::CodeCoverage.is_percentage());
        assert!(!QualityGateType::ErrorRate.is_percentage());
        assert!(!QualityGateType::Custom("x".into()).is_percentage());
    }

    #[test]
    fn test_definition_deserialize_defaults() {
        let json = r#"{
            "id": "perf",
            "name": "Performance",
            "gate_type": "Performance",
            "threshold": 250.0,
            "operator": "LessThanOrEqual"
        }"#;
        let gate: QualityGateDefinition = serde_json::from_str(json).unwrap();
        assert!(gate.enabled);
        assert_eq!(gate.severity, RiskLevel::Low);
        assert!(gate.failure_message.is_empty());
    }
}
