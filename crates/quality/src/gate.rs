//! Gate definition builder.

use testwatch_core::{ComparisonOperator, QualityGateDefinition, QualityGateType, RiskLevel};

/// Extension trait for QualityGateDefinition providing builder methods.
pub trait QualityGateBuilder: Sized {
    /// Create a new enabled gate with medium severity and empty messages.
    fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        gate_type: QualityGateType,
        operator: ComparisonOperator,
        threshold: f64,
    ) -> Self;

    /// Set description.
    fn with_description(self, desc: impl Into<String>) -> Self;

    /// Set severity.
    fn with_severity(self, severity: RiskLevel) -> Self;

    /// Set failure and success message templates.
    fn with_messages(self, failure: impl Into<String>, success: impl Into<String>) -> Self;

    /// Mark the gate disabled.
    fn disabled(self) -> Self;
}

impl QualityGateBuilder for QualityGateDefinition {
    fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        gate_type: QualityGateType,
        operator: ComparisonOperator,
        threshold: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            gate_type,
            threshold,
            operator,
            severity: RiskLevel::Medium,
            enabled: true,
            failure_message: String::new(),
            success_message: String::new(),
        }
    }

    fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    fn with_severity(mut self, severity: RiskLevel) -> Self {
        self.severity = severity;
        self
    }

    fn with_messages(mut self, failure: impl Into<String>, success: impl Into<String>) -> Self {
        self.failure_message = failure.into();
        self.success_message = success.into();
        self
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
