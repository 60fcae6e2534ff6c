//! Default gate set seeded into every new engine.

use testwatch_core::{ComparisonOperator, QualityGateDefinition, QualityGateType, RiskLevel};

use crate::gate::QualityGateBuilder;

/// The six default gates.
pub fn default_gates() -> Vec<QualityGateDefinition> {
    use ComparisonOperator::{GreaterThanOrEqual, LessThanOrEqual};

    vec![
        QualityGateDefinition::new(
            "test_pass_rate",
            "Test Pass Rate",
            QualityGateType::TestPassRate,
            GreaterThanOrEqual,
            80.0,
        )
        .with_description("Ensures the test pass rate reaches the target")
        .with_severity(RiskLevel::High)
        .with_messages(
            "Test pass rate {current_value}% is below the target {threshold}%",
            "Test pass rate meets the target at {current_value}%",
        ),
        QualityGateDefinition::new(
            "code_coverage",
            "Code Coverage",
            QualityGateType::CodeCoverage,
            GreaterThanOrEqual,
            70.0,
        )
        .with_description("Ensures code coverage reaches the target")
        .with_severity(RiskLevel::Medium)
        .with_messages(
            "Code coverage {current_value}% is below the target {threshold}%",
            "Code coverage meets the target at {current_value}%",
        ),
        QualityGateDefinition::new(
            "line_coverage",
            "Line Coverage",
            QualityGateType::CodeCoverage,
            GreaterThanOrEqual,
            70.0,
        )
        .with_description("Ensures line coverage reaches the target")
        .with_severity(RiskLevel::Medium)
        .with_messages(
            "Line coverage {current_value}% is below the target {threshold}%",
            "Line coverage meets the target at {current_value}%",
        ),
        QualityGateDefinition::new(
            "branch_coverage",
            "Branch Coverage",
            QualityGateType::CodeCoverage,
            GreaterThanOrEqual,
            60.0,
        )
        .with_description("Ensures branch coverage reaches the target")
        .with_severity(RiskLevel::Medium)
        .with_messages(
            "Branch coverage {current_value}% is below the target {threshold}%",
            "Branch coverage meets the target at {current_value}%",
        ),
        QualityGateDefinition::new(
            "execution_time",
            "Execution Time",
            QualityGateType::ExecutionTime,
            LessThanOrEqual,
            300_000.0,
        )
        .with_description("Ensures test execution time stays within bounds")
        .with_severity(RiskLevel::Low)
        .with_messages(
            "Test execution time {current_value:F0} ms exceeds the target {threshold:F0} ms",
            "Test execution time is within the target at {current_value:F0} ms",
        ),
        QualityGateDefinition::new(
            "error_rate",
            "Error Rate",
            QualityGateType::ErrorRate,
            LessThanOrEqual,
            5.0,
        )
        .with_description("Ensures the test error rate stays below the target")
        .with_severity(RiskLevel::High)
        .with_messages(
            "Test error rate {current_value}% exceeds the target {threshold}%",
            "Test error rate is within the target at {current_value}%",
        ),
    ]
}
