//! Analysis reports in plain text and Markdown.

use crate::model::TestSessionAnalysis;

/// Render an analysis as a multi-section text report.
pub fn generate_analysis_report(analysis: &TestSessionAnalysis) -> String {
    let metrics = &analysis.key_metrics;
    let mut lines = Vec::new();

    lines.push("=== Test Session Analysis Report ===".to_string());
    lines.push(format!("Session ID: {}", analysis.session_id));
    lines.push(format!("Session Name: {}", analysis.session_name));
    lines.push(format!(
        "Analysis Time: {}",
        analysis.analyzed_at.format("%Y-%m-%d %H:%M:%S")
    ));
    lines.push(String::new());

    lines.push("=== Overall Health ===".to_string());
    lines.push(format!("Health Status: {}", analysis.overall_health));
    lines.push(format!("Health Score: {:.2}", analysis.health_score));
    lines.push(String::new());

    lines.push("=== Key Metrics ===".to_string());
    lines.push(format!("Pass Rate: {:.2}%", metrics.pass_rate));
    lines.push(format!("Total Tests: {}", metrics.total_tests));
    lines.push(format!("Failed Tests: {}", metrics.failed_tests));
    lines.push(format!("Skipped Tests: {}", metrics.skipped_tests));
    lines.push(format!(
        "Average Test Duration: {:.2} ms",
        metrics.average_test_duration_ms
    ));
    lines.push(format!(
        "Total Execution Time: {} ms",
        metrics.total_execution_time_ms
    ));
    lines.push(format!("Quality Gates Passed: {}", metrics.quality_gates_passed));
    lines.push(format!("Quality Gates Failed: {}", metrics.quality_gates_failed));
    lines.push(format!("Quality Gates Errored: {}", metrics.quality_gates_errored));
    lines.push(String::new());

    lines.push("=== Coverage ===".to_string());
    lines.push(format!("Line Coverage: {:.2}%", metrics.coverage.line));
    lines.push(format!("Branch Coverage: {:.2}%", metrics.coverage.branch));
    lines.push(format!("Method Coverage: {:.2}%", metrics.coverage.method));
    lines.push(format!("Class Coverage: {:.2}%", metrics.coverage.class));
    lines.push(String::new());

    if !metrics.error_categories.is_empty() {
        lines.push("=== Failures by Category ===".to_string());
        for (category, count) in &metrics.error_categories {
            lines.push(format!("- {}: {}", category, count));
        }
        lines.push(String::new());
    }

    if !metrics.slowest_tests.is_empty() {
        lines.push("=== Slowest Tests ===".to_string());
        for result in &metrics.slowest_tests {
            lines.push(format!("- {} ({} ms)", result.name, result.duration_ms));
        }
        lines.push(String::new());
    }

    let trends = &analysis.trend_analysis;
    lines.push("=== Trends ===".to_string());
    lines.push(format!("Pass Rate: {}", trends.pass_rate));
    lines.push(format!("Coverage: {}", trends.coverage));
    lines.push(format!("Performance: {}", trends.performance));
    lines.push(format!("Reliability: {}", trends.reliability));
    for note in &trends.notes {
        lines.push(format!("- {}", note));
    }
    lines.push(String::new());

    let risks = &analysis.risk_assessment;
    lines.push("=== Risk Assessment ===".to_string());
    lines.push(format!("Overall Risk Level: {}", risks.overall_level));
    lines.push(format!("Total Risks: {}", risks.total_count()));
    lines.push(format!("Critical: {}", risks.critical_count));
    lines.push(format!("High: {}", risks.high_count));
    lines.push(format!("Medium: {}", risks.medium_count));
    lines.push(format!("Low: {}", risks.low_count));
    for item in &risks.items {
        lines.push(format!("  - [{}] {}: {}", item.level, item.category, item.description));
        lines.push(format!("    Impact: {}", item.impact));
        lines.push(format!("    Recommendation: {}", item.recommendation));
    }
    lines.push(String::new());

    lines.push("=== Recommendations ===".to_string());
    if analysis.recommendations.is_empty() {
        lines.push("- None".to_string());
    }
    for recommendation in &analysis.recommendations {
        lines.push(format!("- {}", recommendation));
    }
    lines.push(String::new());

    let performance = &analysis.performance_insights;
    lines.push("=== Performance ===".to_string());
    lines.push(format!("Total Tests: {}", performance.total_tests));
    lines.push(format!(
        "Total Execution Time: {} ms",
        performance.total_execution_time_ms
    ));
    lines.push(format!(
        "Average Test Duration: {:.2} ms",
        performance.average_test_duration_ms
    ));
    if let Some(fastest) = &performance.fastest_test {
        lines.push(format!("Fastest Test: {} ({} ms)", fastest.name, fastest.duration_ms));
    }
    if let Some(slowest) = &performance.slowest_test {
        lines.push(format!("Slowest Test: {} ({} ms)", slowest.name, slowest.duration_ms));
    }
    for issue in &performance.issues {
        lines.push(format!("- {}", issue));
    }

    lines.join("\n")
}

fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', "<br>")
}

/// Render an analysis as Markdown, in the same section order as the text report.
pub fn generate_analysis_markdown(analysis: &TestSessionAnalysis) -> String {
    let metrics = &analysis.key_metrics;
    let mut lines = vec![
        format!("# Test Session Analysis: {}", analysis.session_name),
        String::new(),
        format!("- Session ID: `{}`", analysis.session_id),
        format!(
            "- Analysis Time: {}",
            analysis.analyzed_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!(
            "- Health: **{}** ({:.2})",
            analysis.overall_health, analysis.health_score
        ),
        String::new(),
    ];

    lines.push("## Key Metrics".to_string());
    lines.push(String::new());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    let rows = [
        ("Pass Rate", format!("{:.2}%", metrics.pass_rate)),
        ("Total Tests", metrics.total_tests.to_string()),
        ("Failed Tests", metrics.failed_tests.to_string()),
        ("Skipped Tests", metrics.skipped_tests.to_string()),
        ("Average Test Duration", format!("{:.2} ms", metrics.average_test_duration_ms)),
        ("Total Execution Time", format!("{} ms", metrics.total_execution_time_ms)),
        ("Line Coverage", format!("{:.2}%", metrics.coverage.line)),
        ("Branch Coverage", format!("{:.2}%", metrics.coverage.branch)),
        ("Quality Gates Passed", metrics.quality_gates_passed.to_string()),
        ("Quality Gates Failed", metrics.quality_gates_failed.to_string()),
        ("Quality Gates Errored", metrics.quality_gates_errored.to_string()),
    ];
    for (metric, value) in rows {
        lines.push(format!("| {} | {} |", metric, value));
    }
    lines.push(String::new());

    if !metrics.error_categories.is_empty() {
        lines.push("## Failures by Category".to_string());
        lines.push(String::new());
        for (category, count) in &metrics.error_categories {
            lines.push(format!("- {}: {}", category, count));
        }
        lines.push(String::new());
    }

    if !metrics.slowest_tests.is_empty() {
        lines.push("## Slowest Tests".to_string());
        lines.push(String::new());
        lines.push("| Test | Duration (ms) |".to_string());
        lines.push("|------|---------------|".to_string());
        for result in &metrics.slowest_tests {
            lines.push(format!("| {} | {} |", cell(&result.name), result.duration_ms));
        }
        lines.push(String::new());
    }

    let trends = &analysis.trend_analysis;
    lines.push("## Trends".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Pass rate {}, coverage {}, performance {}, reliability {}.",
        trends.pass_rate, trends.coverage, trends.performance, trends.reliability
    ));
    for note in &trends.notes {
        lines.push(format!("- {}", note));
    }
    lines.push(String::new());

    let risks = &analysis.risk_assessment;
    lines.push("## Risk Assessment".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Overall risk: **{}** ({} critical, {} high, {} medium, {} low)",
        risks.overall_level,
        risks.critical_count,
        risks.high_count,
        risks.medium_count,
        risks.low_count
    ));
    if !risks.items.is_empty() {
        lines.push(String::new());
        lines.push("| Level | Category | Description | Recommendation |".to_string());
        lines.push("|-------|----------|-------------|----------------|".to_string());
        for item in &risks.items {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                item.level,
                cell(&item.category),
                cell(&item.description),
                cell(&item.recommendation)
            ));
        }
    }
    lines.push(String::new());

    lines.push("## Recommendations".to_string());
    lines.push(String::new());
    if analysis.recommendations.is_empty() {
        lines.push("- None".to_string());
    }
    for recommendation in &analysis.recommendations {
        lines.push(format!("- {}", recommendation));
    }
    lines.push(String::new());

    let performance = &analysis.performance_insights;
    lines.push("## Performance".to_string());
    lines.push(String::new());
    if let Some(fastest) = &performance.fastest_test {
        lines.push(format!("- Fastest: {} ({} ms)", fastest.name, fastest.duration_ms));
    }
    if let Some(slowest) = &performance.slowest_test {
        lines.push(format!("- Slowest: {} ({} ms)", slowest.name, slowest.duration_ms));
    }
    for issue in &performance.issues {
        lines.push(format!("- {}", issue));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SessionAnalyzer;
    use testwatch_core::{CoverageMetrics, SessionStatus, TestResult, TestSession};

    fn analysis() -> TestSessionAnalysis {
        let mut session = TestSession::new("Nightly", "", "");
        session.results = vec![
            TestResult::passed("fast", 5),
            TestResult::failed("broken", 1500, "assertion failed").with_category("Parsing"),
        ];
        session.coverage = CoverageMetrics::new(45.0, 40.0, 50.0, 45.0);
        session.status = SessionStatus::Completed;
        session.calculate_statistics();
        SessionAnalyzer::new().analyze(&session)
    }

    #[test]
    fn test_report_sections_in_order() {
        let report = generate_analysis_report(&analysis());

        let sections = [
            "=== Test Session Analysis Report ===",
            "=== Overall Health ===",
            "=== Key Metrics ===",
            "=== Coverage ===",
            "=== Failures by Category ===",
            "=== Slowest Tests ===",
            "=== Trends ===",
            "=== Risk Assessment ===",
            "=== Recommendations ===",
            "=== Performance ===",
        ];
        let positions: Vec<usize> = sections.iter().map(|s| report.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_report_facts() {
        let report = generate_analysis_report(&analysis());

        assert!(report.contains("Session Name: Nightly"));
        assert!(report.contains("Health Status: Critical"));
        assert!(report.contains("Pass Rate: 50.00%"));
        assert!(report.contains("- Parsing: 1"));
        assert!(report.contains("- broken (1500 ms)"));
        assert!(report.contains("Overall Risk Level: Critical"));
        assert!(report.contains("  - [Critical] Test Pass Rate: Test pass rate is critically low (50.00%)"));
        assert!(report.contains("Fastest Test: fast (5 ms)"));
        assert!(report.contains("- 1 test(s) took longer than 1000 ms"));
    }

    #[test]
    fn test_markdown_report() {
        let markdown = generate_analysis_markdown(&analysis());

        assert!(markdown.starts_with("# Test Session Analysis: Nightly"));
        assert!(markdown.contains("- Health: **Critical**"));
        assert!(markdown.contains("| Pass Rate | 50.00% |"));
        assert!(markdown.contains("| broken | 1500 |"));
        assert!(markdown
            .contains("| Critical | Test Pass Rate | Test pass rate is critically low (50.00%) |"));
        let sections = [
            "## Key Metrics",
            "## Slowest Tests",
            "## Trends",
            "## Risk Assessment",
            "## Recommendations",
            "## Performance",
        ];
        let positions: Vec<usize> = sections.iter().map(|s| markdown.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(!markdown.contains("==="));
    }

    #[test]
    fn test_report_is_deterministic() {
        let analysis = analysis();
        assert_eq!(generate_analysis_report(&analysis), generate_analysis_report(&analysis));
    }
}
