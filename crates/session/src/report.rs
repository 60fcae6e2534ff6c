//! Plain-text session report.

use testwatch_core::{SessionStatistics, TestSession, TestStatus, Time};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_time(time: Option<Time>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a session as a multi-section text report.
///
/// Sections appear in a fixed order: header, statistics, coverage, quality
/// gates (when any are attached) and results grouped by status. Aggregates
/// of a session that is still active are computed for the report only.
pub fn render_session_report(session: &TestSession) -> String {
    let stats = if session.status.is_terminal() {
        session.stats
    } else {
        SessionStatistics::from_results(&session.results)
    };
    let mut lines = Vec::new();

    lines.push("=== Test Session Report ===".to_string());
    lines.push(format!("Session ID: {}", session.id));
    lines.push(format!("Session Name: {}", session.name));
    lines.push(format!("Project Path: {}", session.project_path));
    lines.push(format!("Solution Path: {}", session.solution_path));
    lines.push(format!("Build Configuration: {}", session.build_configuration));
    lines.push(format!("Target Framework: {}", session.target_framework));
    lines.push(format!("Start Time: {}", format_time(Some(session.started_at))));
    lines.push(format!("End Time: {}", format_time(session.ended_at)));
    lines.push(format!("Status: {}", session.status));
    lines.push(String::new());

    lines.push("=== Statistics ===".to_string());
    lines.push(format!("Total Tests: {}", stats.total));
    lines.push(format!("Passed Tests: {}", stats.passed));
    lines.push(format!("Failed Tests: {}", stats.failed));
    lines.push(format!("Skipped Tests: {}", stats.skipped));
    lines.push(format!("Pass Rate: {:.2}%", stats.pass_rate));
    lines.push(format!("Total Duration: {} ms", stats.total_duration_ms));
    lines.push(String::new());

    let coverage = &session.coverage;
    lines.push("=== Coverage ===".to_string());
    lines.push(format!("Project Name: {}", coverage.project_name));
    lines.push(format!("Line Coverage: {:.2}%", coverage.line));
    lines.push(format!("Branch Coverage: {:.2}%", coverage.branch));
    lines.push(format!("Method Coverage: {:.2}%", coverage.method));
    lines.push(format!("Class Coverage: {:.2}%", coverage.class));
    lines.push(format!("Coverage Grade: {}", coverage.grade));
    lines.push(format!("Report Location: {}", coverage.report_location));
    lines.push(String::new());

    if !session.quality_gates.is_empty() {
        lines.push("=== Quality Gates ===".to_string());
        for gate in &session.quality_gates {
            lines.push(format!("Gate: {} ({})", gate.gate_name, gate.gate_id));
            lines.push(format!("  Type: {}", gate.gate_type));
            lines.push(format!("  Status: {}", gate.status));
            lines.push(format!("  Threshold: {:.2}", gate.threshold));
            lines.push(format!("  Current Value: {:.2}", gate.current_value));
            lines.push(format!("  Message: {}", gate.message));
            lines.push(format!("  Checked At: {}", format_time(Some(gate.checked_at))));
            for detail in gate.details.lines().filter(|l| !l.is_empty()) {
                lines.push(format!("    {}", detail));
            }
            lines.push(String::new());
        }
    }

    lines.push("=== Test Results ===".to_string());
    for status in TestStatus::ALL {
        let group: Vec<_> = session.results.iter().filter(|r| r.status == status).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(format!("{} ({}):", status, group.len()));
        for result in group {
            lines.push(format!(
                "  - {} [{}/{}] ({} ms) {}",
                result.name, result.test_type, result.category, result.duration_ms, result.id
            ));
            if status == TestStatus::Failed {
                if let Some(error) = result.error_message.as_deref().filter(|e| !e.is_empty()) {
                    lines.push(format!("    Error: {}", error));
                }
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use testwatch_core::{CoverageMetrics, SessionStatus, TestResult};

    fn finished_session() -> TestSession {
        let mut session = TestSession::new("Nightly", "/proj", "/proj/app.sln");
        session.results = vec![
            TestResult::passed("loads_config", 12),
            TestResult::failed("parses_xml", 40, "unexpected element <item>"),
            TestResult::skipped("slow_path"),
            TestResult::passed("writes_output", 8),
        ];
        session.coverage = CoverageMetrics::new(72.0, 65.0, 80.0, 75.0)
            .with_project("app")
            .with_report_location("coverage/index.html");
        session.status = SessionStatus::Completed;
        session.ended_at = Some(chrono::Utc::now());
        session.calculate_statistics();
        session
    }

    #[test]
    fn test_report_contains_every_section() {
        let report = render_session_report(&finished_session());

        assert!(report.starts_with("=== Test Session Report ==="));
        assert!(report.contains("Session Name: Nightly"));
        assert!(report.contains("Solution Path: /proj/app.sln"));
        assert!(report.contains("Status: Completed"));
        assert!(report.contains("Total Tests: 4"));
        assert!(report.contains("Pass Rate: 50.00%"));
        assert!(report.contains("Total Duration: 60 ms"));
        assert!(report.contains("Coverage Grade: C"));
        assert!(report.contains("Report Location: coverage/index.html"));
        assert!(!report.contains("=== Quality Gates ==="));
    }

    #[test]
    fn test_results_grouped_in_status_order() {
        let report = render_session_report(&finished_session());

        let passed = report.find("Passed (2):").unwrap();
        let failed = report.find("Failed (1):").unwrap();
        let skipped = report.find("Skipped (1):").unwrap();
        assert!(passed < failed && failed < skipped);
        assert!(report.contains("    Error: unexpected element <item>"));
        assert_eq!(report.matches("Error:").count(), 1);
    }

    #[test]
    fn test_report_is_deterministic() {
        let session = finished_session();
        assert_eq!(render_session_report(&session), render_session_report(&session));
    }

    #[test]
    fn test_active_session_report_computes_aggregates() {
        let mut session = TestSession::new("Live", "", "");
        session.status = SessionStatus::Running;
        session.results.push(TestResult::passed("a", 5));

        let report = render_session_report(&session);
        assert!(report.contains("Total Tests: 1"));
        assert!(report.contains("End Time: -"));
    }
}
