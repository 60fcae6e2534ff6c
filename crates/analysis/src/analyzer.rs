//! Session analyzer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use testwatch_core::{
    GateOutcome, OperationRecorder, RiskLevel, TestResult, TestSession, TestStatus,
    TracingRecorder,
};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::model::{
    health_score, HealthStatus, KeyMetrics, PerformanceInsights, RiskAssessment, RiskItem,
    TestSessionAnalysis,
};
use crate::trend::{NoHistory, TrendProvider};

/// Derives health, metrics, trends, recommendations, risks and performance
/// insights from a session.
pub struct SessionAnalyzer {
    config: AnalysisConfig,
    trends: Box<dyn TrendProvider>,
    recorder: Arc<dyn OperationRecorder>,
}

impl SessionAnalyzer {
    /// Create an analyzer with default thresholds and no history.
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
            trends: Box::new(NoHistory),
            recorder: Arc::new(TracingRecorder),
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the trend provider.
    pub fn with_trend_provider(mut self, provider: impl TrendProvider + 'static) -> Self {
        self.trends = Box::new(provider);
        self
    }

    /// Set the operation recorder.
    pub fn with_recorder(mut self, recorder: Arc<dyn OperationRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse a session in any status.
    ///
    /// Aggregates of a session that is still active are computed on a copy.
    pub fn analyze(&self, session: &TestSession) -> TestSessionAnalysis {
        let start = Instant::now();

        let session = session.with_current_statistics();

        let score = health_score(session.stats.pass_rate, session.coverage.mean());
        let analysis = TestSessionAnalysis {
            session_id: session.id,
            session_name: session.name.clone(),
            analyzed_at: chrono::Utc::now(),
            health_score: score,
            overall_health: HealthStatus::from_score(score),
            key_metrics: self.key_metrics(&session),
            trend_analysis: self.trends.analyze_trends(&session),
            recommendations: self.recommendations(&session),
            risk_assessment: self.assess_risks(&session),
            performance_insights: self.performance_insights(&session),
        };

        debug!(
            "Analysed session {}: health {} ({:.2}), risk {}",
            analysis.session_id,
            analysis.overall_health,
            analysis.health_score,
            analysis.risk_assessment.overall_level
        );
        self.recorder.record_operation(
            "AnalyzeTestSession",
            start.elapsed().as_secs_f64() * 1000.0,
            true,
            None,
        );
        analysis
    }

    fn key_metrics(&self, session: &TestSession) -> KeyMetrics {
        let stats = &session.stats;
        let gate_count = |outcome: GateOutcome| {
            session.quality_gates.iter().filter(|g| g.status == outcome).count()
        };

        let mut slowest: Vec<TestResult> = session.results.clone();
        slowest.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
        slowest.truncate(self.config.slowest_tests_len);

        KeyMetrics {
            pass_rate: stats.pass_rate,
            total_tests: stats.total,
            failed_tests: stats.failed,
            skipped_tests: stats.skipped,
            average_test_duration_ms: stats.average_duration_ms(),
            total_execution_time_ms: stats.total_duration_ms,
            coverage: session.coverage.clone(),
            error_categories: error_categories(session),
            slowest_tests: slowest,
            quality_gates_passed: gate_count(GateOutcome::Passed),
            quality_gates_failed: gate_count(GateOutcome::Failed),
            quality_gates_errored: gate_count(GateOutcome::Error),
        }
    }

    fn recommendations(&self, session: &TestSession) -> Vec<String> {
        let config = &self.config;
        let stats = &session.stats;
        let coverage = session.coverage.mean();
        let average = stats.average_duration_ms();
        let mut recommendations = Vec::new();

        if stats.pass_rate < config.pass_rate_warning {
            recommendations.push(format!(
                "Test pass rate is low ({:.2}%); review the failing tests",
                stats.pass_rate
            ));
        }

        if coverage < config.coverage_recommendation {
            recommendations.push(format!(
                "Code coverage is low ({:.2}%); add tests covering the critical paths",
                coverage
            ));
        }

        if average > config.slow_average_ms {
            recommendations.push(format!(
                "Average test duration is high ({:.2} ms); optimize test performance",
                average
            ));
        }

        if let Some(category) = most_failing_category(&error_categories(session)) {
            recommendations.push(format!(
                "Category '{}' has the most test failures; focus on it first",
                category
            ));
        }

        for gate in session
            .quality_gates
            .iter()
            .filter(|g| g.status == GateOutcome::Failed)
        {
            recommendations.push(format!(
                "Quality gate '{}' failed: {}",
                gate.gate_name, gate.message
            ));
        }

        recommendations
    }

    fn assess_risks(&self, session: &TestSession) -> RiskAssessment {
        let config = &self.config;
        let pass_rate = session.stats.pass_rate;
        let coverage = session.coverage.mean();
        let average = session.stats.average_duration_ms();
        let mut items = Vec::new();

        if pass_rate < config.pass_rate_critical {
            items.push(RiskItem {
                level: RiskLevel::Critical,
                category: "Test Pass Rate".to_string(),
                description: format!("Test pass rate is critically low ({:.2}%)", pass_rate),
                impact: "Serious quality problems are likely".to_string(),
                recommendation: "Stop the deployment and fix every failing test".to_string(),
            });
        } else if pass_rate < config.pass_rate_warning {
            items.push(RiskItem {
                level: RiskLevel::High,
                category: "Test Pass Rate".to_string(),
                description: format!("Test pass rate is below the target ({:.2}%)", pass_rate),
                impact: "Hidden quality problems may exist".to_string(),
                recommendation: "Fix the critical test failures before deploying".to_string(),
            });
        }

        if coverage < config.coverage_risk {
            items.push(RiskItem {
                level: RiskLevel::High,
                category: "Code Coverage".to_string(),
                description: format!("Code coverage is very low ({:.2}%)", coverage),
                impact: "Large parts of the code are untested and may hide defects".to_string(),
                recommendation: "Add test cases to raise coverage".to_string(),
            });
        }

        if average > config.slow_average_risk_ms {
            items.push(RiskItem {
                level: RiskLevel::Medium,
                category: "Test Performance".to_string(),
                description: format!("Tests take too long (average {:.2} ms)", average),
                impact: "Slows down development and the CI pipeline".to_string(),
                recommendation: "Optimize slow tests and consider running them in parallel"
                    .to_string(),
            });
        }

        RiskAssessment::from_items(items)
    }

    fn performance_insights(&self, session: &TestSession) -> PerformanceInsights {
        let config = &self.config;
        let results = &session.results;
        let average = session.stats.average_duration_ms();

        let mut issues = Vec::new();
        if average > config.slow_average_ms {
            issues.push(format!("Average test duration is too high ({:.2} ms)", average));
        }

        let slow = results.iter().filter(|r| r.duration_ms > config.slow_test_ms).count();
        if slow > 0 {
            issues.push(format!(
                "{} test(s) took longer than {} ms",
                slow, config.slow_test_ms
            ));
        }

        let very_slow = results
            .iter()
            .filter(|r| r.duration_ms > config.very_slow_test_ms)
            .count();
        if very_slow > 0 {
            issues.push(format!(
                "{} test(s) took longer than {} ms and need optimization",
                very_slow, config.very_slow_test_ms
            ));
        }

        PerformanceInsights {
            total_tests: results.len(),
            total_execution_time_ms: session.stats.total_duration_ms,
            average_test_duration_ms: average,
            // First of equal durations in both directions.
            fastest_test: results.iter().min_by_key(|r| r.duration_ms).cloned(),
            slowest_test: results.iter().rev().max_by_key(|r| r.duration_ms).cloned(),
            issues,
        }
    }
}

impl Default for SessionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn error_categories(session: &TestSession) -> BTreeMap<String, usize> {
    let mut categories = BTreeMap::new();
    for result in session.results.iter().filter(|r| r.status == TestStatus::Failed) {
        *categories.entry(result.category.clone()).or_insert(0) += 1;
    }
    categories
}

/// Category with the most failures; ties go to the first in name order.
fn most_failing_category(categories: &BTreeMap<String, usize>) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (category, &count) in categories {
        if best.map_or(true, |(_, max)| count > max) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendDirection;
    use crate::trend::{HistoricalTrends, TrendSample};
    use testwatch_core::{
        CoverageMetrics, MemoryRecorder, QualityGateStatus, QualityGateType, SessionStatus,
    };

    fn completed(results: Vec<TestResult>, coverage: CoverageMetrics) -> TestSession {
        let mut session = TestSession::new("S1", "/proj", "/proj/app.sln");
        session.results = results;
        session.coverage = coverage;
        session.status = SessionStatus::Completed;
        session.ended_at = Some(chrono::Utc::now());
        session.calculate_statistics();
        session
    }

    fn failed_in(name: &str, category: &str) -> TestResult {
        TestResult::failed(name, 10, "boom").with_category(category)
    }

    fn gate(name: &str, status: GateOutcome, message: &str) -> QualityGateStatus {
        QualityGateStatus {
            gate_id: name.to_lowercase(),
            gate_name: name.to_string(),
            gate_type: QualityGateType::TestPassRate,
            threshold: 80.0,
            current_value: 50.0,
            status,
            message: message.to_string(),
            details: String::new(),
            checked_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_healthy_session_has_no_findings() {
        let session = completed(
            vec![TestResult::passed("a", 10), TestResult::passed("b", 20)],
            CoverageMetrics::new(95.0, 90.0, 92.0, 96.0),
        );

        let analysis = SessionAnalyzer::new().analyze(&session);
        assert_eq!(analysis.overall_health, HealthStatus::Excellent);
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.risk_assessment.overall_level, RiskLevel::Low);
        assert!(analysis.risk_assessment.items.is_empty());
        assert!(analysis.performance_insights.issues.is_empty());
        assert_eq!(analysis.trend_analysis.pass_rate, TrendDirection::Stable);
    }

    #[test]
    fn test_recommendations_fire_in_rule_order() {
        let mut session = completed(
            vec![
                TestResult::passed("a", 900),
                failed_in("b", "Parsing"),
                failed_in("c", "Io"),
                failed_in("d", "Parsing"),
            ],
            CoverageMetrics::new(40.0, 40.0, 40.0, 40.0),
        );
        session.results[0].duration_ms = 2000;
        session.calculate_statistics();
        session.quality_gates = vec![
            gate("Test Pass Rate", GateOutcome::Failed, "Test pass rate 25.00% is below the target 80.00%"),
            gate("Error Rate", GateOutcome::Passed, "ok"),
            gate("Custom", GateOutcome::Error, "Error while checking quality gate"),
        ];

        let analysis = SessionAnalyzer::new().analyze(&session);
        let recs = &analysis.recommendations;
        assert_eq!(recs.len(), 5);
        assert!(recs[0].starts_with("Test pass rate is low (25.00%)"));
        assert!(recs[1].starts_with("Code coverage is low (40.00%)"));
        assert!(recs[2].starts_with("Average test duration is high (507.50 ms)"));
        assert_eq!(recs[3], "Category 'Parsing' has the most test failures; focus on it first");
        assert_eq!(
            recs[4],
            "Quality gate 'Test Pass Rate' failed: Test pass rate 25.00% is below the target 80.00%"
        );

        let metrics = &analysis.key_metrics;
        assert_eq!(metrics.error_categories.get("Parsing"), Some(&2));
        assert_eq!(metrics.error_categories.get("Io"), Some(&1));
        assert_eq!(metrics.quality_gates_passed, 1);
        assert_eq!(metrics.quality_gates_failed, 1);
        assert_eq!(metrics.quality_gates_errored, 1);
    }

    #[test]
    fn test_most_failing_category_tie_takes_first_name() {
        let session = completed(
            vec![failed_in("a", "Zeta"), failed_in("b", "Alpha")],
            CoverageMetrics::default(),
        );
        let analysis = SessionAnalyzer::new().analyze(&session);
        assert!(analysis
            .recommendations
            .contains(&"Category 'Alpha' has the most test failures; focus on it first".to_string()));
    }

    #[test]
    fn test_risk_levels() {
        let critical = completed(
            vec![TestResult::passed("a", 10), failed_in("b", "X")],
            CoverageMetrics::new(80.0, 80.0, 80.0, 80.0),
        );
        let risks = SessionAnalyzer::new().analyze(&critical).risk_assessment;
        assert_eq!(risks.items.len(), 1);
        assert_eq!(risks.items[0].level, RiskLevel::Critical);
        assert_eq!(risks.overall_level, RiskLevel::Critical);

        let mut results: Vec<TestResult> = (0..7).map(|i| TestResult::passed(format!("p{}", i), 1500)).collect();
        results.extend((0..3).map(|i| failed_in(&format!("f{}", i), "X")));
        let high = completed(results, CoverageMetrics::new(40.0, 40.0, 40.0, 40.0));
        let risks = SessionAnalyzer::new().analyze(&high).risk_assessment;
        assert_eq!(risks.high_count, 2);
        assert_eq!(risks.medium_count, 1);
        assert_eq!(risks.critical_count, 0);
        assert_eq!(risks.overall_level, RiskLevel::High);
        assert_eq!(risks.items[0].category, "Test Pass Rate");
        assert_eq!(risks.items[1].category, "Code Coverage");
        assert_eq!(risks.items[2].category, "Test Performance");
    }

    #[test]
    fn test_performance_insights() {
        let session = completed(
            vec![
                TestResult::passed("quick", 5),
                TestResult::passed("slow", 1200),
                TestResult::passed("glacial", 6000),
                TestResult::passed("also_quick", 5),
            ],
            CoverageMetrics::default(),
        );

        let insights = SessionAnalyzer::new().analyze(&session).performance_insights;
        assert_eq!(insights.total_tests, 4);
        assert_eq!(insights.total_execution_time_ms, 7210);
        assert_eq!(insights.fastest_test.unwrap().name, "quick");
        assert_eq!(insights.slowest_test.unwrap().name, "glacial");
        assert_eq!(
            insights.issues,
            vec![
                "Average test duration is too high (1802.50 ms)".to_string(),
                "2 test(s) took longer than 1000 ms".to_string(),
                "1 test(s) took longer than 5000 ms and need optimization".to_string(),
            ]
        );
    }

    #[test]
    fn test_slowest_list_is_bounded_and_sorted() {
        let results: Vec<TestResult> =
            (1..=15).map(|i| TestResult::passed(format!("t{}", i), i * 10)).collect();
        let session = completed(results, CoverageMetrics::default());

        let analyzer = SessionAnalyzer::new();
        let slowest = analyzer.analyze(&session).key_metrics.slowest_tests;
        assert_eq!(slowest.len(), 10);
        assert_eq!(slowest[0].name, "t15");
        assert_eq!(slowest[9].name, "t6");

        let short = SessionAnalyzer::new().with_config(AnalysisConfig {
            slowest_tests_len: 3,
            ..Default::default()
        });
        assert_eq!(short.analyze(&session).key_metrics.slowest_tests.len(), 3);
    }

    #[test]
    fn test_active_session_is_analysed_on_a_copy() {
        let mut session = TestSession::new("live", "", "");
        session.status = SessionStatus::Running;
        session.results.push(TestResult::passed("a", 10));

        let analysis = SessionAnalyzer::new().analyze(&session);
        assert_eq!(analysis.key_metrics.total_tests, 1);
        assert_eq!(analysis.key_metrics.pass_rate, 100.0);
        assert_eq!(session.stats.total, 0);
    }

    #[test]
    fn test_empty_session() {
        let analysis = SessionAnalyzer::new().analyze(&completed(Vec::new(), CoverageMetrics::default()));
        assert_eq!(analysis.health_score, 0.0);
        assert_eq!(analysis.overall_health, HealthStatus::Critical);
        assert_eq!(analysis.key_metrics.average_test_duration_ms, 0.0);
        assert!(analysis.performance_insights.fastest_test.is_none());
        assert!(analysis.performance_insights.issues.is_empty());
    }

    #[test]
    fn test_trend_provider_and_recorder() {
        let recorder = Arc::new(MemoryRecorder::new());
        let analyzer = SessionAnalyzer::new()
            .with_trend_provider(HistoricalTrends::new(vec![TrendSample {
                pass_rate: 50.0,
                coverage: 0.0,
                average_duration_ms: 10.0,
                error_rate: 50.0,
            }]))
            .with_recorder(recorder.clone());

        let session = completed(vec![TestResult::passed("a", 10)], CoverageMetrics::default());
        let analysis = analyzer.analyze(&session);
        assert_eq!(analysis.trend_analysis.pass_rate, TrendDirection::Improving);
        assert_eq!(analysis.trend_analysis.reliability, TrendDirection::Improving);
        assert_eq!(recorder.named("AnalyzeTestSession").len(), 1);
    }
}
