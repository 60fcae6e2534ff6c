//! Analysis output records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use testwatch_core::{CoverageMetrics, RiskLevel, SessionId, TestResult, Time};

/// Weight of the pass rate in the health score.
pub const PASS_RATE_WEIGHT: f64 = 0.6;

/// Weight of the mean coverage in the health score.
pub const COVERAGE_WEIGHT: f64 = 0.4;

/// Weighted score the health status is bucketed from.
pub fn health_score(pass_rate: f64, coverage_mean: f64) -> f64 {
    pass_rate * PASS_RATE_WEIGHT + coverage_mean * COVERAGE_WEIGHT
}

/// Five-level classification of a session's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Score >= 90
    Excellent,
    /// Score >= 80
    Good,
    /// Score >= 70
    Fair,
    /// Score >= 60
    Poor,
    /// Score < 60
    Critical,
}

impl HealthStatus {
    /// Bucket a health score.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthStatus::Excellent
        } else if score >= 80.0 {
            HealthStatus::Good
        } else if score >= 70.0 {
            HealthStatus::Fair
        } else if score >= 60.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
            HealthStatus::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Headline numbers of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    /// Pass rate (%)
    pub pass_rate: f64,
    /// Number of results
    pub total_tests: usize,
    /// Number of failed results
    pub failed_tests: usize,
    /// Number of skipped results
    pub skipped_tests: usize,
    /// Mean result duration (ms)
    pub average_test_duration_ms: f64,
    /// Sum of result durations (ms)
    pub total_execution_time_ms: u64,
    /// Coverage snapshot
    pub coverage: CoverageMetrics,
    /// Failure count per category
    pub error_categories: BTreeMap<String, usize>,
    /// Slowest results, longest first
    pub slowest_tests: Vec<TestResult>,
    /// Attached gate outcomes that passed
    pub quality_gates_passed: usize,
    /// Attached gate outcomes that failed
    pub quality_gates_failed: usize,
    /// Attached gate outcomes that could not be evaluated
    pub quality_gates_errored: usize,
}

/// Direction a metric moved across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrendDirection {
    /// No significant movement, or not enough history to tell
    #[default]
    Stable,
    /// Moved in the good direction
    Improving,
    /// Moved in the bad direction
    Declining,
    /// Moved back and forth
    Fluctuating,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrendDirection::Stable => "Stable",
            TrendDirection::Improving => "Improving",
            TrendDirection::Declining => "Declining",
            TrendDirection::Fluctuating => "Fluctuating",
        };
        f.write_str(s)
    }
}

/// Trends of the headline metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    /// Pass rate
    pub pass_rate: TrendDirection,
    /// Mean coverage
    pub coverage: TrendDirection,
    /// Mean test duration
    pub performance: TrendDirection,
    /// Error rate
    pub reliability: TrendDirection,
    /// Free-form notes
    pub notes: Vec<String>,
}

/// One triggered risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    /// Severity
    pub level: RiskLevel,
    /// Area the risk belongs to
    pub category: String,
    /// What was observed
    pub description: String,
    /// What it may cause
    pub impact: String,
    /// What to do about it
    pub recommendation: String,
}

/// All triggered risks and their summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Highest level among `items`, `Low` when there are none
    pub overall_level: RiskLevel,
    /// Triggered risks in rule order
    pub items: Vec<RiskItem>,
    /// Number of critical items
    pub critical_count: usize,
    /// Number of high items
    pub high_count: usize,
    /// Number of medium items
    pub medium_count: usize,
    /// Number of low items
    pub low_count: usize,
}

impl RiskAssessment {
    /// Summarize a list of items.
    pub fn from_items(items: Vec<RiskItem>) -> Self {
        let count = |level: RiskLevel| items.iter().filter(|i| i.level == level).count();
        Self {
            overall_level: items.iter().map(|i| i.level).max().unwrap_or_default(),
            critical_count: count(RiskLevel::Critical),
            high_count: count(RiskLevel::High),
            medium_count: count(RiskLevel::Medium),
            low_count: count(RiskLevel::Low),
            items,
        }
    }

    /// Number of triggered items.
    pub fn total_count(&self) -> usize {
        self.items.len()
    }
}

/// Duration profile of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    /// Number of results
    pub total_tests: usize,
    /// Sum of result durations (ms)
    pub total_execution_time_ms: u64,
    /// Mean result duration (ms)
    pub average_test_duration_ms: f64,
    /// Quickest result
    pub fastest_test: Option<TestResult>,
    /// Slowest result
    pub slowest_test: Option<TestResult>,
    /// Triggered performance warnings
    pub issues: Vec<String>,
}

/// Everything the analyzer derives from one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSessionAnalysis {
    /// Analysed session
    pub session_id: SessionId,
    /// Its name
    pub session_name: String,
    /// When the analysis ran
    pub analyzed_at: Time,
    /// Weighted pass-rate/coverage score
    pub health_score: f64,
    /// Bucketed score
    pub overall_health: HealthStatus,
    /// Headline numbers
    pub key_metrics: KeyMetrics,
    /// Trends against earlier sessions
    pub trend_analysis: TrendAnalysis,
    /// Suggestions in rule order
    pub recommendations: Vec<String>,
    /// Triggered risks
    pub risk_assessment: RiskAssessment,
    /// Duration profile
    pub performance_insights: PerformanceInsights,
}
