//! Analysis thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds used by the recommendation, risk and performance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pass rate (%) below which a recommendation and a `High` risk fire
    pub pass_rate_warning: f64,
    /// Pass rate (%) below which the risk is `Critical`
    pub pass_rate_critical: f64,
    /// Mean coverage (%) below which more tests are recommended
    pub coverage_recommendation: f64,
    /// Mean coverage (%) below which a `High` risk fires
    pub coverage_risk: f64,
    /// Mean test duration (ms) above which performance work is recommended
    pub slow_average_ms: f64,
    /// Mean test duration (ms) above which a `Medium` risk fires
    pub slow_average_risk_ms: f64,
    /// Duration (ms) above which a single test counts as slow
    pub slow_test_ms: u64,
    /// Duration (ms) above which a single test counts as very slow
    pub very_slow_test_ms: u64,
    /// Length of the slowest-tests list
    pub slowest_tests_len: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pass_rate_warning: 80.0,
            pass_rate_critical: 60.0,
            coverage_recommendation: 70.0,
            coverage_risk: 50.0,
            slow_average_ms: 500.0,
            slow_average_risk_ms: 1000.0,
            slow_test_ms: 1000,
            very_slow_test_ms: 5000,
            slowest_tests_len: 10,
        }
    }
}
