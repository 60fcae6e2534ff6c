//! Cross-session execution statistics.

use testwatch_core::Time;

/// Rollup across active and archived sessions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionStatistics {
    /// Active plus archived sessions
    pub total_sessions: usize,
    /// Sessions still in the active mapping
    pub active_sessions: usize,
    /// Sessions in the archive
    pub completed_sessions: usize,
    /// Results across all sessions
    pub total_tests: usize,
    /// Passed results across all sessions
    pub passed_tests: usize,
    /// Failed results across all sessions
    pub failed_tests: usize,
    /// Skipped results across all sessions
    pub skipped_tests: usize,
    /// Mean of the per-session pass rates
    pub average_pass_rate: f64,
    /// Summed result durations (ms)
    pub total_execution_time_ms: u64,
    /// Latest end time, or start time for running sessions
    pub last_activity: Option<Time>,
}
