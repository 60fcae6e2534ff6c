//! Test session model - one bounded run of a test suite.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use crate::coverage::CoverageMetrics;
use crate::id::SessionId;
use crate::quality::QualityGateStatus;
use crate::result::{TestResult, TestStatus};
use crate::Time;

/// Session lifecycle: `Created -> Running -> {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    Created,
    Running,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Whether the session has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Created => "Created",
            SessionStatus::Running => "Running",
            SessionStatus::Completed => "Completed",
            SessionStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Aggregates derived from the recorded results.
///
/// `total == passed + failed + skipped` and `pass_rate` is in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// passed / total * 100, 0 when there are no results
    pub pass_rate: f64,
    /// Sum of per-result durations (ms)
    pub total_duration_ms: u64,
}

impl SessionStatistics {
    /// Compute aggregates over a result sequence.
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut stats = Self {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            match result.status {
                TestStatus::Passed => stats.passed += 1,
                TestStatus::Failed => stats.failed += 1,
                TestStatus::Skipped => stats.skipped += 1,
            }
            stats.total_duration_ms = stats.total_duration_ms.saturating_add(result.duration_ms);
        }
        stats.pass_rate = percentage(stats.passed, stats.total);
        stats
    }

    /// failed / total * 100, 0 when there are no results.
    pub fn error_rate(&self) -> f64 {
        percentage(self.failed, self.total)
    }

    /// Mean duration per result (ms), 0 when there are no results.
    pub fn average_duration_ms(&self) -> f64 {
        if self.total > 0 {
            self.total_duration_ms as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        part as f64 * 100.0 / total as f64
    } else {
        0.0
    }
}

/// The unit of work tracked by the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSession {
    /// Unique identifier
    pub id: SessionId,

    /// Human-readable name
    pub name: String,

    /// Project path (free-form)
    pub project_path: String,

    /// Solution path (free-form)
    pub solution_path: String,

    /// Build configuration the tests ran under
    pub build_configuration: String,

    /// Target framework the tests ran under
    pub target_framework: String,

    /// Stamped at creation and again when started
    pub started_at: Time,

    /// Unset while the session is active
    pub ended_at: Option<Time>,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Results in submission order
    pub results: Vec<TestResult>,

    /// Latest coverage snapshot
    pub coverage: CoverageMetrics,

    /// Gate outcomes attached to the session
    pub quality_gates: Vec<QualityGateStatus>,

    /// Aggregates, computed on completion or cancellation
    pub stats: SessionStatistics,
}

impl TestSession {
    /// Create a new session in `Created` state.
    pub fn new(
        name: impl Into<String>,
        project_path: impl Into<String>,
        solution_path: impl Into<String>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            name: name.into(),
            project_path: project_path.into(),
            solution_path: solution_path.into(),
            build_configuration: "Debug".to_string(),
            target_framework: String::new(),
            started_at: chrono::Utc::now(),
            ended_at: None,
            status: SessionStatus::Created,
            results: Vec::new(),
            coverage: CoverageMetrics::default(),
            quality_gates: Vec::new(),
            stats: SessionStatistics::default(),
        }
    }

    /// Recompute the aggregates from the recorded results.
    pub fn calculate_statistics(&mut self) -> SessionStatistics {
        self.stats = SessionStatistics::from_results(&self.results);
        self.stats
    }

    /// The session with up-to-date aggregates.
    ///
    /// Terminal sessions already carry them and are borrowed; an active
    /// session is copied and the copy gets fresh aggregates.
    pub fn with_current_statistics(&self) -> Cow<'_, TestSession> {
        if self.status.is_terminal() {
            Cow::Borrowed(self)
        } else {
            let mut copy = self.clone();
            copy.calculate_statistics();
            Cow::Owned(copy)
        }
    }

    /// Most recent activity: end time, or start time while active.
    pub fn last_activity(&self) -> Time {
        self.ended_at.unwrap_or(self.started_at)
    }

    /// Number of results per status.
    pub fn status_distribution(&self) -> BTreeMap<TestStatus, usize> {
        let mut distribution = BTreeMap::new();
        for result in &self.results {
            *distribution.entry(result.status).or_insert(0) += 1;
        }
        distribution
    }

    /// Results grouped by category tag, submission order kept per group.
    pub fn results_by_category(&self) -> BTreeMap<String, Vec<&TestResult>> {
        let mut groups: BTreeMap<String, Vec<&TestResult>> = BTreeMap::new();
        for result in &self.results {
            groups.entry(result.category.clone()).or_default().push(result);
        }
        groups
    }
}
