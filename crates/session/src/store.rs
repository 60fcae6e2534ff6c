//! Session store - owns the lifecycle of test sessions.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use testwatch_core::{
    CoverageGrade, CoverageMetrics, OperationRecorder, QualityGateStatus, SessionId,
    SessionStatistics, SessionStatus, TestResult, TestResultId, TestSession, TestStatus, Time,
    TracingRecorder,
};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::export::{render_session, ReportFormat};
use crate::stats::ExecutionStatistics;

/// Default number of archived sessions kept by [`SessionStore::cleanup_old_sessions`] callers.
pub const DEFAULT_SESSIONS_TO_KEEP: usize = 100;

#[derive(Default)]
struct StoreState {
    active: HashMap<SessionId, TestSession>,
    completed: Vec<TestSession>,
}

impl StoreState {
    fn active_mut(&mut self, id: SessionId) -> Result<&mut TestSession> {
        self.active.get_mut(&id).ok_or(SessionError::NotFound(id))
    }

    fn find(&self, id: SessionId) -> Option<&TestSession> {
        self.active
            .get(&id)
            .or_else(|| self.completed.iter().find(|s| s.id == id))
    }
}

/// Thread-safe store of active and archived test sessions.
///
/// Every operation runs under a single store-wide lock, so read-modify-write
/// sequences on a session are atomic with respect to other callers.
pub struct SessionStore {
    state: Mutex<StoreState>,
    recorder: Arc<dyn OperationRecorder>,
}

impl SessionStore {
    /// Create a new store reporting to `tracing`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            recorder: Arc::new(TracingRecorder),
        }
    }

    /// Set the operation recorder.
    pub fn with_recorder(mut self, recorder: Arc<dyn OperationRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // Every mutation leaves the state consistent before it can panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a session in `Created` state and register it as active.
    pub fn create_session(
        &self,
        name: impl Into<String>,
        project_path: impl Into<String>,
        solution_path: impl Into<String>,
    ) -> TestSession {
        let session = TestSession::new(name, project_path, solution_path);
        self.state().active.insert(session.id, session.clone());

        info!("Created test session {} ({})", session.id, session.name);
        self.recorder.record_operation("CreateTestSession", 0.0, true, None);
        session
    }

    /// Set build configuration and target framework on an active session.
    pub fn set_build_info(
        &self,
        id: SessionId,
        build_configuration: impl Into<String>,
        target_framework: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state();
        let session = state.active_mut(id)?;
        session.build_configuration = build_configuration.into();
        session.target_framework = target_framework.into();
        Ok(())
    }

    /// Move a session to `Running` and stamp its start time.
    ///
    /// Starting a running session keeps it running and re-stamps the start time.
    pub fn start_session(&self, id: SessionId) -> Result<()> {
        {
            let mut state = self.state();
            let session = state.active_mut(id)?;
            session.status = SessionStatus::Running;
            session.started_at = chrono::Utc::now();
        }

        info!("Started test session {}", id);
        self.recorder.record_operation("StartTestSession", 0.0, true, None);
        Ok(())
    }

    /// Append a result to a running session, assigning it a fresh id.
    pub fn record_result(&self, id: SessionId, mut result: TestResult) -> Result<TestResultId> {
        let result_id = TestResultId::new();
        result.id = result_id;
        let operation = result.operation_name();
        let duration_ms = result.duration_ms as f64;
        let success = result.status == TestStatus::Passed;
        let error = result.error_message.clone();

        {
            let mut state = self.state();
            let session = state.active_mut(id)?;
            if session.status != SessionStatus::Running {
                return Err(SessionError::InvalidState {
                    id,
                    status: session.status,
                    operation: "record a result on",
                });
            }
            session.results.push(result);
        }

        debug!("Recorded result {} on session {}", result_id, id);
        self.recorder
            .record_operation(&operation, duration_ms, success, error.as_deref());
        Ok(result_id)
    }

    /// Replace the coverage snapshot of an active session. Last write wins.
    pub fn update_coverage(&self, id: SessionId, mut metrics: CoverageMetrics) -> Result<CoverageGrade> {
        let grade = metrics.calculate_grade();
        self.state().active_mut(id)?.coverage = metrics;

        debug!("Updated coverage on session {} (grade {})", id, grade);
        self.recorder.record_operation("UpdateCoverageMetrics", 0.0, true, None);
        Ok(grade)
    }

    /// Append gate outcomes to an active session.
    pub fn attach_gate_results(&self, id: SessionId, statuses: &[QualityGateStatus]) -> Result<()> {
        self.state()
            .active_mut(id)?
            .quality_gates
            .extend_from_slice(statuses);
        debug!("Attached {} gate outcomes to session {}", statuses.len(), id);
        Ok(())
    }

    /// Complete an active session and move it to the archive.
    pub fn complete_session(&self, id: SessionId) -> Result<TestSession> {
        let session = self.finish(id, SessionStatus::Completed)?;
        let elapsed = elapsed_ms(&session);

        info!(
            "Completed test session {}: {}/{} passed",
            id, session.stats.passed, session.stats.total
        );
        self.recorder.record_operation("CompleteTestSession", elapsed, true, None);
        Ok(session)
    }

    /// Cancel an active session and move it to the archive.
    pub fn cancel_session(&self, id: SessionId) -> Result<TestSession> {
        let session = self.finish(id, SessionStatus::Cancelled)?;
        let elapsed = elapsed_ms(&session);

        info!("Cancelled test session {}", id);
        self.recorder.record_operation(
            "CancelTestSession",
            elapsed,
            false,
            Some("test session cancelled"),
        );
        Ok(session)
    }

    fn finish(&self, id: SessionId, status: SessionStatus) -> Result<TestSession> {
        let mut state = self.state();
        let Some(mut session) = state.active.remove(&id) else {
            warn!("Cannot finish unknown test session {}", id);
            return Err(SessionError::NotFound(id));
        };

        session.ended_at = Some(chrono::Utc::now());
        session.status = status;
        session.calculate_statistics();

        state.completed.push(session.clone());
        Ok(session)
    }

    /// Get an active session.
    pub fn get_active_session(&self, id: SessionId) -> Option<TestSession> {
        self.state().active.get(&id).cloned()
    }

    /// Get an active or archived session.
    pub fn get_session(&self, id: SessionId) -> Result<TestSession> {
        self.state()
            .find(id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Copy of an active or archived session with aggregates computed on the copy.
    ///
    /// The stored session is left untouched, so gates and analysis can run
    /// against an in-flight session.
    pub fn snapshot(&self, id: SessionId) -> Result<TestSession> {
        let mut session = self.get_session(id)?;
        if !session.status.is_terminal() {
            session.calculate_statistics();
        }
        Ok(session)
    }

    /// All active sessions, oldest first.
    pub fn list_active_sessions(&self) -> Vec<TestSession> {
        let mut sessions: Vec<TestSession> = self.state().active.values().cloned().collect();
        sessions.sort_by_key(|s| (s.started_at, s.id));
        sessions
    }

    /// All archived sessions in archival order.
    pub fn list_completed_sessions(&self) -> Vec<TestSession> {
        self.state().completed.clone()
    }

    /// Status of a session.
    ///
    /// An id the store has never seen reports `Created` instead of failing,
    /// so polling callers can ask before the session exists.
    pub fn session_status(&self, id: SessionId) -> SessionStatus {
        self.state()
            .find(id)
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Created)
    }

    /// Rollup across active and archived sessions.
    pub fn execution_statistics(&self) -> ExecutionStatistics {
        let state = self.state();

        // Active sessions have no stored aggregates yet.
        let active = state
            .active
            .values()
            .map(|s| (SessionStatistics::from_results(&s.results), s.last_activity()));
        let completed = state.completed.iter().map(|s| (s.stats, s.last_activity()));
        let all: Vec<(SessionStatistics, Time)> = active.chain(completed).collect();

        let mut rollup = ExecutionStatistics {
            total_sessions: all.len(),
            active_sessions: state.active.len(),
            completed_sessions: state.completed.len(),
            ..Default::default()
        };
        for (stats, activity) in &all {
            rollup.total_tests += stats.total;
            rollup.passed_tests += stats.passed;
            rollup.failed_tests += stats.failed;
            rollup.skipped_tests += stats.skipped;
            rollup.total_execution_time_ms =
                rollup.total_execution_time_ms.saturating_add(stats.total_duration_ms);
            rollup.last_activity = rollup.last_activity.max(Some(*activity));
        }
        if !all.is_empty() {
            rollup.average_pass_rate =
                all.iter().map(|(stats, _)| stats.pass_rate).sum::<f64>() / all.len() as f64;
        }
        rollup
    }

    /// Trim the archive to at most `keep` sessions, evicting the oldest by end time.
    ///
    /// Returns the number of evicted sessions.
    pub fn cleanup_old_sessions(&self, keep: usize) -> usize {
        let mut state = self.state();
        let excess = state.completed.len().saturating_sub(keep);
        if excess == 0 {
            return 0;
        }

        let mut by_age: Vec<(Option<Time>, SessionId)> =
            state.completed.iter().map(|s| (s.ended_at, s.id)).collect();
        by_age.sort_by_key(|(ended_at, _)| *ended_at);
        let evicted: HashSet<SessionId> = by_age.into_iter().take(excess).map(|(_, id)| id).collect();

        state.completed.retain(|s| !evicted.contains(&s.id));
        info!("Evicted {} archived test sessions", evicted.len());
        evicted.len()
    }

    /// Render an active or archived session as a text report.
    pub fn export_session_data(&self, id: SessionId) -> Result<String> {
        self.export_session_as(id, ReportFormat::Text)
    }

    /// Render an active or archived session in the given format.
    pub fn export_session_as(&self, id: SessionId, format: ReportFormat) -> Result<String> {
        let state = self.state();
        let session = state.find(id).ok_or(SessionError::NotFound(id))?;
        render_session(session, format)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(session: &TestSession) -> f64 {
    session
        .ended_at
        .map(|end| (end - session.started_at).num_milliseconds() as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use testwatch_core::{
        ComparisonOperator, GateOutcome, MemoryRecorder, QualityGateDefinition, QualityGateType,
        RiskLevel,
    };

    fn store_with_recorder() -> (SessionStore, Arc<MemoryRecorder>) {
        let recorder = Arc::new(MemoryRecorder::new());
        let store = SessionStore::new().with_recorder(recorder.clone());
        (store, recorder)
    }

    fn running_session(store: &SessionStore) -> SessionId {
        let id = store.create_session("S1", "/proj", "/proj/app.sln").id;
        store.start_session(id).unwrap();
        id
    }

    #[test]
    fn test_create_registers_active_session() {
        let (store, recorder) = store_with_recorder();
        let session = store.create_session("S1", "/proj", "/proj/app.sln");

        assert_eq!(session.status, SessionStatus::Created);
        assert!(store.get_active_session(session.id).is_some());
        assert_eq!(store.list_active_sessions().len(), 1);
        assert_eq!(recorder.named("CreateTestSession").len(), 1);
    }

    #[test]
    fn test_start_unknown_session_is_not_found() {
        let store = SessionStore::new();
        let id = SessionId::new();
        assert_eq!(store.start_session(id), Err(SessionError::NotFound(id)));
    }

    #[test]
    fn test_double_start_restamps_start_time() {
        let store = SessionStore::new();
        let id = running_session(&store);
        let first = store.get_active_session(id).unwrap().started_at;

        store.start_session(id).unwrap();
        let session = store.get_active_session(id).unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert!(session.started_at >= first);
    }

    #[test]
    fn test_record_result_appends_and_reassigns_id() {
        let (store, recorder) = store_with_recorder();
        let id = running_session(&store);
        let submitted = TestResult::failed("parses", 15, "bad header").with_category("Xml");
        let submitted_id = submitted.id;

        let assigned = store.record_result(id, submitted).unwrap();
        let session = store.get_active_session(id).unwrap();

        assert_eq!(session.results.len(), 1);
        assert_eq!(session.results[0].id, assigned);
        assert_ne!(assigned, submitted_id);

        let ops = recorder.named("Test_Unit_Xml");
        assert_eq!(ops.len(), 1);
        assert!(!ops[0].success);
        assert_eq!(ops[0].duration_ms, 15.0);
        assert_eq!(ops[0].error.as_deref(), Some("bad header"));
    }

    #[test]
    fn test_record_result_requires_running_session() {
        let store = SessionStore::new();
        let id = store.create_session("S1", "", "").id;

        let err = store.record_result(id, TestResult::passed("t", 1)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { status: SessionStatus::Created, .. }));
        assert!(store.get_active_session(id).unwrap().results.is_empty());
    }

    #[test]
    fn test_record_result_on_finished_session_is_not_found() {
        let store = SessionStore::new();
        let id = running_session(&store);
        store.complete_session(id).unwrap();

        let err = store.record_result(id, TestResult::passed("t", 1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_results_keep_submission_order() {
        let store = SessionStore::new();
        let id = running_session(&store);
        for i in 0..5 {
            store.record_result(id, TestResult::passed(format!("t{}", i), i)).unwrap();
        }
        let names: Vec<String> = store
            .get_active_session(id)
            .unwrap()
            .results
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["t0", "t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_update_coverage_last_write_wins() {
        let store = SessionStore::new();
        let id = store.create_session("S1", "", "").id;

        store.update_coverage(id, CoverageMetrics::new(10.0, 10.0, 10.0, 10.0)).unwrap();
        let grade = store.update_coverage(id, CoverageMetrics::new(95.0, 92.0, 90.0, 91.0)).unwrap();

        assert_eq!(grade, CoverageGrade::A);
        let coverage = store.get_active_session(id).unwrap().coverage;
        assert_eq!(coverage.line, 95.0);
        assert_eq!(coverage.grade, CoverageGrade::A);
    }

    #[test]
    fn test_update_coverage_unknown_session() {
        let store = SessionStore::new();
        let err = store
            .update_coverage(SessionId::new(), CoverageMetrics::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_complete_computes_aggregates_and_archives() {
        let (store, recorder) = store_with_recorder();
        let id = running_session(&store);
        store.record_result(id, TestResult::passed("a", 10)).unwrap();
        store.record_result(id, TestResult::failed("b", 20, "x")).unwrap();
        store.record_result(id, TestResult::skipped("c")).unwrap();

        let session = store.complete_session(id).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.ended_at.is_some());
        assert_eq!(session.stats.total, 3);
        assert_eq!(session.stats.total, session.stats.passed + session.stats.failed + session.stats.skipped);
        assert!((session.stats.pass_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(session.stats.total_duration_ms, 30);

        assert!(store.get_active_session(id).is_none());
        assert_eq!(store.list_completed_sessions().len(), 1);
        assert_eq!(store.session_status(id), SessionStatus::Completed);
        assert_eq!(recorder.named("CompleteTestSession").len(), 1);
    }

    #[test]
    fn test_cancel_records_failed_operation() {
        let (store, recorder) = store_with_recorder();
        let id = running_session(&store);

        let session = store.cancel_session(id).unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        assert_eq!(session.stats.pass_rate, 0.0);

        let ops = recorder.named("CancelTestSession");
        assert_eq!(ops.len(), 1);
        assert!(!ops[0].success);
        assert_eq!(ops[0].error.as_deref(), Some("test session cancelled"));
    }

    #[test]
    fn test_finishing_twice_is_not_found() {
        let store = SessionStore::new();
        let id = running_session(&store);
        store.complete_session(id).unwrap();

        assert!(store.complete_session(id).unwrap_err().is_not_found());
        assert!(store.cancel_session(id).unwrap_err().is_not_found());
        assert_eq!(store.list_completed_sessions().len(), 1);
    }

    #[test]
    fn test_unknown_status_is_created_sentinel() {
        let store = SessionStore::new();
        assert_eq!(store.session_status(SessionId::new()), SessionStatus::Created);
    }

    #[test]
    fn test_snapshot_computes_without_mutating() {
        let store = SessionStore::new();
        let id = running_session(&store);
        store.record_result(id, TestResult::passed("a", 10)).unwrap();

        let snapshot = store.snapshot(id).unwrap();
        assert_eq!(snapshot.stats.total, 1);
        assert_eq!(snapshot.stats.pass_rate, 100.0);
        assert_eq!(store.get_active_session(id).unwrap().stats.total, 0);
    }

    #[test]
    fn test_attach_gate_results() {
        let store = SessionStore::new();
        let id = running_session(&store);
        let gate = QualityGateDefinition {
            id: "g".into(),
            name: "Gate".into(),
            description: String::new(),
            gate_type: QualityGateType::TestPassRate,
            threshold: 80.0,
            operator: ComparisonOperator::GreaterThanOrEqual,
            severity: RiskLevel::High,
            enabled: true,
            failure_message: String::new(),
            success_message: String::new(),
        };
        let mut status = QualityGateStatus::checking(&gate);
        status.status = GateOutcome::Failed;

        store.attach_gate_results(id, &[status]).unwrap();
        let session = store.complete_session(id).unwrap();
        assert_eq!(session.quality_gates.len(), 1);
        assert!(store.attach_gate_results(id, &[]).unwrap_err().is_not_found());
    }

    #[test]
    fn test_execution_statistics_rollup() {
        let store = SessionStore::new();
        let first = running_session(&store);
        store.record_result(first, TestResult::passed("a", 10)).unwrap();
        store.record_result(first, TestResult::failed("b", 30, "x")).unwrap();
        store.complete_session(first).unwrap();

        let second = running_session(&store);
        store.record_result(second, TestResult::passed("c", 5)).unwrap();

        let stats = store.execution_statistics();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.passed_tests, 2);
        assert_eq!(stats.failed_tests, 1);
        assert_eq!(stats.total_execution_time_ms, 45);
        assert!((stats.average_pass_rate - 75.0).abs() < 1e-9);

        let running = store.get_active_session(second).unwrap();
        assert_eq!(stats.last_activity, Some(running.started_at.max(
            store.get_session(first).unwrap().ended_at.unwrap(),
        )));
    }

    #[test]
    fn test_execution_time_rollup_saturates() {
        let store = SessionStore::new();
        for name in ["first", "second"] {
            let id = running_session(&store);
            store.record_result(id, TestResult::passed(name, u64::MAX)).unwrap();
            store.complete_session(id).unwrap();
        }
        let active = running_session(&store);
        store.record_result(active, TestResult::passed("third", u64::MAX)).unwrap();

        let stats = store.execution_statistics();
        assert_eq!(stats.total_execution_time_ms, u64::MAX);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.passed_tests, 3);
    }

    #[test]
    fn test_execution_statistics_empty_store() {
        let stats = SessionStore::new().execution_statistics();
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.average_pass_rate, 0.0);
        assert!(stats.last_activity.is_none());
    }

    #[test]
    fn test_cleanup_keeps_most_recently_ended() {
        let store = SessionStore::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let id = running_session(&store);
            store.complete_session(id).unwrap();
            ids.push(id);
        }
        // Force distinct, out-of-order end times.
        {
            let mut state = store.state();
            let base = chrono::Utc::now();
            let offsets = [40, 10, 50, 20, 30];
            for (session, offset) in state.completed.iter_mut().zip(offsets) {
                session.ended_at = Some(base + chrono::Duration::seconds(offset));
            }
        }

        let evicted = store.cleanup_old_sessions(2);
        assert_eq!(evicted, 3);
        let kept: Vec<SessionId> = store.list_completed_sessions().iter().map(|s| s.id).collect();
        assert_eq!(kept, vec![ids[0], ids[2]]);
    }

    #[test]
    fn test_cleanup_under_limit_is_noop() {
        let store = SessionStore::new();
        let id = running_session(&store);
        store.complete_session(id).unwrap();
        assert_eq!(store.cleanup_old_sessions(DEFAULT_SESSIONS_TO_KEEP), 0);
        assert_eq!(store.list_completed_sessions().len(), 1);
    }

    #[test]
    fn test_export_unknown_session_fails() {
        let store = SessionStore::new();
        assert!(store.export_session_data(SessionId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_export_in_each_format() {
        let store = SessionStore::new();
        let id = running_session(&store);
        store.record_result(id, TestResult::passed("a", 10)).unwrap();
        store.record_result(id, TestResult::failed("b", 30, "x")).unwrap();

        let markdown = store.export_session_as(id, ReportFormat::Markdown).unwrap();
        assert!(markdown.contains("| Total Tests | 2 |"));
        assert!(markdown.contains("| Status | Running |"));

        store.complete_session(id).unwrap();
        let json = store.export_session_as(id, ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "Completed");
        assert_eq!(value["stats"]["passed"], 1);

        let text = store.export_session_as(id, ReportFormat::Text).unwrap();
        assert_eq!(text, store.export_session_data(id).unwrap());
        assert!(store
            .export_session_as(SessionId::new(), ReportFormat::Json)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_concurrent_recording_keeps_every_result() {
        let store = SessionStore::new();
        let id = running_session(&store);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..25 {
                        let result = if i % 5 == 0 {
                            TestResult::failed(format!("w{}-{}", worker, i), 1, "x")
                        } else {
                            TestResult::passed(format!("w{}-{}", worker, i), 1)
                        };
                        store.record_result(id, result).unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..50 {
                    assert_eq!(store.session_status(id), SessionStatus::Running);
                }
            });
        });

        let session = store.complete_session(id).unwrap();
        assert_eq!(session.results.len(), 200);
        assert_eq!(session.stats.failed, 40);
        assert_eq!(
            session.results.iter().filter(|r| r.status == TestStatus::Passed).count(),
            160
        );
    }
}
