//! Quality gate engine.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use testwatch_core::{
    GateOutcome, OperationRecorder, QualityGateDefinition, QualityGateStatus, QualityGateType,
    SessionId, TestSession, Time, TracingRecorder,
};
use tracing::{debug, warn};

use crate::config::{export_gates, validate_gates};
use crate::defaults::default_gates;
use crate::error::{EvaluationError, GateError, Result};
use crate::message::render_message;
use crate::registry::GateRegistry;

/// Result of checking every enabled gate against one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateCheckResult {
    /// Session the gates were checked against
    pub session_id: SessionId,

    /// When the check ran
    pub checked_at: Time,

    /// One status per enabled gate, ordered by gate id
    pub gate_statuses: Vec<QualityGateStatus>,

    /// `Failed` if any gate failed, otherwise `Passed`.
    ///
    /// `Error` gates do not affect this; see [`Self::error_gates`].
    pub overall_status: GateOutcome,
}

impl QualityGateCheckResult {
    /// Whether the overall status is `Passed`.
    pub fn all_passed(&self) -> bool {
        self.overall_status == GateOutcome::Passed
    }

    /// Number of passed gates.
    pub fn passed_gates(&self) -> usize {
        self.count(GateOutcome::Passed)
    }

    /// Number of failed gates.
    pub fn failed_gates(&self) -> usize {
        self.count(GateOutcome::Failed)
    }

    /// Number of gates that could not be evaluated.
    pub fn error_gates(&self) -> usize {
        self.count(GateOutcome::Error)
    }

    /// Whether a deployment should be blocked: any gate failed or errored.
    pub fn blocks_deployment(&self) -> bool {
        self.failed_gates() > 0 || self.error_gates() > 0
    }

    fn count(&self, outcome: GateOutcome) -> usize {
        self.gate_statuses.iter().filter(|g| g.status == outcome).count()
    }
}

/// Registry of gate definitions and their evaluation against sessions.
///
/// Registry reads and writes share one engine-wide lock. Evaluation copies
/// the enabled definitions and releases the lock before touching the session.
pub struct QualityGateEngine {
    registry: Mutex<GateRegistry>,
    recorder: Arc<dyn OperationRecorder>,
}

impl std::fmt::Debug for QualityGateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityGateEngine")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl QualityGateEngine {
    /// Create an engine seeded with the default gates.
    pub fn new() -> Self {
        let mut registry = GateRegistry::new();
        for gate in default_gates() {
            registry.register(gate);
        }
        Self::with_registry(registry)
    }

    /// Create an engine with no gates.
    pub fn empty() -> Self {
        Self::with_registry(GateRegistry::new())
    }

    fn with_registry(registry: GateRegistry) -> Self {
        Self {
            registry: Mutex::new(registry),
            recorder: Arc::new(TracingRecorder),
        }
    }

    /// Set the operation recorder.
    pub fn with_recorder(mut self, recorder: Arc<dyn OperationRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub(crate) fn registry(&self) -> MutexGuard<'_, GateRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record(&self, operation: &str) {
        self.recorder.record_operation(operation, 0.0, true, None);
    }

    /// Check every enabled gate against the session.
    pub fn check_quality_gates(&self, session: &TestSession) -> QualityGateCheckResult {
        let start = Instant::now();
        let gates: Vec<QualityGateDefinition> =
            self.registry().enabled().into_iter().cloned().collect();

        let session = session.with_current_statistics();
        let gate_statuses: Vec<QualityGateStatus> = gates
            .iter()
            .map(|gate| evaluate_current(gate, &session))
            .collect();

        let overall_status = if gate_statuses.iter().any(|g| g.status == GateOutcome::Failed) {
            GateOutcome::Failed
        } else {
            GateOutcome::Passed
        };

        let result = QualityGateCheckResult {
            session_id: session.id,
            checked_at: chrono::Utc::now(),
            gate_statuses,
            overall_status,
        };

        debug!(
            "Checked {} gates on session {}: {} passed, {} failed, {} errors",
            gates.len(),
            session.id,
            result.passed_gates(),
            result.failed_gates(),
            result.error_gates()
        );
        self.recorder.record_operation(
            "CheckQualityGates",
            start.elapsed().as_secs_f64() * 1000.0,
            true,
            None,
        );
        result
    }

    /// Add a gate, replacing any gate with the same id.
    pub fn add_gate(&self, gate: QualityGateDefinition) {
        debug!("Adding quality gate {}", gate.id);
        self.registry().register(gate);
        self.record("AddQualityGate");
    }

    /// Apply `update` to the gate registered under `id`.
    ///
    /// The update may change the id, but not to the id of another gate.
    pub fn update_gate<F>(&self, id: &str, update: F) -> Result<()>
    where
        F: FnOnce(&mut QualityGateDefinition),
    {
        {
            let mut registry = self.registry();
            let mut gate = registry
                .get(id)
                .cloned()
                .ok_or_else(|| GateError::NotFound(id.to_string()))?;
            update(&mut gate);
            if gate.id != id && registry.contains(&gate.id) {
                return Err(GateError::Config(format!(
                    "cannot rename gate '{}' to '{}': id already in use",
                    id, gate.id
                )));
            }
            registry.unregister(id);
            registry.register(gate);
        }
        self.record("UpdateQualityGate");
        Ok(())
    }

    /// Remove the gate registered under `id`.
    pub fn remove_gate(&self, id: &str) -> Result<QualityGateDefinition> {
        let removed = self
            .registry()
            .unregister(id)
            .ok_or_else(|| GateError::NotFound(id.to_string()))?;
        self.record("RemoveQualityGate");
        Ok(removed)
    }

    /// Enable or disable a gate.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        self.update_gate(id, |gate| gate.enabled = enabled)
    }

    /// Get a gate definition.
    pub fn get_gate(&self, id: &str) -> Option<QualityGateDefinition> {
        self.registry().get(id).cloned()
    }

    /// All gate definitions, ordered by id.
    pub fn list_gates(&self) -> Vec<QualityGateDefinition> {
        self.registry().list().into_iter().cloned().collect()
    }

    /// Enabled gate definitions, ordered by id.
    pub fn list_enabled_gates(&self) -> Vec<QualityGateDefinition> {
        self.registry().enabled().into_iter().cloned().collect()
    }

    /// Gate definitions of one type.
    pub fn find_by_type(&self, gate_type: &QualityGateType) -> Vec<QualityGateDefinition> {
        self.registry().find_by_type(gate_type).into_iter().cloned().collect()
    }

    /// Human-readable configuration problems; empty when the configuration is sound.
    pub fn validate_configuration(&self) -> Vec<String> {
        validate_gates(&self.registry().list())
    }

    /// Deterministic text dump of every registered gate.
    pub fn export_configuration(&self) -> String {
        export_gates(&self.registry().list())
    }
}

impl Default for QualityGateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate one definition against a session snapshot.
///
/// Aggregates of an active session are computed on a copy first. Never
/// fails: a gate that cannot be evaluated yields an `Error` status.
pub fn evaluate_gate(gate: &QualityGateDefinition, session: &TestSession) -> QualityGateStatus {
    evaluate_current(gate, &session.with_current_statistics())
}

/// `session` must carry up-to-date aggregates.
fn evaluate_current(gate: &QualityGateDefinition, session: &TestSession) -> QualityGateStatus {
    let mut status = QualityGateStatus::checking(gate);

    match extract_metric(&gate.gate_type, session) {
        Ok(current_value) => {
            let passed = gate.operator.holds(current_value, gate.threshold);
            status.current_value = current_value;
            status.status = if passed { GateOutcome::Passed } else { GateOutcome::Failed };
            status.message = gate_message(gate, current_value, passed);
            status.details = render_details(gate, session, current_value);
        }
        Err(err) => {
            warn!("Quality gate {} could not be evaluated: {}", gate.id, err);
            status.status = GateOutcome::Error;
            status.message = format!("Error while checking quality gate: {}", err);
            status.details = error_details(&err);
        }
    }

    status
}

/// Extract the metric a gate type is evaluated against.
///
/// Reads the stored aggregates; see [`TestSession::with_current_statistics`]
/// for sessions that are still active.
pub fn extract_metric(
    gate_type: &QualityGateType,
    session: &TestSession,
) -> std::result::Result<f64, EvaluationError> {
    let stats = &session.stats;
    let value = match gate_type {
        QualityGateType::TestPassRate => stats.pass_rate,
        QualityGateType::CodeCoverage => session.coverage.mean(),
        QualityGateType::ExecutionTime => stats.total_duration_ms as f64,
        QualityGateType::ErrorRate => stats.error_rate(),
        QualityGateType::Performance => stats.average_duration_ms(),
        QualityGateType::Custom(_) => {
            return Err(EvaluationError::UnsupportedType(gate_type.to_string()))
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::NonFiniteValue {
            metric: gate_type.to_string(),
            value,
        })
    }
}

fn gate_message(gate: &QualityGateDefinition, current_value: f64, passed: bool) -> String {
    let template = if passed { &gate.success_message } else { &gate.failure_message };
    if template.is_empty() {
        let verdict = if passed { "passed" } else { "failed" };
        return format!(
            "{} {}: {:.2} {} {:.2}",
            gate.name, verdict, current_value, gate.operator, gate.threshold
        );
    }
    render_message(template, current_value, gate.threshold)
}

fn render_details(gate: &QualityGateDefinition, session: &TestSession, current_value: f64) -> String {
    let stats = &session.stats;
    let mut lines = vec![
        format!("Gate: {}", gate.name),
        format!("Type: {}", gate.gate_type),
        format!("Operator: {}", gate.operator),
        format!("Current Value: {:.2}", current_value),
        format!("Threshold: {:.2}", gate.threshold),
        format!("Severity: {}", gate.severity),
        String::new(),
    ];

    match &gate.gate_type {
        QualityGateType::TestPassRate => {
            lines.push("Test Statistics:".to_string());
            lines.push(format!("  Total: {}", stats.total));
            lines.push(format!("  Passed: {}", stats.passed));
            lines.push(format!("  Failed: {}", stats.failed));
            lines.push(format!("  Skipped: {}", stats.skipped));
        }
        QualityGateType::CodeCoverage => {
            let coverage = &session.coverage;
            lines.push("Coverage:".to_string());
            lines.push(format!("  Line: {:.2}%", coverage.line));
            lines.push(format!("  Branch: {:.2}%", coverage.branch));
            lines.push(format!("  Method: {:.2}%", coverage.method));
            lines.push(format!("  Class: {:.2}%", coverage.class));
        }
        QualityGateType::ExecutionTime | QualityGateType::Performance => {
            lines.push("Execution Time:".to_string());
            lines.push(format!("  Total: {} ms", stats.total_duration_ms));
            lines.push(format!("  Average per Test: {:.2} ms", stats.average_duration_ms()));
            lines.push(format!("  Tests: {}", stats.total));
        }
        QualityGateType::ErrorRate => {
            lines.push("Errors:".to_string());
            lines.push(format!("  Error Rate: {:.2}%", current_value));
            lines.push(format!("  Failed: {}", stats.failed));
            lines.push(format!("  Total: {}", stats.total));
        }
        QualityGateType::Custom(_) => {}
    }

    lines.join("\n")
}

fn error_details(err: &EvaluationError) -> String {
    use std::error::Error;

    let mut lines = vec![
        format!("Error Kind: {}", err.kind()),
        format!("Error: {}", err),
    ];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}
