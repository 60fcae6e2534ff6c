//! Operation recording - the observability side channel.
//!
//! Every engine reports its actions to an injected [`OperationRecorder`].
//! Recording is fire-and-forget: implementations must not panic and have no
//! way to fail the operation that reported to them.

use std::sync::{Mutex, PoisonError};

/// Sink for `(operation, duration, success, error)` observations.
pub trait OperationRecorder: Send + Sync {
    /// Record one completed operation.
    fn record_operation(
        &self,
        operation: &str,
        duration_ms: f64,
        success: bool,
        error: Option<&str>,
    );
}

/// Discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl OperationRecorder for NoopRecorder {
    fn record_operation(&self, _operation: &str, _duration_ms: f64, _success: bool, _error: Option<&str>) {}
}

/// Forwards observations to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl OperationRecorder for TracingRecorder {
    fn record_operation(
        &self,
        operation: &str,
        duration_ms: f64,
        success: bool,
        error: Option<&str>,
    ) {
        if success {
            tracing::debug!(operation, duration_ms, "operation succeeded");
        } else {
            tracing::warn!(operation, duration_ms, error = error.unwrap_or(""), "operation failed");
        }
    }
}

/// One observation kept by [`MemoryRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOperation {
    pub operation: String,
    pub duration_ms: f64,
    pub success: bool,
    pub error: Option<String>,
}

/// Keeps every observation in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    operations: Mutex<Vec<RecordedOperation>>,
}

impl MemoryRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn operations(&self) -> Vec<RecordedOperation> {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Observations recorded under the given operation name.
    pub fn named(&self, operation: &str) -> Vec<RecordedOperation> {
        self.operations()
            .into_iter()
            .filter(|op| op.operation == operation)
            .collect()
    }

    /// Number of failed observations.
    pub fn failure_count(&self) -> usize {
        self.operations().iter().filter(|op| !op.success).count()
    }
}

impl OperationRecorder for MemoryRecorder {
    fn record_operation(
        &self,
        operation: &str,
        duration_ms: f64,
        success: bool,
        error: Option<&str>,
    ) {
        self.operations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedOperation {
                operation: operation.to_string(),
                duration_ms,
                success,
                error: error.map(str::to_string),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_recorder_keeps_order() {
        let recorder = MemoryRecorder::new();
        recorder.record_operation("A", 1.0, true, None);
        recorder.record_operation("B", 2.0, false, Some("bad"));
        recorder.record_operation("A", 3.0, true, None);

        let ops = recorder.operations();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1].error.as_deref(), Some("bad"));
        assert_eq!(recorder.named("A").len(), 2);
        assert_eq!(recorder.failure_count(), 1);
    }

    #[test]
    fn test_recorders_are_object_safe() {
        let recorders: Vec<Box<dyn OperationRecorder>> =
            vec![Box::new(NoopRecorder), Box::new(TracingRecorder), Box::new(MemoryRecorder::new())];
        for recorder in &recorders {
            recorder.record_operation("Probe", 0.0, true, None);
        }
    }
}
