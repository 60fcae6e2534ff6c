//! Test result model - one normalized test outcome.

use serde::{Deserialize, Serialize};
use crate::id::TestResultId;
use crate::Time;

/// Outcome of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    /// All statuses in report order.
    pub const ALL: [TestStatus; 3] = [TestStatus::Passed, TestStatus::Failed, TestStatus::Skipped];

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "Passed",
            TestStatus::Failed => "Failed",
            TestStatus::Skipped => "Skipped",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One test outcome as submitted by a test harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Identifier, reassigned by the session store on submission
    #[serde(default)]
    pub id: TestResultId,

    /// Test name
    pub name: String,

    /// Free-form type tag (e.g. "Unit", "Integration")
    #[serde(default = "default_test_type")]
    pub test_type: String,

    /// Free-form category tag, used for grouping failures
    #[serde(default = "default_category")]
    pub category: String,

    /// Outcome
    pub status: TestStatus,

    /// Duration in milliseconds
    #[serde(default)]
    pub duration_ms: u64,

    /// Failure message, meaningful when status is Failed
    #[serde(default)]
    pub error_message: Option<String>,

    /// Stack trace captured with the failure
    #[serde(default)]
    pub stack_trace: Option<String>,

    /// Captured test output
    #[serde(default)]
    pub output: Option<String>,

    /// Fully qualified method name
    #[serde(default)]
    pub method_full_name: Option<String>,

    /// Source file of the test
    #[serde(default)]
    pub file_path: Option<String>,

    /// Line number within the source file
    #[serde(default)]
    pub line_number: Option<u32>,

    /// When the test started
    #[serde(default)]
    pub started_at: Option<Time>,

    /// When the test finished
    #[serde(default)]
    pub ended_at: Option<Time>,
}

fn default_test_type() -> String {
    "Unit".to_string()
}

fn default_category() -> String {
    "Common".to_string()
}

impl TestResult {
    /// Create a new result with default type and category tags.
    pub fn new(name: impl Into<String>, status: TestStatus, duration_ms: u64) -> Self {
        Self {
            id: TestResultId::new(),
            name: name.into(),
            test_type: default_test_type(),
            category: default_category(),
            status,
            duration_ms,
            error_message: None,
            stack_trace: None,
            output: None,
            method_full_name: None,
            file_path: None,
            line_number: None,
            started_at: None,
            ended_at: None,
        }
    }

    /// Create a passed result.
    pub fn passed(name: impl Into<String>, duration_ms: u64) -> Self {
        Self::new(name, TestStatus::Passed, duration_ms)
    }

    /// Create a failed result carrying an error message.
    pub fn failed(name: impl Into<String>, duration_ms: u64, error: impl Into<String>) -> Self {
        let mut result = Self::new(name, TestStatus::Failed, duration_ms);
        result.error_message = Some(error.into());
        result
    }

    /// Create a skipped result.
    pub fn skipped(name: impl Into<String>) -> Self {
        Self::new(name, TestStatus::Skipped, 0)
    }

    /// Set the type tag.
    pub fn with_type(mut self, test_type: impl Into<String>) -> Self {
        self.test_type = test_type.into();
        self
    }

    /// Set the category tag.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Operation name reported to the recorder for this result.
    pub fn operation_name(&self) -> String {
        format!("Test_{}_{}", self.test_type, self.category)
    }
}
