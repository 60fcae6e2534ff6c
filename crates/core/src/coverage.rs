//! Coverage model - one snapshot per session.

use serde::{Deserialize, Serialize};
use crate::Time;

/// Coarse letter bucketing of the mean coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoverageGrade {
    /// Not graded yet
    #[default]
    Unknown,
    /// Mean coverage >= 90
    A,
    /// Mean coverage >= 75
    B,
    /// Mean coverage >= 50
    C,
    /// Anything lower
    D,
}

impl CoverageGrade {
    /// Bucket a mean coverage percentage.
    pub fn from_mean(mean: f64) -> Self {
        if mean >= 90.0 {
            CoverageGrade::A
        } else if mean >= 75.0 {
            CoverageGrade::B
        } else if mean >= 50.0 {
            CoverageGrade::C
        } else {
            CoverageGrade::D
        }
    }
}

impl std::fmt::Display for CoverageGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CoverageGrade::Unknown => "Unknown",
            CoverageGrade::A => "A",
            CoverageGrade::B => "B",
            CoverageGrade::C => "C",
            CoverageGrade::D => "D",
        };
        f.write_str(s)
    }
}

/// Raw covered/total counts behind the percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub covered_lines: u64,
    pub total_lines: u64,
    pub covered_branches: u64,
    pub total_branches: u64,
    pub covered_methods: u64,
    pub total_methods: u64,
    pub covered_classes: u64,
    pub total_classes: u64,
}

/// A coverage snapshot. Percentages are in [0, 100].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoverageMetrics {
    /// Project the snapshot was taken for
    #[serde(default)]
    pub project_name: String,

    /// Line coverage percentage
    #[serde(default)]
    pub line: f64,

    /// Branch coverage percentage
    #[serde(default)]
    pub branch: f64,

    /// Method coverage percentage
    #[serde(default)]
    pub method: f64,

    /// Class coverage percentage
    #[serde(default)]
    pub class: f64,

    /// Derived grade, recomputed on every update
    #[serde(default)]
    pub grade: CoverageGrade,

    /// Opaque location of the full coverage report
    #[serde(default)]
    pub report_location: String,

    /// Raw counts when the producer supplied them
    #[serde(default)]
    pub counts: Option<CoverageCounts>,

    /// When the snapshot was produced
    #[serde(default)]
    pub generated_at: Option<Time>,
}

impl CoverageMetrics {
    /// Create a snapshot from four percentages.
    pub fn new(line: f64, branch: f64, method: f64, class: f64) -> Self {
        let mut metrics = Self {
            line,
            branch,
            method,
            class,
            generated_at: Some(chrono::Utc::now()),
            ..Default::default()
        };
        metrics.calculate_grade();
        metrics
    }

    /// Create a snapshot from raw counts. A zero total yields 0%.
    pub fn from_counts(counts: CoverageCounts) -> Self {
        let pct = |covered: u64, total: u64| {
            if total > 0 {
                covered as f64 * 100.0 / total as f64
            } else {
                0.0
            }
        };
        let mut metrics = Self::new(
            pct(counts.covered_lines, counts.total_lines),
            pct(counts.covered_branches, counts.total_branches),
            pct(counts.covered_methods, counts.total_methods),
            pct(counts.covered_classes, counts.total_classes),
        );
        metrics.counts = Some(counts);
        metrics
    }

    /// Set the project name.
    pub fn with_project(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    /// Set the report location.
    pub fn with_report_location(mut self, location: impl Into<String>) -> Self {
        self.report_location = location.into();
        self
    }

    /// Arithmetic mean of the four percentages.
    pub fn mean(&self) -> f64 {
        (self.line + self.branch + self.method + self.class) / 4.0
    }

    /// Recompute the grade from the current percentages.
    pub fn calculate_grade(&mut self) -> CoverageGrade {
        self.grade = CoverageGrade::from_mean(self.mean());
        self.grade
    }
}
