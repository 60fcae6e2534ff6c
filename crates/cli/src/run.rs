//! `testwatch run`: push a results file through a full session.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use testwatch_analysis::{
    generate_analysis_markdown, generate_analysis_report, SessionAnalyzer, TestSessionAnalysis,
};
use testwatch_core::{CoverageCounts, CoverageMetrics, TestResult, TestSession};
use testwatch_quality::{QualityGateCheckResult, QualityGateEngine};
use testwatch_session::{markdown_cell, ReportFormat, SessionStore};
use tracing::info;

/// Output format of `testwatch run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Sectioned plain text
    #[default]
    Text,
    /// One JSON document with session, gate check and analysis
    Json,
    /// Markdown tables
    Markdown,
}

/// Results file consumed by `testwatch run`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunInput {
    pub name: String,
    #[serde(default)]
    pub project_path: String,
    #[serde(default)]
    pub solution_path: String,
    #[serde(default)]
    pub build_configuration: Option<String>,
    #[serde(default)]
    pub target_framework: Option<String>,
    #[serde(default)]
    pub results: Vec<TestResult>,
    /// Coverage percentages
    #[serde(default)]
    pub coverage: Option<CoverageMetrics>,
    /// Raw coverage counts; take precedence over `coverage`
    #[serde(default)]
    pub coverage_counts: Option<CoverageCounts>,
}

impl RunInput {
    /// Read and parse a results file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read results file {}", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse results file {}", path.display()))
    }

    fn coverage_metrics(&self) -> Option<CoverageMetrics> {
        match (self.coverage_counts, &self.coverage) {
            (Some(counts), _) => Some(CoverageMetrics::from_counts(counts)),
            (None, Some(coverage)) => Some(coverage.clone()),
            (None, None) => None,
        }
    }
}

/// Rendered output of a run and whether it blocks a deployment.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: String,
    pub blocks_deployment: bool,
}

/// Run the input through store, gates and analyzer.
pub fn execute(
    input: RunInput,
    engine: &QualityGateEngine,
    cancel: bool,
    format: OutputFormat,
) -> Result<RunOutcome> {
    let store = SessionStore::new();
    let analyzer = SessionAnalyzer::new();

    let id = store
        .create_session(&input.name, &input.project_path, &input.solution_path)
        .id;
    if input.build_configuration.is_some() || input.target_framework.is_some() {
        let current = store.get_session(id)?;
        store.set_build_info(
            id,
            input.build_configuration.clone().unwrap_or(current.build_configuration),
            input.target_framework.clone().unwrap_or(current.target_framework),
        )?;
    }

    store.start_session(id)?;
    for result in input.results.iter().cloned() {
        store.record_result(id, result)?;
    }
    if let Some(coverage) = input.coverage_metrics() {
        store.update_coverage(id, coverage)?;
    }

    let check = engine.check_quality_gates(&store.snapshot(id)?);
    store.attach_gate_results(id, &check.gate_statuses)?;

    let session = if cancel {
        store.cancel_session(id)?
    } else {
        store.complete_session(id)?
    };
    let analysis = analyzer.analyze(&session);

    info!(
        "Session {} finished with {} gate failure(s) and {} gate error(s)",
        session.id,
        check.failed_gates(),
        check.error_gates()
    );

    let report = match format {
        OutputFormat::Text => [
            store.export_session_as(id, ReportFormat::Text)?,
            gate_summary(&check),
            generate_analysis_report(&analysis),
        ]
        .join("\n\n"),
        OutputFormat::Markdown => [
            store.export_session_as(id, ReportFormat::Markdown)?,
            gate_summary_markdown(&check),
            generate_analysis_markdown(&analysis),
        ]
        .join("\n\n"),
        OutputFormat::Json => {
            let document = RunDocument {
                session: &session,
                gate_check: &check,
                analysis: &analysis,
            };
            serde_json::to_string_pretty(&document).context("Failed to serialize run report")?
        }
    };

    Ok(RunOutcome {
        report,
        blocks_deployment: check.blocks_deployment(),
    })
}

#[derive(Serialize)]
struct RunDocument<'a> {
    session: &'a TestSession,
    gate_check: &'a QualityGateCheckResult,
    analysis: &'a TestSessionAnalysis,
}

fn gate_summary(check: &QualityGateCheckResult) -> String {
    let mut lines = vec![
        "=== Quality Gate Summary ===".to_string(),
        format!("Overall Status: {}", check.overall_status),
        format!("Passed Gates: {}", check.passed_gates()),
        format!("Failed Gates: {}", check.failed_gates()),
        format!("Error Gates: {}", check.error_gates()),
        format!(
            "Deployment: {}",
            if check.blocks_deployment() { "blocked" } else { "allowed" }
        ),
    ];
    for gate in &check.gate_statuses {
        lines.push(format!("  [{}] {}: {}", gate.status, gate.gate_name, gate.message));
    }
    lines.join("\n")
}

fn gate_summary_markdown(check: &QualityGateCheckResult) -> String {
    let mut lines = vec![
        "## Quality Gate Summary".to_string(),
        String::new(),
        format!(
            "Overall **{}**: {} passed, {} failed, {} errored. Deployment {}.",
            check.overall_status,
            check.passed_gates(),
            check.failed_gates(),
            check.error_gates(),
            if check.blocks_deployment() { "blocked" } else { "allowed" }
        ),
        String::new(),
        "| Gate | Status | Message |".to_string(),
        "|------|--------|---------|".to_string(),
    ];
    for gate in &check.gate_statuses {
        lines.push(format!(
            "| {} | {} | {} |",
            markdown_cell(&gate.gate_name),
            gate.status,
            markdown_cell(&gate.message)
        ));
    }
    lines.join("\n")
}
