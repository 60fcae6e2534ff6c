//! Session export in text, JSON and Markdown.

use std::fmt;
use std::str::FromStr;
use testwatch_core::{TestSession, TestStatus, Time};

use crate::error::{Result, SessionError};
use crate::report::render_session_report;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format of a session export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportFormat {
    /// Sectioned plain text
    #[default]
    Text,
    /// Pretty-printed JSON of the whole session
    Json,
    /// Markdown with one table per section
    Markdown,
}

impl ReportFormat {
    /// File extension conventionally used for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        };
        f.write_str(name)
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Render a session in the given format.
pub fn render_session(session: &TestSession, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_session_report(session)),
        ReportFormat::Json => render_session_json(session),
        ReportFormat::Markdown => Ok(render_session_markdown(session)),
    }
}

/// The session as pretty-printed JSON, with current aggregates.
pub fn render_session_json(session: &TestSession) -> Result<String> {
    serde_json::to_string_pretty(&*session.with_current_statistics())
        .map_err(|e| SessionError::Serialization(e.to_string()))
}

/// Escape a value for a Markdown table cell.
pub fn markdown_cell(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

fn format_time(time: Option<Time>) -> String {
    time.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn field_table(lines: &mut Vec<String>, rows: &[(&str, String)]) {
    lines.push("| Field | Value |".to_string());
    lines.push("|-------|-------|".to_string());
    for (field, value) in rows {
        lines.push(format!("| {} | {} |", field, markdown_cell(value)));
    }
    lines.push(String::new());
}

/// Render a session as Markdown.
///
/// Same sections and order as the text report; gates and results become
/// tables and results get one table per status.
pub fn render_session_markdown(session: &TestSession) -> String {
    let session = session.with_current_statistics();
    let stats = &session.stats;
    let coverage = &session.coverage;
    let mut lines = vec![format!("# Test Session Report: {}", session.name), String::new()];

    lines.push("## Session Info".to_string());
    lines.push(String::new());
    field_table(
        &mut lines,
        &[
            ("Session ID", session.id.to_string()),
            ("Project Path", session.project_path.clone()),
            ("Solution Path", session.solution_path.clone()),
            ("Build Configuration", session.build_configuration.clone()),
            ("Target Framework", session.target_framework.clone()),
            ("Start Time", format_time(Some(session.started_at))),
            ("End Time", format_time(session.ended_at)),
            ("Status", session.status.to_string()),
        ],
    );

    lines.push("## Statistics".to_string());
    lines.push(String::new());
    field_table(
        &mut lines,
        &[
            ("Total Tests", stats.total.to_string()),
            ("Passed Tests", stats.passed.to_string()),
            ("Failed Tests", stats.failed.to_string()),
            ("Skipped Tests", stats.skipped.to_string()),
            ("Pass Rate", format!("{:.2}%", stats.pass_rate)),
            ("Total Duration", format!("{} ms", stats.total_duration_ms)),
        ],
    );

    lines.push("## Coverage".to_string());
    lines.push(String::new());
    field_table(
        &mut lines,
        &[
            ("Line Coverage", format!("{:.2}%", coverage.line)),
            ("Branch Coverage", format!("{:.2}%", coverage.branch)),
            ("Method Coverage", format!("{:.2}%", coverage.method)),
            ("Class Coverage", format!("{:.2}%", coverage.class)),
            ("Coverage Grade", coverage.grade.to_string()),
        ],
    );

    if !session.quality_gates.is_empty() {
        lines.push("## Quality Gates".to_string());
        lines.push(String::new());
        lines.push("| Gate | Type | Status | Current Value | Threshold | Message |".to_string());
        lines.push("|------|------|--------|---------------|-----------|---------|".to_string());
        for gate in &session.quality_gates {
            lines.push(format!(
                "| {} | {} | {} | {:.2} | {:.2} | {} |",
                markdown_cell(&gate.gate_name),
                gate.gate_type,
                gate.status,
                gate.current_value,
                gate.threshold,
                markdown_cell(&gate.message)
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Test Results".to_string());
    lines.push(String::new());
    for status in TestStatus::ALL {
        let group: Vec<_> = session.results.iter().filter(|r| r.status == status).collect();
        if group.is_empty() {
            continue;
        }
        lines.push(format!("### {} ({})", status, group.len()));
        lines.push(String::new());
        lines.push("| Test | Type | Category | Duration (ms) | Error |".to_string());
        lines.push("|------|------|----------|---------------|-------|".to_string());
        for result in group {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                markdown_cell(&result.name),
                markdown_cell(&result.test_type),
                markdown_cell(&result.category),
                result.duration_ms,
                markdown_cell(result.error_message.as_deref().unwrap_or(""))
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
