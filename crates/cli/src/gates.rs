//! `testwatch gates` and gate config loading.

use anyhow::{Context, Result};
use std::path::Path;
use testwatch_quality::{GateConfig, QualityGateEngine};
use tracing::info;

/// Build an engine from the defaults plus an optional config file.
pub async fn load_engine(config: Option<&Path>) -> Result<QualityGateEngine> {
    let engine = QualityGateEngine::new();
    let Some(path) = config else {
        return Ok(engine);
    };

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read gate config {}", path.display()))?;
    let config = GateConfig::from_json_str(&json)
        .with_context(|| format!("Failed to parse gate config {}", path.display()))?;
    config
        .apply(&engine)
        .with_context(|| format!("Failed to apply gate config {}", path.display()))?;

    info!("Loaded gate config from {}", path.display());
    Ok(engine)
}

/// One line per registered gate.
pub fn list(engine: &QualityGateEngine) -> String {
    let gates = engine.list_gates();
    let mut lines = vec![format!("Quality gates ({})", gates.len())];
    for gate in gates {
        lines.push(format!(
            "  {} | {} | {} {} | {} | {}",
            gate.id,
            gate.gate_type,
            gate.operator,
            gate.threshold,
            gate.severity,
            if gate.enabled { "enabled" } else { "disabled" },
        ));
    }
    lines.join("\n")
}

/// Validation output and whether the configuration is sound.
pub fn validate(engine: &QualityGateEngine) -> (String, bool) {
    let problems = engine.validate_configuration();
    if problems.is_empty() {
        return ("Gate configuration is valid".to_string(), true);
    }

    let mut lines = vec![format!("Gate configuration has {} problem(s):", problems.len())];
    lines.extend(problems.into_iter().map(|p| format!("  - {}", p)));
    (lines.join("\n"), false)
}
