//! Gate configuration: validation, export and JSON config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use testwatch_core::QualityGateDefinition;
use tracing::info;

use crate::engine::QualityGateEngine;
use crate::error::{GateError, Result};

/// List the problems of a gate set. Empty when the set is sound.
pub fn validate_gates(gates: &[&QualityGateDefinition]) -> Vec<String> {
    let mut problems = Vec::new();

    for gate in gates {
        if gate.id.trim().is_empty() {
            problems.push(format!("Gate '{}' has an empty id", gate.name));
        }
        if gate.name.trim().is_empty() {
            problems.push(format!("Gate '{}' has an empty name", gate.id));
        }
        if !gate.threshold.is_finite() {
            problems.push(format!("Gate '{}' has a non-finite threshold", gate.id));
            continue;
        }
        if gate.threshold < 0.0 {
            problems.push(format!(
                "Gate '{}' has a negative threshold ({})",
                gate.id, gate.threshold
            ));
        }
        if gate.gate_type.is_percentage() && gate.threshold > 100.0 {
            problems.push(format!(
                "Gate '{}' is a percentage gate with a threshold above 100 ({})",
                gate.id, gate.threshold
            ));
        }
    }

    problems
}

/// Render every gate as text, ordered by name then id.
pub fn export_gates(gates: &[&QualityGateDefinition]) -> String {
    let mut sorted = gates.to_vec();
    sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut lines = vec![
        "=== Quality Gate Configuration ===".to_string(),
        format!("Total Gates: {}", sorted.len()),
        format!("Enabled Gates: {}", sorted.iter().filter(|g| g.enabled).count()),
        String::new(),
    ];

    for gate in sorted {
        lines.push(format!("Gate: {} ({})", gate.name, gate.id));
        lines.push(format!("  Type: {}", gate.gate_type));
        lines.push(format!("  Operator: {}", gate.operator));
        lines.push(format!("  Threshold: {:.2}", gate.threshold));
        lines.push(format!("  Severity: {}", gate.severity));
        lines.push(format!("  Enabled: {}", gate.enabled));
        if !gate.description.is_empty() {
            lines.push(format!("  Description: {}", gate.description));
        }
        if !gate.failure_message.is_empty() {
            lines.push(format!("  Failure Message: {}", gate.failure_message));
        }
        if !gate.success_message.is_empty() {
            lines.push(format!("  Success Message: {}", gate.success_message));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Gate configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Drop the default gates before adding `gates`
    #[serde(default)]
    pub replace_defaults: bool,

    /// Gates to add, replacing any gate with the same id
    #[serde(default)]
    pub gates: Vec<QualityGateDefinition>,

    /// Ids of gates to disable after `gates` are added
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl GateConfig {
    /// Parse a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply the config to an engine.
    ///
    /// Validation and mutation happen under one registry lock, so nothing
    /// is changed when the config is rejected and concurrent mutations
    /// cannot interleave with it.
    pub fn apply(&self, engine: &QualityGateEngine) -> Result<()> {
        let mut ids = BTreeSet::new();
        for gate in &self.gates {
            if !ids.insert(gate.id.as_str()) {
                return Err(GateError::Config(format!("duplicate gate id '{}'", gate.id)));
            }
        }

        let removed = {
            let mut registry = engine.registry();
            for id in &self.disabled {
                let known = ids.contains(id.as_str())
                    || (!self.replace_defaults && registry.contains(id));
                if !known {
                    return Err(GateError::NotFound(id.clone()));
                }
            }

            let mut removed = 0;
            if self.replace_defaults {
                let existing: Vec<String> = registry.list().iter().map(|g| g.id.clone()).collect();
                for id in &existing {
                    registry.unregister(id);
                }
                removed = existing.len();
            }
            for gate in &self.gates {
                registry.register(gate.clone());
            }
            for id in &self.disabled {
                registry.set_enabled(id, false);
            }
            removed
        };

        for _ in 0..removed {
            engine.record("RemoveQualityGate");
        }
        for _ in &self.gates {
            engine.record("AddQualityGate");
        }
        for _ in &self.disabled {
            engine.record("UpdateQualityGate");
        }

        info!(
            "Applied gate config: {} gates added, {} disabled, defaults {}",
            self.gates.len(),
            self.disabled.len(),
            if self.replace_defaults { "replaced" } else { "kept" }
        );
        Ok(())
    }
}
