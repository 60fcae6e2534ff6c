//! Quality gate registry.

use std::collections::{BTreeMap, HashMap};
use testwatch_core::{QualityGateDefinition, QualityGateType};

/// Registry for gate definitions, keyed by gate id.
#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    gates: BTreeMap<String, QualityGateDefinition>,
    by_type: HashMap<QualityGateType, Vec<String>>,
}

impl GateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gate, replacing any gate with the same id.
    pub fn register(&mut self, gate: QualityGateDefinition) -> Option<QualityGateDefinition> {
        let previous = self.unregister(&gate.id);

        self.by_type
            .entry(gate.gate_type.clone())
            .or_default()
            .push(gate.id.clone());
        self.gates.insert(gate.id.clone(), gate);
        previous
    }

    /// Unregister a gate.
    pub fn unregister(&mut self, id: &str) -> Option<QualityGateDefinition> {
        let gate = self.gates.remove(id)?;
        if let Some(ids) = self.by_type.get_mut(&gate.gate_type) {
            ids.retain(|x| x != id);
            if ids.is_empty() {
                self.by_type.remove(&gate.gate_type);
            }
        }
        Some(gate)
    }

    /// Enable or disable a gate. Returns false when no gate has the id.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.gates.get_mut(id) {
            Some(gate) => {
                gate.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Get a gate by id.
    pub fn get(&self, id: &str) -> Option<&QualityGateDefinition> {
        self.gates.get(id)
    }

    /// Whether a gate is registered under the id.
    pub fn contains(&self, id: &str) -> bool {
        self.gates.contains_key(id)
    }

    /// All gates, ordered by id.
    pub fn list(&self) -> Vec<&QualityGateDefinition> {
        self.gates.values().collect()
    }

    /// Enabled gates, ordered by id.
    pub fn enabled(&self) -> Vec<&QualityGateDefinition> {
        self.gates.values().filter(|g| g.enabled).collect()
    }

    /// Gates of the given type, in registration order.
    pub fn find_by_type(&self, gate_type: &QualityGateType) -> Vec<&QualityGateDefinition> {
        self.by_type
            .get(gate_type)
            .into_iter()
            .flat_map(|ids| ids.iter().filter_map(|id| self.gates.get(id)))
            .collect()
    }

    /// Number of registered gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
