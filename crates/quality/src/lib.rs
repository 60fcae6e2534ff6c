//! Quality gates
//!
//! Gate registry, evaluation of gates against a session, and gate
//! configuration files.

#![warn(missing_docs)]

pub mod engine;
pub mod registry;
pub mod gate;
pub mod defaults;
pub mod message;
pub mod config;
pub mod error;

pub use engine::{evaluate_gate, extract_metric, QualityGateCheckResult, QualityGateEngine};
pub use registry::GateRegistry;
pub use gate::QualityGateBuilder;
pub use defaults::default_gates;
pub use message::render_message;
pub use config::{export_gates, validate_gates, GateConfig};
pub use error::{EvaluationError, GateError, Result};
