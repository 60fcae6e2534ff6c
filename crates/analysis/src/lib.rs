//! Session analysis
//!
//! Health scoring, key metrics, trends, recommendations, risk assessment and
//! performance insights for a test session.

#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod model;
pub mod report;
pub mod trend;

pub use analyzer::SessionAnalyzer;
pub use config::AnalysisConfig;
pub use model::{
    health_score, HealthStatus, KeyMetrics, PerformanceInsights, RiskAssessment, RiskItem,
    TestSessionAnalysis, TrendAnalysis, TrendDirection,
};
pub use report::{generate_analysis_markdown, generate_analysis_report};
pub use trend::{HistoricalTrends, NoHistory, TrendProvider, TrendSample};
