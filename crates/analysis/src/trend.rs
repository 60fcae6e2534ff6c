//! Trend providers.
//!
//! A single session carries no trend information, so the default provider
//! reports every metric as `Stable`. [`HistoricalTrends`] compares the
//! session against samples taken from earlier sessions.

use serde::{Deserialize, Serialize};
use testwatch_core::TestSession;

use crate::model::{TrendAnalysis, TrendDirection};

/// Tolerance for percentage metrics, in percentage points.
const PERCENT_TOLERANCE: f64 = 1.0;

/// Relative tolerance for durations.
const DURATION_TOLERANCE: f64 = 0.10;

/// Source of trend information for a session.
pub trait TrendProvider: Send + Sync {
    /// Trends of `session` relative to whatever history the provider has.
    ///
    /// `session` carries computed aggregates.
    fn analyze_trends(&self, session: &TestSession) -> TrendAnalysis;
}

/// Provider without history. Never reports movement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl TrendProvider for NoHistory {
    fn analyze_trends(&self, _session: &TestSession) -> TrendAnalysis {
        TrendAnalysis {
            notes: vec![
                "Trend analysis requires historical session data for comparison".to_string(),
                "Keep a history of archived sessions to enable trend detection".to_string(),
            ],
            ..Default::default()
        }
    }
}

/// Headline metrics of one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    /// Pass rate (%)
    pub pass_rate: f64,
    /// Mean coverage (%)
    pub coverage: f64,
    /// Mean test duration (ms)
    pub average_duration_ms: f64,
    /// Error rate (%)
    pub error_rate: f64,
}

impl TrendSample {
    /// Sample a session with computed aggregates.
    pub fn from_session(session: &TestSession) -> Self {
        Self {
            pass_rate: session.stats.pass_rate,
            coverage: session.coverage.mean(),
            average_duration_ms: session.stats.average_duration_ms(),
            error_rate: session.stats.error_rate(),
        }
    }
}

/// Provider comparing against earlier sessions, oldest first.
#[derive(Debug, Clone, Default)]
pub struct HistoricalTrends {
    history: Vec<TrendSample>,
}

#[derive(Clone, Copy)]
enum Metric {
    PassRate,
    Coverage,
    Performance,
    Reliability,
}

impl Metric {
    fn label(self) -> &'static str {
        match self {
            Metric::PassRate => "Pass rate",
            Metric::Coverage => "Coverage",
            Metric::Performance => "Average test duration",
            Metric::Reliability => "Error rate",
        }
    }

    fn value(self, sample: &TrendSample) -> f64 {
        match self {
            Metric::PassRate => sample.pass_rate,
            Metric::Coverage => sample.coverage,
            Metric::Performance => sample.average_duration_ms,
            Metric::Reliability => sample.error_rate,
        }
    }

    fn higher_is_better(self) -> bool {
        matches!(self, Metric::PassRate | Metric::Coverage)
    }

    fn tolerance(self, baseline: f64) -> f64 {
        match self {
            Metric::Performance => (baseline.abs() * DURATION_TOLERANCE).max(1.0),
            _ => PERCENT_TOLERANCE,
        }
    }

    fn unit(self) -> &'static str {
        match self {
            Metric::Performance => " ms",
            _ => "%",
        }
    }
}

impl HistoricalTrends {
    /// Create a provider from samples, oldest first.
    pub fn new(history: Vec<TrendSample>) -> Self {
        Self { history }
    }

    /// Create a provider from archived sessions, oldest first.
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a TestSession>) -> Self {
        Self::new(sessions.into_iter().map(TrendSample::from_session).collect())
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    fn direction(&self, metric: Metric, current: &TrendSample) -> (TrendDirection, f64) {
        let series: Vec<f64> = self
            .history
            .iter()
            .chain(std::iter::once(current))
            .map(|s| metric.value(s))
            .collect();

        let mut rises = false;
        let mut falls = false;
        for pair in series.windows(2) {
            let delta = pair[1] - pair[0];
            let tolerance = metric.tolerance(pair[0]);
            rises |= delta > tolerance;
            falls |= delta < -tolerance;
        }

        let baseline = self.history.iter().map(|s| metric.value(s)).sum::<f64>()
            / self.history.len() as f64;

        if series.len() >= 3 && rises && falls {
            return (TrendDirection::Fluctuating, baseline);
        }

        let delta = metric.value(current) - baseline;
        let tolerance = metric.tolerance(baseline);
        let direction = if delta.abs() <= tolerance {
            TrendDirection::Stable
        } else if (delta > 0.0) == metric.higher_is_better() {
            TrendDirection::Improving
        } else {
            TrendDirection::Declining
        };
        (direction, baseline)
    }
}

impl TrendProvider for HistoricalTrends {
    fn analyze_trends(&self, session: &TestSession) -> TrendAnalysis {
        if self.history.is_empty() {
            return NoHistory.analyze_trends(session);
        }

        let current = TrendSample::from_session(session);
        let mut analysis = TrendAnalysis {
            notes: vec![format!(
                "Compared against {} previous session(s)",
                self.history.len()
            )],
            ..Default::default()
        };

        for metric in [
            Metric::PassRate,
            Metric::Coverage,
            Metric::Performance,
            Metric::Reliability,
        ] {
            let (direction, baseline) = self.direction(metric, &current);
            match metric {
                Metric::PassRate => analysis.pass_rate = direction,
                Metric::Coverage => analysis.coverage = direction,
                Metric::Performance => analysis.performance = direction,
                Metric::Reliability => analysis.reliability = direction,
            }
            if direction != TrendDirection::Stable {
                analysis.notes.push(format!(
                    "{} {}: {:.2}{unit} against a baseline of {:.2}{unit}",
                    metric.label(),
                    direction.to_string().to_lowercase(),
                    metric.value(&current),
                    baseline,
                    unit = metric.unit()
                ));
            }
        }

        analysis
    }
}
