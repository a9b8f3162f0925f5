//! Historical baseline for Tier 1 deviation estimates
//!
//! A baseline is the per-gas mean of prior Tier 1 observations. It is
//! optional: sources report [`BaselineStatus::Unavailable`] rather than
//! failing, and the pipeline then falls back to raw values.

mod csv;

pub use self::csv::CsvBaselineSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Gas;

/// Mean Tier 1 quantities over prior observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub means: BTreeMap<Gas, f64>,
    /// Rows the means were computed from
    pub observations: usize,
}

impl Baseline {
    pub fn mean(&self, gas: Gas) -> Option<f64> {
        self.means.get(&gas).copied()
    }
}

/// Result of resolving the baseline for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum BaselineStatus {
    Available(Baseline),
    /// No history configured, reachable or populated. Expected steady state.
    Unavailable,
}

impl BaselineStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, BaselineStatus::Available(_))
    }
}

/// Internal failures of a baseline source. Never escape [`BaselineSource::resolve`].
#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("Baseline I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, std::io::Error),

    #[error("Baseline missing column {0}")]
    MissingColumn(Gas),

    #[error("Baseline has no observations for {0}")]
    Empty(Gas),

    #[error("Line {line}: invalid {gas} value '{value}'")]
    InvalidValue { line: usize, gas: Gas, value: String },
}

/// Read-only access to historical Tier 1 observations.
#[async_trait]
pub trait BaselineSource: Send + Sync + 'static {
    /// Resolve the current baseline. Must not fail: problems map to
    /// [`BaselineStatus::Unavailable`].
    async fn resolve(&self) -> BaselineStatus;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

/// No historical source configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBaseline;

#[async_trait]
impl BaselineSource for NoBaseline {
    async fn resolve(&self) -> BaselineStatus {
        BaselineStatus::Unavailable
    }

    fn source_name(&self) -> &str {
        "none"
    }
}

/// A baseline fixed at construction (replays, tests).
#[derive(Debug, Clone)]
pub struct FixedBaseline(pub Baseline);

#[async_trait]
impl BaselineSource for FixedBaseline {
    async fn resolve(&self) -> BaselineStatus {
        BaselineStatus::Available(self.0.clone())
    }

    fn source_name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_baseline_is_unavailable() {
        assert_eq!(NoBaseline.resolve().await, BaselineStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_fixed_baseline_is_available() {
        let baseline = Baseline {
            means: BTreeMap::from([(Gas::Co2, 400.0), (Gas::Ch4, 2.0), (Gas::N2o, 0.3)]),
            observations: 12,
        };
        let status = FixedBaseline(baseline.clone()).resolve().await;
        assert!(status.is_available());
        assert_eq!(status, BaselineStatus::Available(baseline));
    }
}
