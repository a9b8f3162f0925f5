//! Tier 1 deviation from the historical baseline

use std::collections::BTreeMap;

use crate::baseline::BaselineStatus;
use crate::types::{Deviation, DeviationBasis, Gas, TieredReading};

/// Computes per-gas deviation of a reading from the resolved baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviationEstimator;

impl DeviationEstimator {
    /// `reading - mean` for each Tier 1 gas when a baseline is available.
    ///
    /// Without a baseline the raw Tier 1 values are returned with basis
    /// [`DeviationBasis::RawFallback`]. A gas missing from the baseline is
    /// passed through raw as well. Never fails.
    pub fn deviation(&self, reading: &TieredReading, baseline: &BaselineStatus) -> Deviation {
        match baseline {
            BaselineStatus::Available(b) => {
                let values: BTreeMap<Gas, f64> = reading
                    .tier1
                    .iter()
                    .map(|(&gas, &value)| (gas, value - b.mean(gas).unwrap_or(0.0)))
                    .collect();
                Deviation {
                    basis: DeviationBasis::Baseline,
                    values,
                }
            }
            BaselineStatus::Unavailable => Deviation {
                basis: DeviationBasis::RawFallback,
                values: reading.tier1.clone(),
            },
        }
    }
}
