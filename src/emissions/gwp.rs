//! CO2-equivalent conversion using fixed global-warming potentials

use serde::{Deserialize, Serialize};

use crate::config::defaults::{GWP_CH4, GWP_CO2, GWP_N2O};
use crate::types::{Gas, TieredReading};

/// Multiplier converting one kg of each gas into kg CO2e.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GwpTable {
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
}

impl GwpTable {
    /// CO2 = 1, CH4 = 25, N2O = 298.
    pub const STANDARD: Self = Self {
        co2: GWP_CO2,
        ch4: GWP_CH4,
        n2o: GWP_N2O,
    };

    pub fn factor(&self, gas: Gas) -> f64 {
        match gas {
            Gas::Co2 => self.co2,
            Gas::Ch4 => self.ch4,
            Gas::N2o => self.n2o,
        }
    }
}

impl Default for GwpTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Maps a tiered reading to total CO2e.
#[derive(Debug, Clone, Copy, Default)]
pub struct GasConverter {
    gwp: GwpTable,
}

impl GasConverter {
    pub fn new(gwp: GwpTable) -> Self {
        Self { gwp }
    }

    pub fn gwp(&self) -> &GwpTable {
        &self.gwp
    }

    /// Total CO2e in kg.
    ///
    /// Tier 1 is accumulated in the fixed order CO2, CH4, N2O so results are
    /// bit-for-bit reproducible. Tier 2/3 CO2 is weighted by the CO2 factor
    /// and a missing value counts as zero. No rounding is applied.
    pub fn to_co2e(&self, reading: &TieredReading) -> f64 {
        let tier1: f64 = Gas::ALL
            .iter()
            .filter_map(|&gas| reading.tier1_value(gas).map(|qty| qty * self.gwp.factor(gas)))
            .fold(0.0, |acc, v| acc + v);
        let tier2 = reading.tier2.co2_or_zero() * self.gwp.co2;
        let tier3 = reading.tier3.co2_or_zero() * self.gwp.co2;

        tier1 + tier2 + tier3
    }
}
