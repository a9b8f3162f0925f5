//! Tiered gas reading types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Gas species tracked by the sensors.
///
/// Ordering is CO2, CH4, N2O. Tier 1 maps are `BTreeMap`s keyed by this
/// enum, so iteration (and therefore CO2e accumulation) always runs in that
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gas {
    #[serde(rename = "CO2")]
    Co2,
    #[serde(rename = "CH4")]
    Ch4,
    #[serde(rename = "N2O")]
    N2o,
}

impl Gas {
    /// Tier 1 gases in accumulation order.
    pub const ALL: [Gas; 3] = [Gas::Co2, Gas::Ch4, Gas::N2o];

    /// Chemical symbol as used on the wire.
    pub fn symbol(self) -> &'static str {
        match self {
            Gas::Co2 => "CO2",
            Gas::Ch4 => "CH4",
            Gas::N2o => "N2O",
        }
    }
}

impl std::fmt::Display for Gas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Tier 2 / Tier 3 sources only ever report CO2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarbonTier {
    /// CO2 mass in kg (absent = not reported)
    #[serde(rename = "CO2", default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
}

impl CarbonTier {
    pub fn new(co2: f64) -> Self {
        Self { co2: Some(co2) }
    }

    /// CO2 mass with missing values treated as zero.
    pub fn co2_or_zero(&self) -> f64 {
        self.co2.unwrap_or(0.0)
    }
}

/// One sensor reading split into three emission-source tiers (kg).
///
/// Wire format:
///
/// ```json
/// {"Tier1": {"CO2": 390.0, "CH4": 1.5, "N2O": 0.28},
///  "Tier2": {"CO2": 50.0},
///  "Tier3": {"CO2": 20.0}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredReading {
    /// Direct emissions, must carry CO2, CH4 and N2O once validated.
    /// Absent on the wire decodes as empty so validation reports it.
    #[serde(rename = "Tier1", default)]
    pub tier1: BTreeMap<Gas, f64>,
    #[serde(rename = "Tier2", default)]
    pub tier2: CarbonTier,
    #[serde(rename = "Tier3", default)]
    pub tier3: CarbonTier,
}

impl TieredReading {
    /// Build a complete reading from its six quantities.
    pub fn new(co2: f64, ch4: f64, n2o: f64, tier2_co2: f64, tier3_co2: f64) -> Self {
        let tier1 = BTreeMap::from([(Gas::Co2, co2), (Gas::Ch4, ch4), (Gas::N2o, n2o)]);
        Self {
            tier1,
            tier2: CarbonTier::new(tier2_co2),
            tier3: CarbonTier::new(tier3_co2),
        }
    }

    pub fn tier1_value(&self, gas: Gas) -> Option<f64> {
        self.tier1.get(&gas).copied()
    }

    /// CO2 summed over all three tiers (missing Tier 2/3 count as zero).
    pub fn total_co2(&self) -> f64 {
        self.tier1_value(Gas::Co2).unwrap_or(0.0)
            + self.tier2.co2_or_zero()
            + self.tier3.co2_or_zero()
    }

    /// Zero-valued reading used as a dashboard placeholder before the first record.
    pub fn zeroed() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0, 0.0)
    }
}
