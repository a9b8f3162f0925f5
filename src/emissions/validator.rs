//! Reading completeness and plausibility checks
//!
//! Runs before conversion. A rejected reading never becomes a record.

use thiserror::Error;

use crate::config::defaults::ANOMALY_CEILING_KG;
use crate::types::{Gas, TieredReading};

/// Why a reading was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Incomplete data: Tier 1 missing {}", join_gases(.missing))]
    IncompleteData { missing: Vec<Gas> },

    #[error("Anomalous reading: {0}")]
    AnomalousReading(Anomaly),
}

impl ValidationError {
    /// Stable reason code for logs and counters.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::IncompleteData { .. } => "INCOMPLETE_DATA",
            ValidationError::AnomalousReading(_) => "ANOMALOUS_READING",
        }
    }
}

/// Kind of implausible value found in a reading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Anomaly {
    #[error("CO2 spike, Tier 1 CO2 {value} kg exceeds {ceiling} kg")]
    Co2Spike { value: f64, ceiling: f64 },

    #[error("Tier {tier} {gas} is negative ({value} kg)")]
    Negative { tier: u8, gas: Gas, value: f64 },

    #[error("Tier {tier} {gas} is not a finite number")]
    NonFinite { tier: u8, gas: Gas },
}

fn join_gases(gases: &[Gas]) -> String {
    gases
        .iter()
        .map(|g| g.symbol())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Checks a raw reading for completeness and sensor-fault values.
#[derive(Debug, Clone, Copy)]
pub struct ReadingValidator {
    anomaly_ceiling_kg: f64,
}

impl Default for ReadingValidator {
    fn default() -> Self {
        Self::new(ANOMALY_CEILING_KG)
    }
}

impl ReadingValidator {
    pub fn new(anomaly_ceiling_kg: f64) -> Self {
        Self { anomaly_ceiling_kg }
    }

    /// Return the reading unchanged if it is complete and plausible.
    ///
    /// Checks, in order:
    /// 1. Tier 1 carries CO2, CH4 and N2O (`IncompleteData`)
    /// 2. every quantity is finite and non-negative (`AnomalousReading`)
    /// 3. Tier 1 CO2 does not exceed the ceiling (`AnomalousReading`);
    ///    a value equal to the ceiling is accepted
    pub fn validate(&self, reading: TieredReading) -> Result<TieredReading, ValidationError> {
        let missing: Vec<Gas> = Gas::ALL
            .into_iter()
            .filter(|gas| !reading.tier1.contains_key(gas))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteData { missing });
        }

        let quantities = reading
            .tier1
            .iter()
            .map(|(&gas, &value)| (1u8, gas, value))
            .chain(reading.tier2.co2.map(|v| (2u8, Gas::Co2, v)))
            .chain(reading.tier3.co2.map(|v| (3u8, Gas::Co2, v)));
        for (tier, gas, value) in quantities {
            if !value.is_finite() {
                return Err(ValidationError::AnomalousReading(Anomaly::NonFinite { tier, gas }));
            }
            if value < 0.0 {
                return Err(ValidationError::AnomalousReading(Anomaly::Negative {
                    tier,
                    gas,
                    value,
                }));
            }
        }

        let co2 = reading.tier1_value(Gas::Co2).unwrap_or(0.0);
        if co2 > self.anomaly_ceiling_kg {
            return Err(ValidationError::AnomalousReading(Anomaly::Co2Spike {
                value: co2,
                ceiling: self.anomaly_ceiling_kg,
            }));
        }

        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading_without(gas: Gas) -> TieredReading {
        let mut reading = TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0);
        reading.tier1.remove(&gas);
        reading
    }

    #[test]
    fn test_complete_reading_passes_unchanged() {
        let reading = TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0);
        let validated = ReadingValidator::default().validate(reading.clone()).unwrap();
        assert_eq!(validated, reading);
    }

    #[test]
    fn test_missing_ch4_or_n2o_is_incomplete() {
        let validator = ReadingValidator::default();
        for gas in [Gas::Ch4, Gas::N2o] {
            let err = validator.validate(reading_without(gas)).unwrap_err();
            assert_eq!(err, ValidationError::IncompleteData { missing: vec![gas] });
            assert_eq!(err.code(), "INCOMPLETE_DATA");
        }
    }

    #[test]
    fn test_missing_gas_ignores_lower_tiers() {
        let mut reading = reading_without(Gas::N2o);
        reading.tier2.co2 = None;
        reading.tier3.co2 = Some(0.0);
        assert!(matches!(
            ReadingValidator::default().validate(reading),
            Err(ValidationError::IncompleteData { .. })
        ));
    }

    #[test]
    fn test_ceiling_is_inclusive_on_accept_side() {
        let validator = ReadingValidator::default();
        assert!(validator
            .validate(TieredReading::new(5000.0, 1.0, 0.1, 0.0, 0.0))
            .is_ok());

        let err = validator
            .validate(TieredReading::new(5001.0, 1.0, 0.1, 0.0, 0.0))
            .unwrap_err();
        assert_eq!(err.code(), "ANOMALOUS_READING");
        assert!(matches!(
            err,
            ValidationError::AnomalousReading(Anomaly::Co2Spike { .. })
        ));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let reading = TieredReading::new(390.0, 1.5, 0.28, -1.0, 20.0);
        let err = ReadingValidator::default().validate(reading).unwrap_err();
        assert_eq!(
            err,
            ValidationError::AnomalousReading(Anomaly::Negative {
                tier: 2,
                gas: Gas::Co2,
                value: -1.0
            })
        );
    }

    #[test]
    fn test_nan_rejected() {
        let reading = TieredReading::new(f64::NAN, 1.5, 0.28, 0.0, 0.0);
        assert!(matches!(
            ReadingValidator::default().validate(reading),
            Err(ValidationError::AnomalousReading(Anomaly::NonFinite { tier: 1, .. }))
        ));
    }

    #[test]
    fn test_error_message_names_missing_gases() {
        let mut reading = TieredReading::new(1.0, 1.0, 1.0, 0.0, 0.0);
        reading.tier1.remove(&Gas::Ch4);
        reading.tier1.remove(&Gas::N2o);
        let err = ReadingValidator::default().validate(reading).unwrap_err();
        assert_eq!(err.to_string(), "Incomplete data: Tier 1 missing CH4, N2O");
    }
}
