//! Processed record types produced once per accepted reading

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Gas, TieredReading};

/// What a [`Deviation`] was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationBasis {
    /// `reading - historical mean` for each Tier 1 gas
    Baseline,
    /// No baseline was available; values are the raw Tier 1 quantities,
    /// NOT a deviation. Consumers must check this before interpreting them.
    RawFallback,
}

/// Per-gas deviation of a reading's Tier 1 values from the historical baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deviation {
    pub basis: DeviationBasis,
    pub values: BTreeMap<Gas, f64>,
}

impl Deviation {
    pub fn is_degraded(&self) -> bool {
        self.basis == DeviationBasis::RawFallback
    }
}

/// One validated, converted and evaluated reading.
///
/// Field names follow the dashboard's history entries
/// (`time`, `data`, `co2e`, `alert`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// Wall-clock time of the tick that produced this record
    pub time: DateTime<Utc>,
    /// The reading exactly as validated
    pub data: TieredReading,
    /// Total CO2-equivalent in kg (unrounded)
    pub co2e: f64,
    pub deviation: Deviation,
    /// True when CO2e exceeded the alert threshold
    pub alert: bool,
}

impl ProcessedRecord {
    /// Projection handed to downstream sinks.
    pub fn publish_payload(&self) -> PublishPayload {
        PublishPayload {
            time: self.time.to_rfc3339(),
            co2e: self.co2e,
            raw: self.data.clone(),
        }
    }
}

/// Downstream message: `{"time": ISO-8601, "CO2e": kg, "raw": reading}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPayload {
    pub time: String,
    #[serde(rename = "CO2e")]
    pub co2e: f64,
    pub raw: TieredReading,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ProcessedRecord {
        let data = TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0);
        ProcessedRecord {
            time: Utc::now(),
            deviation: Deviation {
                basis: DeviationBasis::RawFallback,
                values: data.tier1.clone(),
            },
            data,
            co2e: 580.94,
            alert: false,
        }
    }

    #[test]
    fn test_publish_payload_shape() {
        let record = sample_record();
        let value = serde_json::to_value(record.publish_payload()).unwrap();

        assert!(value["time"].is_string());
        assert_eq!(value["CO2e"], 580.94);
        assert_eq!(value["raw"]["Tier1"]["CH4"], 1.5);
        assert_eq!(value["raw"]["Tier2"]["CO2"], 50.0);
    }

    #[test]
    fn test_publish_time_is_iso8601() {
        let record = sample_record();
        let payload = record.publish_payload();
        let parsed = DateTime::parse_from_rfc3339(&payload.time).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), record.time);
    }

    #[test]
    fn test_record_serializes_dashboard_fields() {
        let value = serde_json::to_value(sample_record()).unwrap();
        for field in ["time", "data", "co2e", "alert", "deviation"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["deviation"]["basis"], "raw_fallback");
    }
}
