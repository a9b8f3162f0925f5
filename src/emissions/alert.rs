//! Alert evaluation on total CO2e

use crate::config::defaults::ALERT_THRESHOLD_KG;

#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    threshold_kg: f64,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(ALERT_THRESHOLD_KG)
    }
}

impl AlertEvaluator {
    pub fn new(threshold_kg: f64) -> Self {
        Self { threshold_kg }
    }

    pub fn threshold_kg(&self) -> f64 {
        self.threshold_kg
    }

    /// Strictly greater than the threshold. Exactly 1000 kg does not alert.
    pub fn is_alert(&self, co2e: f64) -> bool {
        co2e > self.threshold_kg
    }
}
