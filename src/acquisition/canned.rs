//! Reference readings replayed by the canned source
//!
//! Six readings from a representative facility, ordered as they were
//! recorded. Expected CO2e values (kg, standard GWP table):
//!
//! | # | Tier 1 CO2 / CH4 / N2O | Tier 2 | Tier 3 | CO2e     |
//! |---|------------------------|--------|--------|----------|
//! | 1 | 390.0 / 1.5 / 0.28     | 50     | 20     | 580.94   |
//! | 2 | 800.0 / 5.0 / 0.70     | 80     | 30     | 1243.60  |
//! | 3 | 600.0 / 3.0 / 0.50     | 60     | 25     | 909.00   |
//! | 4 | 420.0 / 2.0 / 0.35     | 55     | 22     | 651.30   |
//! | 5 | 405.2 / 1.7 / 0.30     | 52     | 21     | 610.10   |
//! | 6 | 410.5 / 1.8 / 0.32     | 53     | 23     | 626.86   |

use crate::types::TieredReading;

/// The six reference readings in replay order.
pub fn reference_readings() -> Vec<TieredReading> {
    vec![
        TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0),
        TieredReading::new(800.0, 5.0, 0.70, 80.0, 30.0),
        TieredReading::new(600.0, 3.0, 0.50, 60.0, 25.0),
        TieredReading::new(420.0, 2.0, 0.35, 55.0, 22.0),
        TieredReading::new(405.2, 1.7, 0.30, 52.0, 21.0),
        TieredReading::new(410.5, 1.8, 0.32, 53.0, 23.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::ReadingValidator;

    #[test]
    fn test_reference_readings_are_valid() {
        let validator = ReadingValidator::default();
        let readings = reference_readings();
        assert_eq!(readings.len(), 6);
        for reading in readings {
            assert!(validator.validate(reading).is_ok());
        }
    }
}
