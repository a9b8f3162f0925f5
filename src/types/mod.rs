//! Core data types for the emissions pipeline
//!
//! - [`TieredReading`]: raw three-tier sensor reading (kg per gas)
//! - [`ProcessedRecord`]: reading plus CO2e, deviation and alert flag
//! - [`PublishPayload`]: downstream projection of a record

mod reading;
mod record;

pub use reading::{CarbonTier, Gas, TieredReading};
pub use record::{Deviation, DeviationBasis, ProcessedRecord, PublishPayload};
