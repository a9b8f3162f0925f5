//! Emissions domain stages: validation, CO2e conversion, baseline deviation
//! and alert evaluation.
//!
//! Each stage is a pure function of its inputs; orchestration lives in
//! [`crate::pipeline`].

mod alert;
mod deviation;
mod gwp;
mod validator;

pub use alert::AlertEvaluator;
pub use deviation::DeviationEstimator;
pub use gwp::{GasConverter, GwpTable};
pub use validator::{Anomaly, ReadingValidator, ValidationError};
