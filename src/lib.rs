//! emissions-edge: Edge Greenhouse-Gas Emissions Pipeline
//!
//! Ingests periodic multi-tier gas readings, converts them to CO2-equivalent,
//! keeps a bounded rolling history, flags anomalies and threshold breaches,
//! and forwards every processed reading downstream.
//!
//! ## Architecture
//!
//! - **Emissions**: validation, GWP conversion, baseline deviation, alerting
//! - **Pipeline**: tick-driven loop over a [`ReadingSource`], shared context
//! - **Publish**: log, MQTT and HTTP sinks for processed records
//! - **Advisory**: MQTT listener feeding the latest cloud recommendation
//! - **API**: read-only HTTP reporting surface

pub mod acquisition;
pub mod advisory;
pub mod api;
pub mod baseline;
pub mod config;
pub mod emissions;
pub mod pipeline;
pub mod publish;
pub mod types;

// Re-export configuration
pub use config::EdgeConfig;

// Re-export commonly used types
pub use types::{Deviation, DeviationBasis, Gas, ProcessedRecord, PublishPayload, TieredReading};

// Re-export domain stages
pub use emissions::{
    AlertEvaluator, DeviationEstimator, GasConverter, GwpTable, ReadingValidator, ValidationError,
};

// Re-export pipeline components
pub use pipeline::{
    HistoryBuffer, LatestRecommendation, PipelineContext, PipelineStats, ProcessingLoop,
    ReadingSource, SourceError, TickOutcome,
};

// Re-export sinks and baseline
pub use baseline::{Baseline, BaselineSource, BaselineStatus};
pub use publish::{PublishError, Publisher};
