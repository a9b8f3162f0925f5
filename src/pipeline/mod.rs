//! Processing Pipeline Module
//!
//! ## Per-Tick Flow
//!
//! ```text
//! ReadingSource → ReadingValidator → GasConverter → DeviationEstimator
//!               → HistoryBuffer → AlertEvaluator → Publisher
//! ```
//!
//! At most one [`ProcessedRecord`](crate::types::ProcessedRecord) per tick.
//! A reading that fails validation never reaches history or the publisher.

mod history;
mod state;
pub mod processing_loop;
pub mod source;

pub use history::HistoryBuffer;
pub use processing_loop::{PipelineStage, ProcessingLoop, TickOutcome};
pub use source::{CannedSource, ReadingSource, SourceError, StdinSource, TcpSource};
pub use state::*;
