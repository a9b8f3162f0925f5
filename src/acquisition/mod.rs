//! Reading acquisition
//!
//! Raw data ingestion: the built-in reference readings and the live TCP
//! listener. The [`ReadingSource`](crate::pipeline::source::ReadingSource)
//! implementations in the pipeline wrap these.

pub mod canned;
pub mod tcp_ingest;

pub use canned::reference_readings;
pub use tcp_ingest::{IngestError, TcpIngest};
