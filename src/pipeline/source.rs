//! Reading source abstraction for the pipeline.
//!
//! Provides a unified trait for obtaining one raw [`TieredReading`] per tick
//! from different sources: the canned reference cycle, a TCP listener and
//! stdin (JSON lines).

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};

use crate::acquisition::{reference_readings, IngestError, TcpIngest};
use crate::types::TieredReading;

/// Why a source could not produce a reading this tick.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("TCP ingest failed: {0}")]
    Ingest(#[from] IngestError),

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid reading JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Source closed")]
    Closed,
}

impl SourceError {
    /// Stable reason code for logs and counters.
    pub fn code(&self) -> &'static str {
        "SOURCE_UNAVAILABLE"
    }
}

/// Trait abstracting where raw readings come from.
///
/// The processing loop calls [`next_reading`](ReadingSource::next_reading)
/// once per tick inside a `select!` with cancellation. Errors are not fatal:
/// the tick ends early and the next tick asks again.
#[async_trait]
pub trait ReadingSource: Send + 'static {
    async fn next_reading(&mut self) -> Result<TieredReading, SourceError>;

    /// Human-readable name for logging (e.g. "canned", "tcp", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Canned Source (reference cycle)
// ============================================================================

/// Cycles through a fixed list of readings forever, in order.
pub struct CannedSource {
    readings: Vec<TieredReading>,
    next: usize,
}

impl CannedSource {
    /// Cycle over the six reference readings.
    pub fn reference() -> Self {
        Self::new(reference_readings())
    }

    pub fn new(readings: Vec<TieredReading>) -> Self {
        Self { readings, next: 0 }
    }
}

#[async_trait]
impl ReadingSource for CannedSource {
    async fn next_reading(&mut self) -> Result<TieredReading, SourceError> {
        if self.readings.is_empty() {
            return Err(SourceError::Closed);
        }
        let reading = self.readings[self.next].clone();
        self.next = (self.next + 1) % self.readings.len();
        Ok(reading)
    }

    fn source_name(&self) -> &str {
        "canned"
    }
}

// ============================================================================
// TCP Source (one JSON reading per connection)
// ============================================================================

/// Waits for the next sender on the ingest listener.
pub struct TcpSource {
    ingest: TcpIngest,
}

impl TcpSource {
    pub async fn bind(addr: &str) -> Result<Self, SourceError> {
        Ok(Self {
            ingest: TcpIngest::bind(addr).await?,
        })
    }

    pub fn from_ingest(ingest: TcpIngest) -> Self {
        Self { ingest }
    }
}

#[async_trait]
impl ReadingSource for TcpSource {
    async fn next_reading(&mut self) -> Result<TieredReading, SourceError> {
        Ok(self.ingest.receive().await?)
    }

    fn source_name(&self) -> &str {
        "tcp"
    }
}

// ============================================================================
// Stdin Source (JSON readings, one per line)
// ============================================================================

/// Reads JSON-formatted readings from stdin.
///
/// `simulate_sensor | emissions-edge --source stdin`
///
/// Each tick consumes one non-empty line. A malformed line is reported as a
/// decode failure for that tick; EOF is reported as [`SourceError::Closed`]
/// on every subsequent tick.
pub struct StdinSource {
    reader: BufReader<Stdin>,
    line_buffer: String,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            line_buffer: String::with_capacity(256),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for StdinSource {
    async fn next_reading(&mut self) -> Result<TieredReading, SourceError> {
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Err(SourceError::Closed);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(serde_json::from_str(line)?);
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_source_cycles_in_order() {
        let mut source = CannedSource::reference();
        let expected = reference_readings();

        for round in 0..2 {
            for (i, want) in expected.iter().enumerate() {
                let got = source.next_reading().await.unwrap();
                assert_eq!(&got, want, "round {round} reading {i}");
            }
        }
    }

    #[tokio::test]
    async fn test_empty_canned_source_is_closed() {
        let mut source = CannedSource::new(Vec::new());
        let err = source.next_reading().await.unwrap_err();
        assert!(matches!(err, SourceError::Closed));
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    }
}
