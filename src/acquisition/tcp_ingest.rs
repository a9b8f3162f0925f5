//! Live TCP ingest: one JSON reading per accepted connection
//!
//! A sender connects, writes a single JSON-encoded [`TieredReading`] and
//! closes its write half (or the whole connection). The listener reads until
//! EOF, bounded by a byte cap and a read timeout, then decodes.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::debug;

use crate::config::defaults::{TCP_MAX_MESSAGE_BYTES, TCP_READ_TIMEOUT_SECS};
use crate::types::TieredReading;

/// TCP ingest errors
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?} waiting for reading")]
    Timeout(Duration),

    #[error("Reading exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Sender closed without data")]
    Empty,

    #[error("Invalid reading JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Bound listener handing out one reading per connection.
pub struct TcpIngest {
    listener: TcpListener,
    max_bytes: u64,
    read_timeout: Duration,
}

impl TcpIngest {
    /// Bind the listener once; it is reused for every reading.
    pub async fn bind(addr: &str) -> Result<Self, IngestError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| IngestError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            max_bytes: TCP_MAX_MESSAGE_BYTES,
            read_timeout: Duration::from_secs(TCP_READ_TIMEOUT_SECS),
        })
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, IngestError> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next sender and decode its reading.
    ///
    /// Waiting for a connection is unbounded; once connected the sender has
    /// `read_timeout` to deliver at most `max_bytes`.
    pub async fn receive(&self) -> Result<TieredReading, IngestError> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(peer = %peer, "Ingest connection accepted");

        // Read one byte past the cap so an oversized message is detectable.
        let mut buf = Vec::with_capacity(1024);
        let mut limited = stream.take(self.max_bytes + 1);
        tokio::time::timeout(self.read_timeout, limited.read_to_end(&mut buf))
            .await
            .map_err(|_| IngestError::Timeout(self.read_timeout))??;

        if buf.len() as u64 > self.max_bytes {
            return Err(IngestError::PayloadTooLarge {
                limit: self.max_bytes,
            });
        }
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Err(IngestError::Empty);
        }

        Ok(serde_json::from_slice(&buf)?)
    }
}
