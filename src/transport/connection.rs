//! TCP connection carrying newline-delimited text.
//!
//! The read and write halves are locked independently: any number of callers
//! may send commands while the poll step reads, but two writes (or two reads)
//! never interleave.
//!
//! # Reads
//!
//! [`Transport::try_receive`] never waits longer than the configured read
//! timeout. Timing out is reported as [`Received::WouldBlock`]; no bytes are
//! lost because tokio socket reads are cancel safe.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, trace};

use crate::error::{Error, Result};
use crate::protocol::DELIMITER;

// ============================================================================
// Constants
// ============================================================================

/// Default upper bound on a single receive attempt.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Default timeout for establishing the TCP stream.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Received
// ============================================================================

/// Outcome of a bounded receive attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Bytes that were immediately available.
    Data(Vec<u8>),
    /// Nothing arrived within the read timeout.
    WouldBlock,
    /// Peer closed the stream (zero-length read).
    Closed,
}

// ============================================================================
// Transport
// ============================================================================

/// Byte-level transport used by the correlator.
///
/// Implemented by [`TcpConnection`]; tests drive the correlator through
/// in-memory implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Writes `text` followed by the frame delimiter.
    ///
    /// The line reaches the peer whole with respect to other senders.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if the stream is broken.
    async fn send_line(&self, text: &str) -> Result<()>;

    /// Returns bytes immediately available, up to `max_bytes`.
    ///
    /// # Errors
    ///
    /// Any read failure other than a timeout.
    async fn try_receive(&self, max_bytes: usize) -> Result<Received>;
}

// ============================================================================
// TcpConnection
// ============================================================================

/// A single long-lived TCP stream to the command service.
#[derive(Debug)]
pub struct TcpConnection {
    /// Read half, used only by the poll step.
    reader: Mutex<OwnedReadHalf>,
    /// Write half, shared by all senders.
    writer: Mutex<OwnedWriteHalf>,
    /// Upper bound on one receive attempt.
    read_timeout: Duration,
    /// Peer address for diagnostics.
    peer: String,
}

impl TcpConnection {
    /// Connects to `host:port` with default timeouts.
    ///
    /// # Errors
    ///
    /// See [`connect_with_timeouts`](Self::connect_with_timeouts).
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        Self::connect_with_timeouts(host, port, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
            .await
    }

    /// Connects to `host:port`. No retry is attempted.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the stream is not up within `connect_timeout`
    /// - [`Error::Connection`] if the peer is unreachable
    pub async fn connect_with_timeouts(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self> {
        let peer = format!("{host}:{port}");

        let timeout_ms = u64::try_from(connect_timeout.as_millis()).unwrap_or(u64::MAX);
        let stream = timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::connection_timeout(timeout_ms))?
            .map_err(|e| Error::connection(format!("{peer} unreachable: {e}")))?;

        // Command lines are small and latency matters more than batching.
        stream.set_nodelay(true)?;

        info!(%peer, "Connected");

        Ok(Self::from_stream(stream, read_timeout, peer))
    }

    /// Wraps an already connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream, read_timeout: Duration, peer: impl Into<String>) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            read_timeout,
            peer: peer.into(),
        }
    }

    /// Returns the peer address this connection was opened to.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Returns the receive timeout.
    #[inline]
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Shuts down the write half, signalling end of stream to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the shutdown fails.
    pub async fn shutdown(&self) -> Result<()> {
        self.writer.lock().await.shutdown().await?;
        debug!(peer = %self.peer, "Write half shut down");
        Ok(())
    }
}

#[async_trait]
impl Transport for TcpConnection {
    async fn send_line(&self, text: &str) -> Result<()> {
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(DELIMITER);

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| Error::connection(format!("send to {} failed: {e}", self.peer)))?;

        trace!(bytes = line.len(), "Line sent");
        Ok(())
    }

    async fn try_receive(&self, max_bytes: usize) -> Result<Received> {
        let mut buf = vec![0u8; max_bytes.max(1)];
        let mut reader = self.reader.lock().await;

        match timeout(self.read_timeout, reader.read(&mut buf)).await {
            Err(_) => Ok(Received::WouldBlock),
            Ok(Ok(0)) => Ok(Received::Closed),
            Ok(Ok(n)) => {
                buf.truncate(n);
                trace!(bytes = n, "Bytes received");
                Ok(Received::Data(buf))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(Received::WouldBlock),
            Ok(Err(e)) => Err(Error::Io(e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
