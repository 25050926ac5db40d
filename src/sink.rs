//! Notification sink for messages that have no pending request.
//!
//! The correlator never renders anything itself. Frames it cannot match and
//! connection lifecycle events are handed to a [`UiSink`] supplied by the
//! host application.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;
use tracing::{info, warn};

// ============================================================================
// SpecialMessage
// ============================================================================

/// Out-of-band notification delivered to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialMessage {
    /// Peer closed the connection. Delivered at most once.
    ConnectionBroken,
    /// A frame whose token matches no pending request.
    Unmatched {
        /// The raw frame line, without its delimiter.
        line: String,
    },
    /// A partial frame grew past the size limit and was discarded.
    FrameTooLong {
        /// Bytes discarded.
        len: usize,
    },
}

impl fmt::Display for SpecialMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionBroken => f.write_str("connection broken"),
            Self::Unmatched { line } => f.write_str(line),
            Self::FrameTooLong { len } => write!(f, "frame too long ({len} bytes discarded)"),
        }
    }
}

// ============================================================================
// UiSink
// ============================================================================

/// Receiver of special messages.
///
/// Called from the poll step; implementations must not block.
pub trait UiSink: Send + Sync {
    /// Delivers one special message.
    fn on_special_message(&self, message: SpecialMessage);
}

impl<F> UiSink for F
where
    F: Fn(SpecialMessage) + Send + Sync,
{
    fn on_special_message(&self, message: SpecialMessage) {
        self(message);
    }
}

impl UiSink for mpsc::UnboundedSender<SpecialMessage> {
    fn on_special_message(&self, message: SpecialMessage) {
        // Receiver gone means nobody is listening any more.
        let _ = self.send(message);
    }
}

// ============================================================================
// LogSink
// ============================================================================

/// Sink that only logs. Used when the host supplies none.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl UiSink for LogSink {
    fn on_special_message(&self, message: SpecialMessage) {
        match message {
            SpecialMessage::ConnectionBroken => info!("Special message: connection broken"),
            other => warn!(message = %other, "Special message"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
