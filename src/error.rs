//! Error types for linecorr.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use linecorr::{Client, Result};
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let reply = client.request("status").await?.await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Correlation | [`Error::NotFound`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::ChannelClosed`] |
//!
//! Malformed or unmatched frames are not errors: the poll step forwards
//! them to the [`UiSink`](crate::sink::UiSink) as special messages.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;

use crate::identifiers::Token;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options fail validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport unavailable or broken.
    ///
    /// Returned when the peer is unreachable or a write hits a broken pipe.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection attempt did not complete in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Connection closed by the peer.
    ///
    /// Returned for sends after the poller observed closure, and delivered
    /// to every request still pending when that happens.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Correlation Errors
    // ========================================================================
    /// No pending request registered under this token.
    ///
    /// Returned by `unhook`. Callers usually treat it as a no-op.
    #[error("No pending request for token {token}")]
    NotFound {
        /// The unknown token.
        token: String,
    },

    /// No reply arrived before the request's deadline.
    ///
    /// Delivered to the reply callback when the poll step sweeps the entry.
    #[error("Request {token} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The token that timed out.
        token: Token,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Reply channel dropped before a reply was delivered.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a not found error.
    #[inline]
    pub fn not_found(token: impl Into<String>) -> Self {
        Self::NotFound {
            token: token.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(token: Token, timeout_ms: u64) -> Self {
        Self::RequestTimeout { token, timeout_ms }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::Io(_)
        )
    }

    /// Returns `true` if this is a not found error.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// A recoverable error leaves the connection usable.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::RequestTimeout { .. } | Self::ChannelClosed(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
