//! Client connection options.
//!
//! Provides a type-safe interface for where to connect and how the
//! correlator polls and times out.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use linecorr::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_host("127.0.0.1")
//!     .with_port(14789)
//!     .with_reply_timeout(Duration::from_secs(30));
//! ```
//!
//! Options are `serde` serializable; missing fields take their defaults, so
//! a host application can persist only what the user changed.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::correlator::{
    CorrelatorSettings, DEFAULT_MAX_FRAME_LEN, DEFAULT_POLL_INTERVAL, DEFAULT_READ_CHUNK,
    DEFAULT_REPLY_TIMEOUT,
};
use crate::error::{Error, Result};
use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT};

// ============================================================================
// Constants
// ============================================================================

/// Default service host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default service port.
pub const DEFAULT_PORT: u16 = 14789;

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection and polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Service host name or address.
    pub host: String,

    /// Service TCP port.
    pub port: u16,

    /// Upper bound on establishing the TCP stream.
    pub connect_timeout: Duration,

    /// Interval between poll steps.
    pub poll_interval: Duration,

    /// Upper bound on one receive attempt.
    pub read_timeout: Duration,

    /// Bytes requested per receive attempt.
    pub read_chunk_size: usize,

    /// Time a hooked request waits for its reply.
    pub reply_timeout: Duration,

    /// Largest unterminated frame kept before it is discarded.
    pub max_frame_len: usize,

    /// Mix a per-process random salt into correlation tokens.
    pub salt_tokens: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_chunk_size: DEFAULT_READ_CHUNK,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            salt_tokens: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the service host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the service port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the per-read timeout.
    #[inline]
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the read chunk size.
    #[inline]
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Sets the default reply timeout.
    #[inline]
    #[must_use]
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Sets the maximum unterminated frame length.
    #[inline]
    #[must_use]
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Disables token salting, reproducing plain timestamp+text tokens.
    #[inline]
    #[must_use]
    pub fn without_token_salt(mut self) -> Self {
        self.salt_tokens = false;
        self
    }
}

// ============================================================================
// Conversion
// ============================================================================

impl ClientOptions {
    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("port must be non-zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::config("poll_interval must be non-zero"));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::config("read_timeout must be non-zero"));
        }
        if self.read_timeout > self.poll_interval {
            return Err(Error::config(format!(
                "read_timeout ({}ms) must not exceed poll_interval ({}ms)",
                self.read_timeout.as_millis(),
                self.poll_interval.as_millis()
            )));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::config("read_chunk_size must be non-zero"));
        }
        if self.reply_timeout.is_zero() {
            return Err(Error::config("reply_timeout must be non-zero"));
        }
        if self.max_frame_len == 0 {
            return Err(Error::config("max_frame_len must be non-zero"));
        }
        Ok(())
    }

    /// Returns the correlator settings derived from these options.
    #[must_use]
    pub fn correlator_settings(&self) -> CorrelatorSettings {
        CorrelatorSettings {
            read_chunk: self.read_chunk_size,
            reply_timeout: self.reply_timeout,
            max_frame_len: self.max_frame_len,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
