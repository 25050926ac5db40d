//! Connected command client.
//!
//! The [`Client`] owns one TCP connection, the correlator built on it, and
//! the poller task driving the correlator.
//!
//! # Example
//!
//! ```no_run
//! use linecorr::Client;
//!
//! # async fn example() -> linecorr::Result<()> {
//! let client = Client::builder().port(14789).connect().await?;
//!
//! let reply = client.request("PING").await?.await?;
//! assert_eq!(reply, "PONG");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::correlator::{Correlator, PendingReply, ReplyCallback};
use crate::error::Result;
use crate::identifiers::Token;
use crate::protocol::TokenGenerator;
use crate::sink::UiSink;
use crate::transport::TcpConnection;

use super::builder::ClientBuilder;
use super::options::ClientOptions;

// ============================================================================
// Client
// ============================================================================

/// A connected client with a running poller.
///
/// Dropping the client stops the poller.
pub struct Client {
    correlator: Arc<Correlator<TcpConnection>>,
    poller: JoinHandle<()>,
    options: ClientOptions,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.correlator.transport().peer())
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructor
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Connects using `options` and starts the poller.
    ///
    /// Options are assumed valid; [`ClientBuilder::connect`] validates them.
    pub(crate) async fn connect(options: ClientOptions, sink: Arc<dyn UiSink>) -> Result<Self> {
        let connection = TcpConnection::connect_with_timeouts(
            &options.host,
            options.port,
            options.connect_timeout,
            options.read_timeout,
        )
        .await?;

        let tokens = if options.salt_tokens {
            TokenGenerator::new()
        } else {
            TokenGenerator::unsalted()
        };

        let correlator = Arc::new(Correlator::with_settings(
            connection,
            sink,
            tokens,
            options.correlator_settings(),
        ));
        let poller = Arc::clone(&correlator).spawn_poller(options.poll_interval);

        debug!(
            poll_interval_ms = u64::try_from(options.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "Poller started"
        );

        Ok(Self {
            correlator,
            poller,
            options,
        })
    }
}

// ============================================================================
// Client - Public API
// ============================================================================

impl Client {
    /// Sends `command`, returning the token its reply will carry.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed) after the peer closed
    /// - [`Error::Connection`](crate::Error::Connection) if the write fails
    pub async fn send_command(&self, command: &str) -> Result<Token> {
        self.correlator.send_command(command).await
    }

    /// Sends `command` and returns a future resolving to its reply.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn request(&self, command: &str) -> Result<PendingReply> {
        self.correlator.request(command).await
    }

    /// Sends `command` with a specific reply timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn request_with_timeout(
        &self,
        command: &str,
        reply_timeout: Duration,
    ) -> Result<PendingReply> {
        self.correlator
            .request_with_timeout(command, reply_timeout)
            .await
    }

    /// Hooks `callback` under a fresh token, then sends `command`.
    ///
    /// Uses the configured reply timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn send_hooked(&self, command: &str, callback: ReplyCallback) -> Result<Token> {
        self.correlator
            .send_hooked(command, self.options.reply_timeout, callback)
            .await
    }

    /// Registers a reply callback for `token`.
    pub fn hook(&self, token: Token, callback: ReplyCallback) {
        self.correlator.hook(token, callback);
    }

    /// Registers a reply callback for `token` with a specific timeout.
    pub fn hook_with_timeout(&self, token: Token, timeout: Duration, callback: ReplyCallback) {
        self.correlator.hook_with_timeout(token, timeout, callback);
    }

    /// Removes the callback for `token` without invoking it.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if nothing is hooked.
    pub fn unhook(&self, token: &str) -> Result<ReplyCallback> {
        self.correlator.unhook(token)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlator.pending_count()
    }

    /// Returns `true` once the peer has closed the connection.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.correlator.is_closed()
    }

    /// Returns the options the client was connected with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Stops polling and closes the write half of the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the socket shutdown fails.
    pub async fn shutdown(self) -> Result<()> {
        self.poller.abort();
        self.correlator.transport().shutdown().await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
