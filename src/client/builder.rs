//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and connecting [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use linecorr::Client;
//!
//! # async fn example() -> linecorr::Result<()> {
//! let client = Client::builder()
//!     .host("localhost")
//!     .port(14789)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::sink::{LogSink, UiSink};

use super::core::Client;
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Clone, Default)]
pub struct ClientBuilder {
    /// Connection and polling options.
    options: ClientOptions,
    /// Receiver of special messages. Defaults to [`LogSink`].
    sink: Option<Arc<dyn UiSink>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("options", &self.options)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// Sets the service port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Sets the default reply timeout.
    #[inline]
    #[must_use]
    pub fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.options.reply_timeout = timeout;
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the receiver of special messages.
    #[inline]
    #[must_use]
    pub fn sink(mut self, sink: impl UiSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets an already shared receiver of special messages.
    #[inline]
    #[must_use]
    pub fn shared_sink(mut self, sink: Arc<dyn UiSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the options configured so far.
    #[inline]
    #[must_use]
    pub fn current_options(&self) -> &ClientOptions {
        &self.options
    }

    /// Validates options, connects, and starts polling.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](crate::Error::Config) if options are invalid
    /// - [`Error::ConnectionTimeout`](crate::Error::ConnectionTimeout) if connecting takes too long
    /// - [`Error::Connection`](crate::Error::Connection) if the service is unreachable
    pub async fn connect(self) -> Result<Client> {
        self.options.validate()?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(LogSink));
        Client::connect(self.options, sink).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::sink::SpecialMessage;

    #[test]
    fn test_new_uses_default_options() {
        let builder = ClientBuilder::new();
        assert_eq!(builder.current_options(), &ClientOptions::default());
        assert!(builder.sink.is_none());
    }

    #[test]
    fn test_setters() {
        let builder = ClientBuilder::new()
            .host("127.0.0.1")
            .port(4000)
            .poll_interval(Duration::from_millis(20))
            .reply_timeout(Duration::from_secs(3));

        let options = builder.current_options();
        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.port, 4000);
        assert_eq!(options.poll_interval, Duration::from_millis(20));
        assert_eq!(options.reply_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_sink_sets_receiver() {
        let builder = ClientBuilder::new().sink(|_: SpecialMessage| {});
        assert!(builder.sink.is_some());
        assert!(format!("{builder:?}").contains("has_sink: true"));
    }

    #[tokio::test]
    async fn test_connect_fails_with_invalid_options() {
        let err = ClientBuilder::new().port(0).connect().await.unwrap_err();
        assert!(err.to_string().contains("port"));
    }
}
