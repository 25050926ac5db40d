//! linecorr - line-oriented command client with reply correlation.
//!
//! This library sends free-form text commands to a remote service over one
//! persistent TCP connection and matches each reply back to the caller that
//! issued the command.
//!
//! # Architecture
//!
//! The client follows a request/reply model over a text-line protocol:
//!
//! - **Outgoing**: `<token>: <command>\n`, where the token is a hex digest
//! - **Incoming**: `<token>: <reply>\n`, matched to the pending request
//! - **Special messages**: unmatched frames and connection loss go to a
//!   [`UiSink`]
//!
//! Key design principles:
//!
//! - The [`Correlator`] owns the pending registry and reassembly buffer
//! - The transport is injected, so the correlator runs against any [`Transport`]
//! - A periodic poll step drains every complete frame, in wire order
//! - Untrusted frames never crash the poller
//!
//! # Quick Start
//!
//! ```no_run
//! use linecorr::{Client, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .host("localhost")
//!         .port(14789)
//!         .connect()
//!         .await?;
//!
//!     // Future style
//!     let reply = client.request("PING").await?.await?;
//!     println!("reply: {reply}");
//!
//!     // Callback style
//!     let token = client.send_command("status").await?;
//!     client.hook(token, Box::new(|reply| println!("status: {reply:?}")));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], builder and options |
//! | [`console`] | Command transcript for a raw console |
//! | [`correlator`] | Token registry, reassembly, poll loop |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe token wrapper |
//! | [`protocol`] | Frame format and token generation |
//! | [`sink`] | Special message sink |
//! | [`transport`] | TCP transport |

// ============================================================================
// Modules
// ============================================================================

/// Connected client, builder and options.
///
/// Use [`Client::builder()`] to configure and connect.
pub mod client;

/// Command transcript for a raw console view.
pub mod console;

/// Request/reply correlation and the poll loop.
pub mod correlator;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Line protocol: frames and tokens.
pub mod protocol;

/// Receiver of special messages.
pub mod sink;

/// TCP transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientOptions};

// Console types
pub use console::Transcript;

// Correlator types
pub use correlator::{Correlator, CorrelatorSettings, PendingReply, PollOutcome, ReplyCallback};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::Token;

// Protocol types
pub use protocol::{Frame, TokenGenerator};

// Sink types
pub use sink::{LogSink, SpecialMessage, UiSink};

// Transport types
pub use transport::{Received, TcpConnection, Transport};
