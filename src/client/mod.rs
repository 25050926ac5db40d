//! Command client module.
//!
//! This module provides the main entry point for talking to the service.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connected client with a running poller |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Connection and polling options |
//!
//! # Example
//!
//! ```no_run
//! use linecorr::{Client, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .host("localhost")
//!     .port(14789)
//!     .connect()
//!     .await?;
//!
//! let token = client.send_command("version").await?;
//! client.hook(token, Box::new(|reply| println!("{reply:?}")));
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Connected client.
pub mod core;

/// Connection and polling options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Client;
pub use builder::ClientBuilder;
pub use options::{ClientOptions, DEFAULT_HOST, DEFAULT_PORT};
