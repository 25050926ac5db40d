//! TCP transport layer.
//!
//! This module owns the raw socket between the client and the command
//! service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Correlator     │                              │  Command        │
//! │                 │        TCP, text lines       │  service        │
//! │  Transport      │◄────────────────────────────►│                 │
//! │  → TcpConnection│        host:port             │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | `Transport` trait and TCP implementation |

// ============================================================================
// Submodules
// ============================================================================

/// Transport trait and TCP connection.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Received, TcpConnection, Transport,
};
