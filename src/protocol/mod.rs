//! Line protocol message types.
//!
//! This module defines the wire format shared by client and service.
//!
//! # Protocol Overview
//!
//! | Direction | Frame |
//! |-----------|-------|
//! | Client → Server | `<token>: <command text>\n` |
//! | Server → Client | `<token>: <reply text>\n` |
//!
//! Tokens are lowercase hex SHA-256 digests, see [`TokenGenerator`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `frame` | Frame parsing and encoding |
//! | `token` | Correlation token generation |

// ============================================================================
// Submodules
// ============================================================================

/// Frame parsing and encoding.
pub mod frame;

/// Correlation token generation.
pub mod token;

// ============================================================================
// Re-exports
// ============================================================================

pub use frame::{DELIMITER, Frame, SEPARATOR};
pub use token::{TOKEN_LEN, TokenGenerator};
