//! Type-safe identifier wrappers.
//!
//! The wire protocol identifies a request by an opaque hex token. Wrapping it
//! keeps tokens from being confused with command text or payloads.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Token
// ============================================================================

/// Correlation token identifying one outstanding request.
///
/// Produced by [`TokenGenerator`](crate::protocol::TokenGenerator) as a
/// lowercase hex digest, but any string read off the wire can be wrapped:
/// incoming tokens are untrusted and only compared against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(String);

impl Token {
    /// Wraps a raw token string.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token is non-empty lowercase hex.
    #[must_use]
    pub fn is_hex(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Consumes the token, returning the inner string.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    #[inline]
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    #[inline]
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Borrow<str> for Token {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Tests
// ============================================================================
