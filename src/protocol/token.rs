//! Correlation token generation.
//!
//! A token is the SHA-256 digest of the issuing timestamp and the command
//! text, rendered as 64 lowercase hex characters. Two commands with identical
//! text issued within the same clock tick hash to the same token; the salted
//! generator only guards against collisions across process runs, not within
//! one tick.

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::identifiers::Token;

// ============================================================================
// Constants
// ============================================================================

/// Length of a generated token in hex characters.
pub const TOKEN_LEN: usize = 64;

// ============================================================================
// TokenGenerator
// ============================================================================

/// Produces correlation tokens for outgoing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    /// Per-process salt mixed into every digest.
    salt: Option<Uuid>,
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGenerator {
    /// Creates a generator salted with a fresh random UUID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            salt: Some(Uuid::new_v4()),
        }
    }

    /// Creates a generator that hashes only timestamp and command text.
    #[inline]
    #[must_use]
    pub const fn unsalted() -> Self {
        Self { salt: None }
    }

    /// Creates a generator with a fixed salt.
    #[inline]
    #[must_use]
    pub const fn with_salt(salt: Uuid) -> Self {
        Self { salt: Some(salt) }
    }

    /// Returns `true` if a salt is mixed into tokens.
    #[inline]
    #[must_use]
    pub const fn is_salted(&self) -> bool {
        self.salt.is_some()
    }

    /// Makes a token for `command` issued now.
    #[must_use]
    pub fn make_token(&self, command: &str) -> Token {
        self.make_token_at(SystemTime::now(), command)
    }

    /// Makes a token for `command` issued at `issued_at`.
    ///
    /// Deterministic for identical inputs.
    #[must_use]
    pub fn make_token_at(&self, issued_at: SystemTime, command: &str) -> Token {
        // Clocks before the epoch collapse to zero.
        let nanos = issued_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        if let Some(salt) = self.salt {
            hasher.update(salt.as_bytes());
        }
        hasher.update(nanos.to_be_bytes());
        hasher.update(command.as_bytes());

        Token::from(hex::encode(hasher.finalize()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn test_token_format() {
        let token = TokenGenerator::new().make_token("PING");
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(token.is_hex());
    }

    #[test]
    fn test_deterministic_for_identical_inputs() {
        let generator = TokenGenerator::unsalted();
        let at = UNIX_EPOCH + Duration::from_millis(1_300_000_000_123);

        assert_eq!(
            generator.make_token_at(at, "PING"),
            generator.make_token_at(at, "PING")
        );
    }

    #[test]
    fn test_distinct_commands_distinct_tokens() {
        let generator = TokenGenerator::unsalted();
        let at = UNIX_EPOCH + Duration::from_secs(42);

        assert_ne!(
            generator.make_token_at(at, "PING"),
            generator.make_token_at(at, "PONG")
        );
    }

    #[test]
    fn test_distinct_timestamps_distinct_tokens() {
        let generator = TokenGenerator::unsalted();
        let first = UNIX_EPOCH + Duration::from_secs(42);
        let second = first + Duration::from_nanos(1);

        assert_ne!(
            generator.make_token_at(first, "PING"),
            generator.make_token_at(second, "PING")
        );
    }

    #[test]
    fn test_salt_changes_token() {
        let at = UNIX_EPOCH + Duration::from_secs(42);
        let salted = TokenGenerator::with_salt(Uuid::from_u128(7));

        assert!(salted.is_salted());
        assert!(!TokenGenerator::unsalted().is_salted());
        assert_ne!(
            salted.make_token_at(at, "PING"),
            TokenGenerator::unsalted().make_token_at(at, "PING")
        );
    }

    #[test]
    fn test_many_commands_no_collisions() {
        let generator = TokenGenerator::new();
        let base = UNIX_EPOCH + Duration::from_secs(1_000);
        let mut seen = std::collections::HashSet::new();

        for i in 0..1_000u64 {
            let token = generator.make_token_at(base + Duration::from_micros(i), &format!("cmd {i}"));
            assert!(seen.insert(token), "collision at {i}");
        }
    }

    #[test]
    fn test_pre_epoch_clock() {
        let generator = TokenGenerator::unsalted();
        let before = UNIX_EPOCH - Duration::from_secs(5);

        assert_eq!(
            generator.make_token_at(before, "x"),
            generator.make_token_at(UNIX_EPOCH, "x")
        );
    }
}
