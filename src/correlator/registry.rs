//! Pending request registry.
//!
//! Maps correlation tokens to the callback waiting for the reply. Every entry
//! carries a deadline so tokens that never receive a reply are eventually
//! swept instead of accumulating.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::identifiers::Token;

// ============================================================================
// Types
// ============================================================================

/// Reply callback.
///
/// Invoked at most once: with the payload of the matching frame, or with an
/// error if the request timed out or the connection closed first.
pub type ReplyCallback = Box<dyn FnOnce(Result<String>) + Send>;

/// Deadline used when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A registered callback and when it expires.
struct PendingEntry {
    callback: ReplyCallback,
    deadline: Instant,
    timeout: Duration,
}

// ============================================================================
// PendingRegistry
// ============================================================================

/// Outstanding requests keyed by token.
#[derive(Default)]
pub struct PendingRegistry {
    entries: FxHashMap<Token, PendingEntry>,
}

impl PendingRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for `token`, expiring `timeout` from now.
    ///
    /// An existing entry for the same token is replaced and its callback
    /// dropped without being invoked. Timeouts too large to represent are
    /// clamped to roughly thirty years.
    pub fn insert(&mut self, token: Token, timeout: Duration, callback: ReplyCallback) {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);

        let entry = PendingEntry {
            callback,
            deadline,
            timeout,
        };
        self.entries.insert(token, entry);
    }

    /// Removes the entry for `token`, returning its callback.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no entry exists.
    pub fn remove(&mut self, token: &str) -> Result<ReplyCallback> {
        self.take(token).ok_or_else(|| Error::not_found(token))
    }

    /// Removes the entry for `token` if present.
    #[inline]
    pub fn take(&mut self, token: &str) -> Option<ReplyCallback> {
        self.entries.remove(token).map(|entry| entry.callback)
    }

    /// Removes every entry whose deadline is at or before `now`.
    ///
    /// Returns each expired callback paired with the timeout error it should
    /// receive.
    pub fn expire(&mut self, now: Instant) -> Vec<(ReplyCallback, Error)> {
        let expired: Vec<Token> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(token, _)| token.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|token| {
                let entry = self.entries.remove(&token)?;
                let timeout_ms = u64::try_from(entry.timeout.as_millis()).unwrap_or(u64::MAX);
                Some((entry.callback, Error::request_timeout(token, timeout_ms)))
            })
            .collect()
    }

    /// Removes and returns every callback.
    pub fn drain(&mut self) -> Vec<ReplyCallback> {
        self.entries.drain().map(|(_, entry)| entry.callback).collect()
    }

    /// Returns `true` if `token` is pending.
    #[inline]
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Number of pending requests.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
