//! Line frame encoding and parsing.
//!
//! A frame is a single newline-terminated line of UTF-8 text:
//!
//! ```text
//! <token>: <payload>\n
//! ```
//!
//! The token is everything before the first `": "`. The payload keeps any
//! further separators verbatim.

// ============================================================================
// Imports
// ============================================================================

use crate::identifiers::Token;

// ============================================================================
// Constants
// ============================================================================

/// Separator between token and payload.
pub const SEPARATOR: &str = ": ";

/// Frame delimiter byte.
pub const DELIMITER: u8 = b'\n';

// ============================================================================
// Frame
// ============================================================================

/// A parsed incoming frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Correlation token taken from before the first separator.
    pub token: Token,
    /// Reply text after the first separator.
    pub payload: String,
}

impl Frame {
    /// Parses one line (without its trailing delimiter).
    ///
    /// A line with no separator is a bare token with an empty payload.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        match line.split_once(SEPARATOR) {
            Some((token, payload)) => Self {
                token: Token::from(token),
                payload: payload.to_owned(),
            },
            None => Self {
                token: Token::from(line),
                payload: String::new(),
            },
        }
    }

    /// Builds the outgoing wire text for a command, without the delimiter.
    ///
    /// Newlines inside `text` are not escaped; they would split the frame.
    #[must_use]
    pub fn encode(token: &Token, text: &str) -> String {
        let mut line = String::with_capacity(token.as_str().len() + SEPARATOR.len() + text.len());
        line.push_str(token.as_str());
        line.push_str(SEPARATOR);
        line.push_str(text);
        line
    }
}

// ============================================================================
// Tests
// ============================================================================
