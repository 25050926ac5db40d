//! Partial-frame reassembly across socket reads.
//!
//! Bytes are appended as they arrive. Every complete line is drained at once,
//! in wire order; the unterminated tail stays buffered for the next read.
//! Decoding happens per complete line, so a multi-byte UTF-8 sequence split
//! across two reads is still decoded correctly.
//!
//! After [`ReassemblyBuffer::discard`], incoming bytes are dropped up to and
//! including the next delimiter, so the rest of a discarded frame never
//! surfaces as a line of its own.

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::DELIMITER;

// ============================================================================
// ReassemblyBuffer
// ============================================================================

/// Unterminated bytes read so far.
#[derive(Debug, Default, Clone)]
pub struct ReassemblyBuffer {
    pending: Vec<u8>,
    skipping: bool,
}

impl ReassemblyBuffer {
    /// Creates an empty buffer.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            skipping: false,
        }
    }

    /// Appends freshly received bytes.
    ///
    /// While the remainder of a discarded frame is being skipped, bytes up to
    /// and including the next delimiter are dropped instead.
    pub fn extend(&mut self, bytes: &[u8]) {
        let bytes = if self.skipping {
            let Some(end) = bytes.iter().position(|&b| b == DELIMITER) else {
                return;
            };
            self.skipping = false;
            &bytes[end + 1..]
        } else {
            bytes
        };

        self.pending.extend_from_slice(bytes);
    }

    /// Returns `true` if at least one complete line is buffered.
    #[inline]
    #[must_use]
    pub fn has_complete_frame(&self) -> bool {
        self.pending.contains(&DELIMITER)
    }

    /// Removes and returns every complete line, oldest first.
    ///
    /// Lines are returned without their delimiter and decoded as UTF-8 with
    /// replacement characters for invalid sequences.
    pub fn drain_lines(&mut self) -> Vec<String> {
        let Some(last) = self.pending.iter().rposition(|&b| b == DELIMITER) else {
            return Vec::new();
        };

        let tail = self.pending.split_off(last + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        complete[..last]
            .split(|&b| b == DELIMITER)
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Discards the unterminated tail, returning how many bytes were dropped.
    ///
    /// The rest of that frame is skipped as it arrives.
    pub fn discard(&mut self) -> usize {
        let len = self.pending.len();
        self.pending.clear();
        self.skipping = true;
        len
    }

    /// Returns `true` while the rest of a discarded frame is being skipped.
    #[inline]
    #[must_use]
    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Number of buffered bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if nothing is buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_partial_then_complete() {
        let mut buffer = ReassemblyBuffer::new();

        buffer.extend(b"abc");
        assert!(!buffer.has_complete_frame());
        assert!(buffer.drain_lines().is_empty());
        assert_eq!(buffer.len(), 3);

        buffer.extend(b"de\n");
        assert!(buffer.has_complete_frame());
        assert_eq!(buffer.drain_lines(), vec!["abcde".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_lines_keep_tail() {
        let mut buffer = ReassemblyBuffer::new();

        buffer.extend(b"t1: a\nt2: b\nt3: par");
        assert_eq!(buffer.drain_lines(), vec!["t1: a", "t2: b"]);
        assert_eq!(buffer.len(), "t3: par".len());

        buffer.extend(b"tial\n");
        assert_eq!(buffer.drain_lines(), vec!["t3: partial"]);
    }

    #[test]
    fn test_empty_lines_preserved() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.extend(b"a\n\nb\n");
        assert_eq!(buffer.drain_lines(), vec!["a", "", "b"]);
    }

    #[test]
    fn test_utf8_split_across_reads() {
        let bytes = "t: héllo\n".as_bytes();
        // Split inside the two-byte 'é'.
        let split = 5;
        let mut buffer = ReassemblyBuffer::new();

        buffer.extend(&bytes[..split]);
        assert!(buffer.drain_lines().is_empty());
        buffer.extend(&bytes[split..]);

        assert_eq!(buffer.drain_lines(), vec!["t: héllo"]);
    }

    #[test]
    fn test_invalid_utf8_replaced() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.extend(b"t: \xff\n");
        assert_eq!(buffer.drain_lines(), vec!["t: \u{fffd}"]);
    }

    #[test]
    fn test_discard() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.extend(b"no newline yet");
        assert_eq!(buffer.discard(), 14);
        assert!(buffer.is_empty());
        assert!(buffer.is_skipping());
    }

    #[test]
    fn test_discarded_frame_tail_is_skipped() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.extend(b"0123456789");
        buffer.discard();

        buffer.extend(b"abc");
        assert!(buffer.is_empty());
        assert!(buffer.is_skipping());

        buffer.extend(b"def
t: ok
");
        assert!(!buffer.is_skipping());
        assert_eq!(buffer.drain_lines(), vec!["t: ok"]);
    }

    proptest! {
        #[test]
        fn prop_read_boundaries_do_not_matter(
            lines in proptest::collection::vec("[a-z0-9: ]{0,12}", 1..8),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let stream: Vec<u8> = lines
                .iter()
                .flat_map(|l| l.bytes().chain(std::iter::once(b'\n')))
                .collect();

            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(stream.len() + 1)).collect();
            points.push(0);
            points.push(stream.len());
            points.sort_unstable();
            points.dedup();

            let mut buffer = ReassemblyBuffer::new();
            let mut parsed = Vec::new();
            for window in points.windows(2) {
                buffer.extend(&stream[window[0]..window[1]]);
                parsed.extend(buffer.drain_lines());
            }

            prop_assert_eq!(parsed, lines);
            prop_assert!(buffer.is_empty());
        }
    }
}
