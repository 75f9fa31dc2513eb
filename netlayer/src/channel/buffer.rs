//! Line buffer with tail-only prompt detection.
//!
//! Prompt boundaries only ever appear on the trailing line of the output, so
//! boundary checks look at the last non-blank line within `search_depth`
//! bytes of the end rather than rescanning the whole buffer.

use bytes::BytesMut;

use super::patterns::PromptMatcher;

/// Longest unterminated escape sequence carried over to the next chunk.
const MAX_PENDING_ESCAPE: usize = 256;

/// Buffer for accumulating device output.
///
/// ANSI escape sequences and carriage returns are removed on the way in, so
/// lines are always `\n`-separated plain text.
#[derive(Debug)]
pub struct LineBuffer {
    /// The accumulated output buffer.
    buffer: BytesMut,

    /// How many bytes from the end to consider for the trailing line.
    search_depth: usize,

    /// Escape sequence split across reads, held until it terminates.
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create a new line buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            pending: Vec::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escapes and `\r`.
    ///
    /// An escape sequence cut off at the end of `data` is held back and
    /// stripped once the rest of it arrives.
    pub fn extend(&mut self, data: &[u8]) {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(data);
        if let Some(start) = unterminated_escape(&input) {
            if input.len() - start <= MAX_PENDING_ESCAPE {
                self.pending = input.split_off(start);
            }
        }

        let cleaned = strip_ansi_escapes::strip(&input);
        self.buffer
            .extend(cleaned.into_iter().filter(|&b| b != b'\r'));
    }

    /// Byte range of the last non-blank line, restricted to the tail window.
    fn last_line_range(&self) -> Option<(usize, usize)> {
        let floor = self.buffer.len().saturating_sub(self.search_depth);
        let mut end = self.buffer.len();
        while end > floor && self.buffer[end - 1].is_ascii_whitespace() {
            end -= 1;
        }
        if end <= floor {
            return None;
        }

        // buffer[end - 1] is not whitespace, so the line is never blank
        let start = memchr::memrchr(b'\n', &self.buffer[floor..end])
            .map(|pos| floor + pos + 1)
            .unwrap_or(floor);

        Some((start, end))
    }

    /// The last non-blank line, without trailing whitespace.
    pub fn last_line(&self) -> Option<&[u8]> {
        self.last_line_range()
            .map(|(start, end)| &self.buffer[start..end])
    }

    /// Check whether the last non-blank line matches.
    pub fn tail_matches(&self, matcher: &dyn PromptMatcher) -> bool {
        self.last_line().is_some_and(|line| matcher.is_match(line))
    }

    /// Drop the trailing line (used to remove pager banners).
    pub fn truncate_last_line(&mut self) {
        if let Some((start, _)) = self.last_line_range() {
            self.buffer.truncate(start);
        }
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer, including any held escape prefix.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending.clear();
    }
}

/// Start of an escape sequence that `data` ends in the middle of.
fn unterminated_escape(data: &[u8]) -> Option<usize> {
    let start = memchr::memrchr(0x1b, data)?;
    let rest = &data[start + 1..];
    let complete = match rest.first() {
        None => false,
        // CSI ends at its final byte
        Some(b'[') => rest[1..].iter().any(|b| (0x40..=0x7e).contains(b)),
        // OSC ends at BEL; an ESC \\ terminator is found as the later ESC
        Some(b']') => rest[1..].contains(&0x07),
        // Intermediate bytes, then one final byte
        Some(b) if (0x20..=0x2f).contains(b) => {
            rest[1..].iter().any(|b| (0x30..=0x7e).contains(b))
        }
        Some(_) => true,
    };
    (!complete).then_some(start)
}
