//! Piece records: non-owning views into pool buffers.

use crate::table::pool::{BufferId, BufferPool};

/// A contiguous sub-range of one pool buffer, with the newline bookkeeping
/// needed to answer line queries without rescanning bytes.
///
/// A piece never owns bytes and never changes which buffer it references.
/// Cutting one produces two pieces over disjoint sub-ranges of the same
/// buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    /// Buffer this piece reads from.
    pub buffer: BufferId,
    /// Start offset within the buffer.
    pub start: usize,
    /// Length in bytes.
    pub len: usize,
    /// Newlines contained in the piece's own range.
    pub newlines: usize,
    /// Index into the buffer's newline table where this piece's newlines
    /// begin.
    pub(crate) line_table_start: usize,
}

impl Piece {
    /// Cut the piece `off` bytes in, yielding the left and right halves.
    ///
    /// The left half's newline count comes from a binary search of the owning
    /// buffer's newline table; the right half is derived by subtraction. No
    /// bytes are scanned or copied, and neither half is empty: callers resolve
    /// boundary offsets without cutting.
    pub(crate) fn cut(self, off: usize, pool: &BufferPool<'_>) -> (Self, Self) {
        debug_assert!(off > 0 && off < self.len, "cut must fall strictly inside");
        let left_newlines = pool.buffer(self.buffer).newlines_before(
            self.line_table_start,
            self.newlines,
            self.start + off,
        );
        let left = Self {
            len: off,
            newlines: left_newlines,
            ..self
        };
        let right = Self {
            start: self.start + off,
            len: self.len - off,
            newlines: self.newlines - left_newlines,
            line_table_start: self.line_table_start + left_newlines,
            ..self
        };
        (left, right)
    }

    /// Newlines within the piece falling strictly before `buffer_offset`.
    pub(crate) fn newlines_before(&self, buffer_offset: usize, pool: &BufferPool<'_>) -> usize {
        pool.buffer(self.buffer)
            .newlines_before(self.line_table_start, self.newlines, buffer_offset)
    }
}
