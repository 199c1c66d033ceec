//! The piece table: an editable byte buffer over immutable byte ranges.
//!
//! Content is a catalog of [`Piece`]s, each referencing a sub-range of one
//! pool buffer. Inserted and appended text lands at the tail of two growable
//! buffers; externally supplied origin spans are referenced in place, never
//! copied. Each buffer keeps an ascending newline-offset table so the catalog
//! can answer both byte-offset and line queries in O(log n).
//!
//! All mutation is single-threaded and synchronous. A [`SpanIter`] borrows the
//! table, so the borrow checker rules out reading across a mutation.
//!
//! # Examples
//!
//! ```
//! use astbuf::PieceTable;
//!
//! let mut table = PieceTable::new();
//! table.append("abc\n");
//! table.append("def");
//! assert_eq!(table.size(), 7);
//! assert_eq!(table.line_count(), 2);
//! assert_eq!(table.line_string(0).unwrap(), "abc\n");
//! assert_eq!(table.line_string(1).unwrap(), "def");
//! ```

mod iter;
mod piece;
mod pool;
mod tree;

pub use iter::SpanIter;
pub use piece::Piece;
pub use pool::BufferId;

use crate::error::{Error, Result};
use crate::syntax::Point;
use pool::{APPEND, BufferPool, INSERT};
use tree::PieceTree;

/// Editable text buffer backed by a piece table.
///
/// The lifetime `'a` bounds every origin span attached with
/// [`append_origin`](Self::append_origin) or
/// [`insert_origin`](Self::insert_origin): the caller keeps those spans alive
/// and unchanged for as long as the table references them; the table neither
/// copies nor refcounts them.
///
/// Offsets and lengths are bytes. Line numbers are 0-indexed;
/// [`line_string`](Self::line_string) includes the terminating newline, and
/// the final line (or an empty buffer's only line) has none.
#[derive(Clone, Debug)]
pub struct PieceTable<'a> {
    pool: BufferPool<'a>,
    tree: PieceTree,
}

impl<'a> PieceTable<'a> {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool: BufferPool::new(),
            tree: PieceTree::new(),
        }
    }

    /// Total content size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.bytes()
    }

    /// Check if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Number of newline bytes in the content.
    ///
    /// Equals the sum of per-piece newline counts; the catalog maintains this
    /// alongside byte totals.
    #[must_use]
    pub fn newline_count(&self) -> usize {
        self.tree.newlines()
    }

    /// Number of lines. A trailing fragment without a newline is a line, and
    /// an empty buffer has one empty line, so this is always
    /// [`newline_count`](Self::newline_count) + 1.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.newline_count() + 1
    }

    /// Number of pieces currently in the catalog.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.tree.count()
    }

    /// Number of pool buffers: the two growable stores plus one per attached
    /// origin span.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.pool.len()
    }

    /// Append `text` at the end of the buffer.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let piece = self.pool.feed(APPEND, text.as_bytes());
        self.tree.push_back(piece);
    }

    /// Insert `text` at byte offset `pos`.
    ///
    /// An empty `text` is a no-op. Inserting at an existing piece boundary
    /// never cuts a piece; inserting inside one cuts it without copying bytes.
    pub fn insert(&mut self, pos: usize, text: &str) -> Result<()> {
        self.check_offset(pos)?;
        if text.is_empty() {
            return Ok(());
        }
        let piece = self.pool.feed(INSERT, text.as_bytes());
        self.tree.insert_at(pos, piece, &self.pool);
        Ok(())
    }

    /// Remove the bytes in `start..end`. An empty range is a no-op.
    pub fn erase(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(());
        }
        self.tree.erase(start, end, &self.pool);
        Ok(())
    }

    /// Reference an immutable origin span at the end of the buffer without
    /// copying it. The span must stay valid for the table's lifetime.
    pub fn append_origin(&mut self, span: &'a [u8]) {
        if span.is_empty() {
            return;
        }
        let piece = self.pool.attach_origin(span);
        self.tree.push_back(piece);
    }

    /// Reference an immutable origin span at byte offset `pos` without
    /// copying it.
    pub fn insert_origin(&mut self, pos: usize, span: &'a [u8]) -> Result<()> {
        self.check_offset(pos)?;
        if span.is_empty() {
            return Ok(());
        }
        let piece = self.pool.attach_origin(span);
        self.tree.insert_at(pos, piece, &self.pool);
        Ok(())
    }

    /// Byte at offset `pos`.
    pub fn byte_at(&self, pos: usize) -> Result<u8> {
        if pos >= self.size() {
            return Err(Error::InvalidOffset {
                offset: pos,
                size: self.size(),
            });
        }
        let loc = self.tree.locate(pos);
        Ok(self.pool.buffer(loc.piece.buffer).bytes()[loc.piece.start + loc.offset])
    }

    /// Byte at offset `pos`, under the name piece-table surfaces commonly
    /// use for it. Alias of [`byte_at`](Self::byte_at).
    pub fn char_at(&self, pos: usize) -> Result<u8> {
        self.byte_at(pos)
    }

    /// Line number containing byte offset `pos`: the count of newlines
    /// strictly before `pos`. `pos == size()` maps to the last line.
    pub fn get_line(&self, pos: usize) -> Result<usize> {
        self.check_offset(pos)?;
        Ok(self.row_of(pos))
    }

    /// Byte offset where `line` begins.
    pub fn line_start(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        Ok(self.line_start_of(line))
    }

    /// Byte offset one past the end of `line`: just past its newline, or
    /// [`size`](Self::size) for the final line.
    pub fn line_end(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        Ok(self.line_end_of(line))
    }

    /// Length of `line` in bytes, newline included.
    pub fn line_length(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        Ok(self.line_end_of(line) - self.line_start_of(line))
    }

    /// Content of `line`, newline included.
    pub fn line_string(&self, line: usize) -> Result<String> {
        self.check_line(line)?;
        Ok(self.collect_string(self.line_start_of(line), self.line_end_of(line)))
    }

    /// Content of `start..end` as a string. Bytes that are not valid UTF-8
    /// (possible with arbitrary origin spans) are replaced, never panicked on.
    pub fn range_string(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.collect_string(start, end))
    }

    /// The whole content as a string.
    #[must_use]
    pub fn text(&self) -> String {
        self.collect_string(0, self.size())
    }

    /// Lazy span traversal over `start..end`.
    pub fn iter_range(&self, start: usize, end: usize) -> Result<SpanIter<'_, 'a>> {
        self.check_range(start, end)?;
        Ok(SpanIter::new(self, start, end))
    }

    /// The contiguous span starting at byte `pos` and running to the end of
    /// the piece that owns it, or an empty slice at end of buffer.
    ///
    /// This is the pull interface a byte-feed callback wants: call with an
    /// offset, hand the returned span to the consumer, repeat from
    /// `pos + span.len()`.
    #[must_use]
    pub fn span_at(&self, pos: usize) -> &[u8] {
        if pos >= self.size() {
            return &[];
        }
        let loc = self.tree.locate(pos);
        let bytes = self.pool.buffer(loc.piece.buffer).bytes();
        &bytes[loc.piece.start + loc.offset..loc.piece.start + loc.piece.len]
    }

    /// (row, column) of byte offset `pos`, both 0-indexed, column in bytes.
    pub fn point_at(&self, pos: usize) -> Result<Point> {
        self.check_offset(pos)?;
        Ok(self.point_of(pos))
    }

    /// Ordered snapshot of the piece catalog, for diagnostics and tests.
    #[must_use]
    pub fn pieces(&self) -> Vec<Piece> {
        self.tree.pieces()
    }

    /// Check whether `id` names an attached origin span rather than one of
    /// the growable stores.
    #[must_use]
    pub fn is_origin_buffer(&self, id: BufferId) -> bool {
        id.index() < self.pool.len() && self.pool.buffer(id).is_origin()
    }

    pub(crate) fn point_of(&self, pos: usize) -> Point {
        let row = self.row_of(pos);
        Point {
            row,
            column: pos - self.line_start_of(row),
        }
    }

    pub(crate) fn check_offset(&self, pos: usize) -> Result<()> {
        if pos > self.size() {
            return Err(Error::InvalidOffset {
                offset: pos,
                size: self.size(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start > end || end > self.size() {
            return Err(Error::InvalidRange {
                start,
                end,
                size: self.size(),
            });
        }
        Ok(())
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line >= self.line_count() {
            return Err(Error::InvalidLine {
                line,
                lines: self.line_count(),
            });
        }
        Ok(())
    }

    fn row_of(&self, pos: usize) -> usize {
        if pos >= self.size() {
            return self.newline_count();
        }
        let loc = self.tree.locate(pos);
        loc.left_newlines + loc.piece.newlines_before(loc.piece.start + loc.offset, &self.pool)
    }

    fn line_start_of(&self, line: usize) -> usize {
        if line == 0 {
            0
        } else {
            self.tree.line_boundary(line, &self.pool)
        }
    }

    fn line_end_of(&self, line: usize) -> usize {
        if line == self.newline_count() {
            self.size()
        } else {
            self.tree.line_boundary(line + 1, &self.pool)
        }
    }

    fn collect_string(&self, start: usize, end: usize) -> String {
        let mut bytes = Vec::with_capacity(end - start);
        for span in SpanIter::new(self, start, end) {
            bytes.extend_from_slice(span);
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for PieceTable<'_> {
    fn default() -> Self {
        Self::new()
    }
}
