//! Lazy span traversal over a byte range of the table.

use crate::table::PieceTable;

/// Forward-only iterator over the contiguous byte spans covering
/// `[start, end)`, bridging piece and buffer boundaries transparently.
///
/// The concatenation of the yielded spans equals the requested substring.
/// Once exhausted it cannot be restarted; construct a new one to re-read.
/// Holding a `SpanIter` borrows the table, so mutation first requires
/// dropping every live iterator.
pub struct SpanIter<'t, 'a> {
    table: &'t PieceTable<'a>,
    pos: usize,
    end: usize,
}

impl<'t, 'a> SpanIter<'t, 'a> {
    pub(crate) fn new(table: &'t PieceTable<'a>, start: usize, end: usize) -> Self {
        Self {
            table,
            pos: start,
            end,
        }
    }
}

impl<'t> Iterator for SpanIter<'t, '_> {
    type Item = &'t [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end {
            return None;
        }
        let span = self.table.span_at(self.pos);
        let take = span.len().min(self.end - self.pos);
        self.pos += take;
        Some(&span[..take])
    }
}

impl std::iter::FusedIterator for SpanIter<'_, '_> {}
