//! Buffer that keeps a syntax tree synchronized with its text.

use crate::error::Result;
use crate::syntax::{IncrementalParser, Point, SourceEdit, SyntaxTree};
use crate::table::PieceTable;

/// A [`PieceTable`] paired with an [`IncrementalParser`], keeping the parse
/// tree consistent with the text across every mutation.
///
/// Each mutating call runs the same sequence: validate arguments, describe
/// the change as a [`SourceEdit`] against the pre-mutation content, adjust
/// the existing tree, mutate the table, then reparse with the adjusted tree
/// as baseline. Zero-length mutations return without touching the tree, and
/// between calls the tree always reflects the current text.
pub struct SyntaxBuffer<'a, P: IncrementalParser> {
    table: PieceTable<'a>,
    parser: P,
    tree: Option<P::Tree>,
}

impl<'a, P: IncrementalParser> SyntaxBuffer<'a, P> {
    /// Wrap `parser` around an empty buffer. No parse runs until content
    /// arrives or [`parse`](Self::parse) is called.
    #[must_use]
    pub fn new(parser: P) -> Self {
        Self {
            table: PieceTable::new(),
            parser,
            tree: None,
        }
    }

    /// Wrap `parser` around initial content and parse it.
    pub fn with_text(parser: P, text: &str) -> Self {
        let mut buffer = Self::new(parser);
        buffer.table.append(text);
        buffer.reparse();
        buffer
    }

    /// The underlying text buffer. All read queries go through here.
    #[must_use]
    pub fn table(&self) -> &PieceTable<'a> {
        &self.table
    }

    /// The parser engine.
    #[must_use]
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Mutable access to the engine, for reconfiguration between parses.
    pub fn parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }

    /// The current tree, if any parse has succeeded.
    #[must_use]
    pub fn tree(&self) -> Option<&P::Tree> {
        self.tree.as_ref()
    }

    /// Root node of the current tree.
    #[must_use]
    pub fn root(&self) -> Option<<P::Tree as SyntaxTree>::Node<'_>> {
        self.tree.as_ref().map(SyntaxTree::root)
    }

    /// Parse from scratch, discarding incremental state. The existing tree is
    /// kept if the engine declines to produce one.
    pub fn parse(&mut self) {
        let previous = self.tree.take();
        self.reparse();
        if self.tree.is_none() {
            self.tree = previous;
        }
    }

    /// Append `text` and resynchronize the tree.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let start = self.table.size();
        self.edit_tree(start, start, text.as_bytes());
        self.table.append(text);
        self.reparse();
    }

    /// Insert `text` at byte offset `pos` and resynchronize the tree.
    pub fn insert(&mut self, pos: usize, text: &str) -> Result<()> {
        self.table.check_offset(pos)?;
        if text.is_empty() {
            return Ok(());
        }
        self.edit_tree(pos, pos, text.as_bytes());
        self.table.insert(pos, text)?;
        self.reparse();
        Ok(())
    }

    /// Remove `start..end` and resynchronize the tree.
    pub fn erase(&mut self, start: usize, end: usize) -> Result<()> {
        self.table.check_range(start, end)?;
        if start == end {
            return Ok(());
        }
        self.edit_tree(start, end, &[]);
        self.table.erase(start, end)?;
        self.reparse();
        Ok(())
    }

    /// Reference an origin span at the end of the buffer and resynchronize.
    pub fn append_origin(&mut self, span: &'a [u8]) {
        if span.is_empty() {
            return;
        }
        let start = self.table.size();
        self.edit_tree(start, start, span);
        self.table.append_origin(span);
        self.reparse();
    }

    /// Reference an origin span at byte offset `pos` and resynchronize.
    pub fn insert_origin(&mut self, pos: usize, span: &'a [u8]) -> Result<()> {
        self.table.check_offset(pos)?;
        if span.is_empty() {
            return Ok(());
        }
        self.edit_tree(pos, pos, span);
        self.table.insert_origin(pos, span)?;
        self.reparse();
        Ok(())
    }

    /// Text covered by a node's byte extent, clamped to the current content.
    pub fn node_text(&self, node: &impl crate::syntax::SyntaxNode) -> String {
        let end = node.end_byte().min(self.table.size());
        let start = node.start_byte().min(end);
        self.table.range_string(start, end).unwrap_or_default()
    }

    /// Describe the pending mutation and shift the tree, before the table
    /// changes. Point coordinates must come from the pre-mutation content.
    fn edit_tree(&mut self, start: usize, old_end: usize, replacement: &[u8]) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        tree.edit(&describe(&self.table, start, old_end, replacement));
    }

    fn reparse(&mut self) {
        let table = &self.table;
        let tree = self
            .parser
            .parse(self.tree.as_ref(), |byte, _point| table.span_at(byte));
        if tree.is_some() {
            self.tree = tree;
        }
    }
}

/// Build the edit descriptor for replacing `start..old_end` with
/// `replacement`, measured against `table` before the mutation.
///
/// The new end point is derived by walking the replacement bytes from the
/// start point, so it is exact even when the replacement spans lines.
fn describe(table: &PieceTable<'_>, start: usize, old_end: usize, replacement: &[u8]) -> SourceEdit {
    let start_point = table.point_of(start);
    SourceEdit {
        start_byte: start,
        old_end_byte: old_end,
        new_end_byte: start + replacement.len(),
        start_point,
        old_end_point: table.point_of(old_end),
        new_end_point: advance_point(start_point, replacement),
    }
}

/// Point reached after reading `bytes` starting at `from`.
fn advance_point(from: Point, bytes: &[u8]) -> Point {
    let mut point = from;
    for &byte in bytes {
        if byte == b'\n' {
            point.row += 1;
            point.column = 0;
        } else {
            point.column += 1;
        }
    }
    point
}
