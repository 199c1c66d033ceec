//! Incremental-parse synchronization over the piece table.
//!
//! The parser integration is a minimal capability surface rather than a
//! binding to one engine: [`IncrementalParser`] produces trees,
//! [`SyntaxTree`] accepts edit descriptors and exposes a root, and
//! [`SyntaxNode`] reports byte and point extents. Any engine that can parse
//! from a byte-feed callback and adjust an existing tree by a
//! [`SourceEdit`] slots in; with the `tree-sitter` feature enabled the
//! tree-sitter types implement these traits directly.

pub mod buffer;
#[cfg(feature = "tree-sitter")]
pub mod ts;

pub use buffer::SyntaxBuffer;

/// A position as 0-indexed row and byte column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    /// Line number, counting newlines before the position.
    pub row: usize,
    /// Byte offset from the start of the line.
    pub column: usize,
}

impl Point {
    #[must_use]
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Describes one text mutation in both byte and point coordinates.
///
/// All fields refer to the content as it was before the mutation, except
/// `new_end_byte` and `new_end_point`, which locate the end of the replacement
/// in the content after it. Ranges are half-open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

/// A node in a parsed tree, reporting its extent.
pub trait SyntaxNode {
    fn start_byte(&self) -> usize;
    fn end_byte(&self) -> usize;
    fn start_point(&self) -> Point;
    fn end_point(&self) -> Point;
}

/// A parse result that can be adjusted for text edits and reused as the
/// baseline of the next parse.
pub trait SyntaxTree: Clone {
    /// Node type borrowed from the tree.
    type Node<'t>: SyntaxNode
    where
        Self: 't;

    /// Shift the tree's internal positions to account for an edit, keeping it
    /// usable as the old-tree argument of an incremental parse.
    fn edit(&mut self, edit: &SourceEdit);

    fn root(&self) -> Self::Node<'_>;
}

/// A parser that reads source through a byte-feed callback and reuses a
/// previous tree when given one.
pub trait IncrementalParser {
    type Tree: SyntaxTree;

    /// Parse the content reachable through `read`, which returns the
    /// contiguous span starting at the requested byte offset, or an empty
    /// slice at end of input.
    ///
    /// Returning `None` signals the engine declined to produce a tree, for
    /// example on timeout or cancellation; callers keep the previous tree.
    fn parse<'buf, F>(&mut self, old_tree: Option<&Self::Tree>, read: F) -> Option<Self::Tree>
    where
        F: FnMut(usize, Point) -> &'buf [u8];
}
