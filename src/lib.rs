//! Piece-table text buffer with incremental-parse synchronization.
//!
//! [`PieceTable`] stores text as a catalog of non-owning pieces over
//! append-only buffers, so insert and erase never move existing bytes and
//! large origin spans (for example a memory-mapped file) are referenced in
//! place. The catalog is an order-statistics structure: offset lookups, line
//! queries, and edits all run in O(log pieces).
//!
//! [`SyntaxBuffer`] couples a table to an [`IncrementalParser`], translating
//! every mutation into a [`SourceEdit`] and reparsing through a byte-feed
//! callback, so a syntax tree stays consistent with the text without the
//! parser ever seeing a contiguous copy. Enable the `tree-sitter` feature to
//! use tree-sitter as the engine.
//!
//! # Examples
//!
//! ```
//! use astbuf::PieceTable;
//!
//! let mut table = PieceTable::new();
//! table.append("fn main() {\n");
//! table.append("}\n");
//! table.insert(12, "    let x = 1;\n")?;
//!
//! assert_eq!(table.line_count(), 4);
//! assert_eq!(table.line_string(1)?, "    let x = 1;\n");
//! assert_eq!(table.get_line(12)?, 1);
//! # Ok::<(), astbuf::Error>(())
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod syntax;
pub mod table;

pub use error::{Error, Result};
pub use syntax::{IncrementalParser, Point, SourceEdit, SyntaxBuffer, SyntaxNode, SyntaxTree};
pub use table::{BufferId, Piece, PieceTable, SpanIter};
