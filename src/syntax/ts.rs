//! Tree-sitter implementations of the parser capability traits.
//!
//! With this feature enabled a [`tree_sitter::Parser`] drops straight into
//! [`SyntaxBuffer`](crate::syntax::SyntaxBuffer); the byte-feed callback maps
//! onto `Parser::parse_with`, so the text is never materialized for the
//! engine. Timeouts and cancellation are configured on the parser itself and
//! surface here as a declined parse.

use crate::syntax::{IncrementalParser, Point, SourceEdit, SyntaxNode, SyntaxTree};
use tree_sitter as ts;

fn to_ts_point(point: Point) -> ts::Point {
    ts::Point {
        row: point.row,
        column: point.column,
    }
}

fn from_ts_point(point: ts::Point) -> Point {
    Point {
        row: point.row,
        column: point.column,
    }
}

fn to_ts_edit(edit: &SourceEdit) -> ts::InputEdit {
    ts::InputEdit {
        start_byte: edit.start_byte,
        old_end_byte: edit.old_end_byte,
        new_end_byte: edit.new_end_byte,
        start_position: to_ts_point(edit.start_point),
        old_end_position: to_ts_point(edit.old_end_point),
        new_end_position: to_ts_point(edit.new_end_point),
    }
}

impl SyntaxNode for ts::Node<'_> {
    fn start_byte(&self) -> usize {
        ts::Node::start_byte(self)
    }

    fn end_byte(&self) -> usize {
        ts::Node::end_byte(self)
    }

    fn start_point(&self) -> Point {
        from_ts_point(self.start_position())
    }

    fn end_point(&self) -> Point {
        from_ts_point(self.end_position())
    }
}

impl SyntaxTree for ts::Tree {
    type Node<'t> = ts::Node<'t>;

    fn edit(&mut self, edit: &SourceEdit) {
        ts::Tree::edit(self, &to_ts_edit(edit));
    }

    fn root(&self) -> ts::Node<'_> {
        self.root_node()
    }
}

impl IncrementalParser for ts::Parser {
    type Tree = ts::Tree;

    fn parse<'buf, F>(&mut self, old_tree: Option<&ts::Tree>, mut read: F) -> Option<ts::Tree>
    where
        F: FnMut(usize, Point) -> &'buf [u8],
    {
        self.parse_with(
            &mut |byte, point| read(byte, from_ts_point(point)),
            old_tree,
        )
    }
}
