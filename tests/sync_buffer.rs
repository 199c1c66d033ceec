//! Integration tests for tree synchronization across table mutations.

use astbuf::{IncrementalParser, Point, SourceEdit, SyntaxBuffer, SyntaxNode, SyntaxTree};

/// Line-oriented mock engine: the tree holds one node per line, and records
/// every edit descriptor applied to it. Incremental parses reuse nothing from
/// the old tree beyond its log, which is all these tests need.
#[derive(Clone, Debug)]
struct LineTree {
    lines: Vec<(usize, usize)>,
    log: Vec<SourceEdit>,
}

#[derive(Clone, Copy, Debug)]
struct Extent {
    start: usize,
    end: usize,
    row: usize,
    end_row: usize,
    end_col: usize,
}

impl SyntaxNode for Extent {
    fn start_byte(&self) -> usize {
        self.start
    }
    fn end_byte(&self) -> usize {
        self.end
    }
    fn start_point(&self) -> Point {
        Point::new(self.row, 0)
    }
    fn end_point(&self) -> Point {
        Point::new(self.end_row, self.end_col)
    }
}

impl SyntaxTree for LineTree {
    type Node<'t> = Extent;

    fn edit(&mut self, edit: &SourceEdit) {
        self.log.push(*edit);
    }

    fn root(&self) -> Extent {
        let end = self.lines.last().map_or(0, |&(_, end)| end);
        let last_row = self.lines.len().saturating_sub(1);
        let last_start = self.lines.last().map_or(0, |&(start, _)| start);
        Extent {
            start: 0,
            end,
            row: 0,
            end_row: last_row,
            end_col: end - last_start,
        }
    }
}

impl LineTree {
    fn line_extent(&self, row: usize) -> Extent {
        let (start, end) = self.lines[row];
        Extent {
            start,
            end,
            row,
            end_row: row,
            end_col: end - start,
        }
    }
}

struct LineParser {
    parses: usize,
}

impl LineParser {
    fn new() -> Self {
        Self { parses: 0 }
    }
}

impl IncrementalParser for LineParser {
    type Tree = LineTree;

    fn parse<'buf, F>(&mut self, old_tree: Option<&LineTree>, mut read: F) -> Option<LineTree>
    where
        F: FnMut(usize, Point) -> &'buf [u8],
    {
        self.parses += 1;
        let mut content = Vec::new();
        loop {
            let span = read(content.len(), Point::default());
            if span.is_empty() {
                break;
            }
            content.extend_from_slice(span);
        }

        let mut lines = Vec::new();
        let mut start = 0;
        for (pos, &byte) in content.iter().enumerate() {
            if byte == b'\n' {
                lines.push((start, pos + 1));
                start = pos + 1;
            }
        }
        lines.push((start, content.len()));
        Some(LineTree {
            lines,
            log: old_tree.map(|tree| tree.log.clone()).unwrap_or_default(),
        })
    }
}

#[test]
fn test_tree_rebuilt_after_each_mutation() {
    let mut buffer = SyntaxBuffer::with_text(LineParser::new(), "one\ntwo\nthree");
    buffer.insert(4, "1.5\n").unwrap();
    buffer.erase(8, 12).unwrap();
    buffer.append("\nfour");

    assert_eq!(buffer.table().text(), "one\n1.5\nthree\nfour");
    let tree = buffer.tree().unwrap();
    assert_eq!(tree.lines.len(), 4);
    for row in 0..4 {
        let extent = tree.line_extent(row);
        assert_eq!(extent.start, buffer.table().line_start(row).unwrap());
        assert_eq!(extent.end, buffer.table().line_end(row).unwrap());
        assert_eq!(buffer.node_text(&extent), buffer.table().line_string(row).unwrap());
    }
}

#[test]
fn test_descriptors_use_pre_mutation_points() {
    let mut buffer = SyntaxBuffer::with_text(LineParser::new(), "aaa\nbbb\nccc\n");

    // Deleting the first line: rows in the descriptor reflect content as it
    // was when the edit was described, before the table changed.
    buffer.erase(0, 4).unwrap();
    // Insert at what is now the start of "ccc".
    buffer.insert(4, "X\nY").unwrap();

    let log = &buffer.tree().unwrap().log;
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[0],
        SourceEdit {
            start_byte: 0,
            old_end_byte: 4,
            new_end_byte: 0,
            start_point: Point::new(0, 0),
            old_end_point: Point::new(1, 0),
            new_end_point: Point::new(0, 0),
        }
    );
    assert_eq!(
        log[1],
        SourceEdit {
            start_byte: 4,
            old_end_byte: 4,
            new_end_byte: 7,
            start_point: Point::new(1, 0),
            old_end_point: Point::new(1, 0),
            new_end_point: Point::new(2, 1),
        }
    );
}

#[test]
fn test_origin_span_mutations_synchronize() {
    let span = b"alpha\nbeta\n";
    let mut buffer = SyntaxBuffer::new(LineParser::new());
    buffer.append_origin(span);
    buffer.insert_origin(6, b"gamma\n").unwrap();

    assert_eq!(buffer.table().text(), "alpha\ngamma\nbeta\n");
    assert_eq!(buffer.tree().unwrap().lines.len(), 4);
    assert_eq!(buffer.root().unwrap().end_byte(), 17);
}

#[test]
fn test_zero_length_mutations_leave_tree_and_log_alone() {
    let mut buffer = SyntaxBuffer::with_text(LineParser::new(), "abc\n");
    let parses = buffer.parser().parses;
    buffer.append("");
    buffer.insert(2, "").unwrap();
    buffer.erase(1, 1).unwrap();
    buffer.append_origin(b"");
    buffer.insert_origin(0, b"").unwrap();

    assert_eq!(buffer.parser().parses, parses);
    assert!(buffer.tree().unwrap().log.is_empty());
}

#[test]
fn test_rejected_mutation_never_reaches_tree() {
    let mut buffer = SyntaxBuffer::with_text(LineParser::new(), "abc");
    assert!(buffer.insert(4, "x").is_err());
    assert!(buffer.erase(1, 9).is_err());
    assert!(buffer.insert_origin(5, b"y").is_err());
    assert!(buffer.tree().unwrap().log.is_empty());
    assert_eq!(buffer.table().text(), "abc");
}

#[test]
fn test_full_reparse_resets_incremental_log() {
    let mut buffer = SyntaxBuffer::with_text(LineParser::new(), "a\nb");
    buffer.insert(1, "!").unwrap();
    assert!(!buffer.tree().unwrap().log.is_empty());

    buffer.parse();
    assert!(buffer.tree().unwrap().log.is_empty());
    assert_eq!(buffer.tree().unwrap().lines.len(), 2);
}
