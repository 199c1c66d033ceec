//! Ordered piece catalog backed by an order-statistics tree.
//!
//! Pieces live in an arena and are linked into an implicit treap whose nodes
//! carry subtree byte and newline totals. Cumulative `left_length` and
//! `left_lines` values are not stored on pieces; they are prefix sums derived
//! while descending, so a mutation only touches the O(log n) path it walks
//! instead of re-stamping every later piece. Line descent consults the subtree
//! newline totals directly, which means pieces without newlines contribute
//! nothing and can never shadow a line boundary.

use slotmap::{SlotMap, new_key_type};

use crate::table::piece::Piece;
use crate::table::pool::BufferPool;

new_key_type! {
    pub(crate) struct PieceKey;
}

#[derive(Clone, Debug)]
struct Node {
    piece: Piece,
    left: Option<PieceKey>,
    right: Option<PieceKey>,
    priority: u64,
    /// Total bytes in this subtree.
    bytes: usize,
    /// Total newlines in this subtree.
    newlines: usize,
}

/// Result of an offset lookup: the owning piece plus the derived cumulative
/// totals of everything before it in catalog order.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Location {
    pub(crate) piece: Piece,
    /// Offset of the queried position within the piece.
    pub(crate) offset: usize,
    /// Bytes before the piece in catalog order (`left_length`).
    pub(crate) left_bytes: usize,
    /// Newlines before the piece in catalog order (`left_lines`).
    pub(crate) left_newlines: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct PieceTree {
    nodes: SlotMap<PieceKey, Node>,
    root: Option<PieceKey>,
    seed: u64,
}

impl PieceTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            seed: 0x5851_F42D_4C95_7F2D,
        }
    }

    pub(crate) fn bytes(&self) -> usize {
        self.subtree_bytes(self.root)
    }

    pub(crate) fn newlines(&self) -> usize {
        self.subtree_newlines(self.root)
    }

    pub(crate) fn count(&self) -> usize {
        self.nodes.len()
    }

    /// Find the piece owning byte `pos`. A piece owns offsets
    /// `left_bytes .. left_bytes + len`, so a boundary offset always resolves
    /// to the piece that starts there, never the one that ends there.
    ///
    /// Requires `pos < self.bytes()`.
    pub(crate) fn locate(&self, mut pos: usize) -> Location {
        debug_assert!(pos < self.bytes(), "locate past the catalog end");
        let mut walk = self.root;
        let mut left_bytes = 0;
        let mut left_newlines = 0;
        while let Some(key) = walk {
            let node = &self.nodes[key];
            let under_left = self.subtree_bytes(node.left);
            if pos < under_left {
                walk = node.left;
            } else if pos < under_left + node.piece.len {
                return Location {
                    piece: node.piece,
                    offset: pos - under_left,
                    left_bytes: left_bytes + under_left,
                    left_newlines: left_newlines + self.subtree_newlines(node.left),
                };
            } else {
                left_bytes += under_left + node.piece.len;
                left_newlines += self.subtree_newlines(node.left) + node.piece.newlines;
                pos -= under_left + node.piece.len;
                walk = node.right;
            }
        }
        unreachable!("catalog totals out of sync with piece sums");
    }

    /// Catalog offset one past the `nth` newline (1-based).
    ///
    /// Requires `1 <= nth <= self.newlines()`.
    pub(crate) fn line_boundary(&self, mut nth: usize, pool: &BufferPool<'_>) -> usize {
        debug_assert!(nth >= 1 && nth <= self.newlines(), "line boundary out of range");
        let mut walk = self.root;
        let mut left_bytes = 0;
        while let Some(key) = walk {
            let node = &self.nodes[key];
            let under_left = self.subtree_newlines(node.left);
            if nth <= under_left {
                walk = node.left;
            } else if nth <= under_left + node.piece.newlines {
                let buffer = pool.buffer(node.piece.buffer);
                let newline_off =
                    buffer.newline_at(node.piece.line_table_start + (nth - under_left) - 1);
                let piece_start = left_bytes + self.subtree_bytes(node.left);
                return piece_start + (newline_off - node.piece.start) + 1;
            } else {
                left_bytes += self.subtree_bytes(node.left) + node.piece.len;
                nth -= under_left + node.piece.newlines;
                walk = node.right;
            }
        }
        unreachable!("catalog totals out of sync with newline tables");
    }

    /// Link `piece` at byte position `pos`, cutting the piece that currently
    /// spans `pos` if the position is not already a boundary.
    pub(crate) fn insert_at(&mut self, pos: usize, piece: Piece, pool: &BufferPool<'_>) {
        if piece.len == 0 {
            return;
        }
        let root = self.root.take();
        let (left, right) = self.split(root, pos, pool);
        let key = self.alloc(piece);
        let left = self.merge(left, Some(key));
        self.root = self.merge(left, right);
    }

    /// Link `piece` after everything else.
    pub(crate) fn push_back(&mut self, piece: Piece) {
        if piece.len == 0 {
            return;
        }
        let key = self.alloc(piece);
        let root = self.root.take();
        self.root = self.merge(root, Some(key));
    }

    /// Detach and free every piece covering `start..end`, cutting boundary
    /// pieces as needed.
    pub(crate) fn erase(&mut self, start: usize, end: usize, pool: &BufferPool<'_>) {
        let root = self.root.take();
        let (left, rest) = self.split(root, start, pool);
        let (mid, right) = self.split(rest, end - start, pool);
        self.free_subtree(mid);
        self.root = self.merge(left, right);
    }

    /// Catalog order snapshot, for diagnostics and audits.
    pub(crate) fn pieces(&self) -> Vec<Piece> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut walk = self.root;
        while walk.is_some() || !stack.is_empty() {
            while let Some(key) = walk {
                stack.push(key);
                walk = self.nodes[key].left;
            }
            if let Some(key) = stack.pop() {
                out.push(self.nodes[key].piece);
                walk = self.nodes[key].right;
            }
        }
        out
    }

    fn subtree_bytes(&self, tree: Option<PieceKey>) -> usize {
        tree.map_or(0, |key| self.nodes[key].bytes)
    }

    fn subtree_newlines(&self, tree: Option<PieceKey>) -> usize {
        tree.map_or(0, |key| self.nodes[key].newlines)
    }

    fn update(&mut self, key: PieceKey) {
        let (left, right) = {
            let node = &self.nodes[key];
            (node.left, node.right)
        };
        let bytes =
            self.nodes[key].piece.len + self.subtree_bytes(left) + self.subtree_bytes(right);
        let newlines = self.nodes[key].piece.newlines
            + self.subtree_newlines(left)
            + self.subtree_newlines(right);
        let node = &mut self.nodes[key];
        node.bytes = bytes;
        node.newlines = newlines;
    }

    fn alloc(&mut self, piece: Piece) -> PieceKey {
        // splitmix64 keeps priorities well distributed without external state.
        self.seed = self.seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.seed;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        let priority = z ^ (z >> 31);
        self.alloc_with(piece, priority)
    }

    fn alloc_with(&mut self, piece: Piece, priority: u64) -> PieceKey {
        self.nodes.insert(Node {
            bytes: piece.len,
            newlines: piece.newlines,
            piece,
            left: None,
            right: None,
            priority,
        })
    }

    fn merge(&mut self, a: Option<PieceKey>, b: Option<PieceKey>) -> Option<PieceKey> {
        match (a, b) {
            (None, tree) | (tree, None) => tree,
            (Some(x), Some(y)) => {
                if self.nodes[x].priority >= self.nodes[y].priority {
                    let hang = self.nodes[x].right;
                    let merged = self.merge(hang, Some(y));
                    self.nodes[x].right = merged;
                    self.update(x);
                    Some(x)
                } else {
                    let hang = self.nodes[y].left;
                    let merged = self.merge(Some(x), hang);
                    self.nodes[y].left = merged;
                    self.update(y);
                    Some(y)
                }
            }
        }
    }

    /// Split `tree` so the left part holds exactly the first `pos` bytes.
    ///
    /// A `pos` landing on an existing piece boundary is purely structural; a
    /// `pos` inside a piece cuts it in place without copying bytes and without
    /// producing an empty piece.
    fn split(
        &mut self,
        tree: Option<PieceKey>,
        pos: usize,
        pool: &BufferPool<'_>,
    ) -> (Option<PieceKey>, Option<PieceKey>) {
        let Some(key) = tree else {
            return (None, None);
        };
        let left = self.nodes[key].left;
        let under_left = self.subtree_bytes(left);
        let piece_len = self.nodes[key].piece.len;
        if pos <= under_left {
            let (a, b) = self.split(left, pos, pool);
            self.nodes[key].left = b;
            self.update(key);
            (a, Some(key))
        } else if pos >= under_left + piece_len {
            let right = self.nodes[key].right;
            let (a, b) = self.split(right, pos - under_left - piece_len, pool);
            self.nodes[key].right = a;
            self.update(key);
            (Some(key), b)
        } else {
            // The boundary falls inside this piece: cut it, keep the left
            // half on this node, and re-hang the right half where the heap
            // order puts it. The right half inherits this node's priority:
            // everything in `hang` already sits at or below it, and the
            // returned subtree is re-hung beneath this node's ancestors, so
            // a fresh random priority could break heap order in both spots.
            let (lhs, rhs) = self.nodes[key].piece.cut(pos - under_left, pool);
            let hang = self.nodes[key].right.take();
            let priority = self.nodes[key].priority;
            self.nodes[key].piece = lhs;
            self.update(key);
            let rhs_key = self.alloc_with(rhs, priority);
            let rest = self.merge(Some(rhs_key), hang);
            (Some(key), rest)
        }
    }

    fn free_subtree(&mut self, tree: Option<PieceKey>) {
        let Some(key) = tree else {
            return;
        };
        if let Some(node) = self.nodes.remove(key) {
            self.free_subtree(node.left);
            self.free_subtree(node.right);
        }
    }

    /// Verify heap order, aggregate sums, and the no-empty-piece rule.
    #[cfg(test)]
    pub(crate) fn audit(&self, pool: &BufferPool<'_>) {
        fn walk(tree: &PieceTree, key: Option<PieceKey>, pool: &BufferPool<'_>) -> (usize, usize) {
            let Some(key) = key else { return (0, 0) };
            let node = &tree.nodes[key];
            assert!(node.piece.len > 0, "empty piece linked into the catalog");
            let buffer = pool.buffer(node.piece.buffer);
            assert!(
                node.piece.start + node.piece.len <= buffer.len(),
                "piece range escapes its buffer"
            );
            for child in [node.left, node.right].into_iter().flatten() {
                assert!(
                    tree.nodes[child].priority <= node.priority,
                    "heap order violated"
                );
            }
            let (lb, ln) = walk(tree, node.left, pool);
            let (rb, rn) = walk(tree, node.right, pool);
            assert_eq!(node.bytes, lb + node.piece.len + rb, "byte aggregate stale");
            assert_eq!(
                node.newlines,
                ln + node.piece.newlines + rn,
                "newline aggregate stale"
            );
            (node.bytes, node.newlines)
        }
        walk(self, self.root, pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::pool::{APPEND, INSERT};

    fn catalog_text(tree: &PieceTree, pool: &BufferPool<'_>) -> Vec<u8> {
        let mut out = Vec::new();
        for piece in tree.pieces() {
            out.extend_from_slice(
                &pool.buffer(piece.buffer).bytes()[piece.start..piece.start + piece.len],
            );
        }
        out
    }

    #[test]
    fn test_push_back_and_totals() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"abc\n"));
        tree.push_back(pool.feed(APPEND, b"def"));
        assert_eq!(tree.bytes(), 7);
        assert_eq!(tree.newlines(), 1);
        assert_eq!(tree.count(), 2);
        tree.audit(&pool);
    }

    #[test]
    fn test_boundary_insert_does_not_cut() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"ab"));
        tree.push_back(pool.feed(APPEND, b"cd"));

        let piece = pool.feed(INSERT, b"X");
        tree.insert_at(2, piece, &pool);
        assert_eq!(tree.count(), 3);
        assert_eq!(catalog_text(&tree, &pool), b"abXcd");
        tree.audit(&pool);
    }

    #[test]
    fn test_interior_insert_cuts_once() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"abcdef"));

        let piece = pool.feed(INSERT, b"XY");
        tree.insert_at(2, piece, &pool);
        assert_eq!(tree.count(), 3);
        assert_eq!(catalog_text(&tree, &pool), b"abXYcdef");
        tree.audit(&pool);
    }

    #[test]
    fn test_erase_across_pieces() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"ab\n"));
        tree.push_back(pool.feed(APPEND, b"cd\n"));
        tree.push_back(pool.feed(APPEND, b"ef"));

        tree.erase(1, 5, &pool);
        assert_eq!(catalog_text(&tree, &pool), b"a\nef");
        assert_eq!(tree.bytes(), 4);
        assert_eq!(tree.newlines(), 1);
        tree.audit(&pool);
    }

    #[test]
    fn test_erase_frees_nodes() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        for chunk in [b"aa".as_slice(), b"bb", b"cc", b"dd"] {
            tree.push_back(pool.feed(APPEND, chunk));
        }
        tree.erase(0, 8, &pool);
        assert_eq!(tree.count(), 0);
        assert_eq!(tree.bytes(), 0);
    }

    #[test]
    fn test_locate_boundary_prefers_following_piece() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"ab"));
        tree.push_back(pool.feed(APPEND, b"cd"));

        let loc = tree.locate(2);
        assert_eq!(loc.offset, 0);
        assert_eq!(loc.left_bytes, 2);
        assert_eq!(loc.piece.start, 2);
    }

    #[test]
    fn test_line_boundary_skips_newline_free_pieces() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"a\n"));
        // A run of pieces without newlines between two line owners.
        for _ in 0..5 {
            let piece = pool.feed(INSERT, b"x");
            let at = tree.bytes();
            tree.insert_at(at, piece, &pool);
        }
        tree.push_back(pool.feed(APPEND, b"b\n"));

        assert_eq!(tree.line_boundary(1, &pool), 2);
        assert_eq!(tree.line_boundary(2, &pool), tree.bytes());
        tree.audit(&pool);
    }

    #[test]
    fn test_heap_order_survives_repeated_interior_cuts() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        for i in 0..64u8 {
            let chunk = [b'a' + (i % 26), b'\n'];
            tree.push_back(pool.feed(APPEND, &chunk));
        }
        // Interior inserts allocate the cut piece's right half while the
        // descent path is still unwinding; each one must leave priorities
        // heap ordered or the catalog degrades toward a chain.
        for i in 0..128 {
            let pos = (i * 37) % (tree.bytes() - 1) + 1;
            let piece = pool.feed(INSERT, b"z");
            tree.insert_at(pos, piece, &pool);
            tree.audit(&pool);
        }
        assert_eq!(tree.bytes(), 64 * 2 + 128);
    }

    #[test]
    fn test_many_same_offset_cuts_stay_consistent() {
        let mut pool = BufferPool::new();
        let mut tree = PieceTree::new();
        tree.push_back(pool.feed(APPEND, b"abcdefgh\n"));
        // Repeated cuts at the same position produce a pathological run of
        // zero-newline pieces; totals and ordering must survive it.
        for _ in 0..16 {
            let piece = pool.feed(INSERT, b"z");
            tree.insert_at(4, piece, &pool);
        }
        assert_eq!(tree.bytes(), 25);
        assert_eq!(tree.newlines(), 1);
        assert_eq!(tree.line_boundary(1, &pool), 25);
        tree.audit(&pool);

        tree.erase(4, 20, &pool);
        assert_eq!(catalog_text(&tree, &pool), b"abcdefgh\n");
        tree.audit(&pool);
    }
}
