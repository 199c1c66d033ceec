//! Buffer pool: append-only byte stores and borrowed origin spans.
//!
//! Two growable buffers exist from construction, one fed by `append` and one
//! by `insert`. Origin buffers are attached later and reference externally
//! supplied immutable spans without copying. Every append maintains the
//! buffer's ascending newline-offset table in the same pass as the byte copy,
//! so line lookups never rescan content. Bytes already referenced by a piece
//! are never rewritten or relocated.

use crate::table::piece::Piece;

/// Identifies one buffer in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    /// Pool slot index. Slots 0 and 1 are the growable buffers; higher slots
    /// are origin spans in attachment order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Growable buffer fed by `append`.
pub(crate) const APPEND: BufferId = BufferId(0);
/// Growable buffer fed by `insert`.
pub(crate) const INSERT: BufferId = BufferId(1);

#[derive(Clone, Debug)]
enum Store<'a> {
    Owned(Vec<u8>),
    Origin(&'a [u8]),
}

/// One pool buffer: raw bytes plus the offsets of every `\n` within them.
#[derive(Clone, Debug)]
pub(crate) struct Buffer<'a> {
    store: Store<'a>,
    newlines: Vec<usize>,
}

impl<'a> Buffer<'a> {
    fn growable() -> Self {
        Self {
            store: Store::Owned(Vec::new()),
            newlines: Vec::new(),
        }
    }

    fn origin(span: &'a [u8]) -> Self {
        let newlines = span
            .iter()
            .enumerate()
            .filter(|&(_, &byte)| byte == b'\n')
            .map(|(offset, _)| offset)
            .collect();
        Self {
            store: Store::Origin(span),
            newlines,
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        match &self.store {
            Store::Owned(bytes) => bytes,
            Store::Origin(span) => span,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes().len()
    }

    pub(crate) fn is_origin(&self) -> bool {
        matches!(self.store, Store::Origin(_))
    }

    fn append(&mut self, data: &[u8]) {
        let Store::Owned(bytes) = &mut self.store else {
            unreachable!("origin buffers are never appended to");
        };
        let base = bytes.len();
        bytes.extend_from_slice(data);
        for (offset, &byte) in data.iter().enumerate() {
            if byte == b'\n' {
                self.newlines.push(base + offset);
            }
        }
    }

    /// Buffer offset of the newline at `idx` in the newline table.
    pub(crate) fn newline_at(&self, idx: usize) -> usize {
        self.newlines[idx]
    }

    /// How many of the `count` table entries starting at `table_start` fall
    /// strictly before `buffer_offset`.
    pub(crate) fn newlines_before(
        &self,
        table_start: usize,
        count: usize,
        buffer_offset: usize,
    ) -> usize {
        self.newlines[table_start..table_start + count].partition_point(|&off| off < buffer_offset)
    }

    pub(crate) fn newline_count(&self) -> usize {
        self.newlines.len()
    }
}

/// The set of all buffers pieces may reference. Owns every inline byte; origin
/// spans are borrowed for `'a` and never copied.
#[derive(Clone, Debug)]
pub(crate) struct BufferPool<'a> {
    buffers: Vec<Buffer<'a>>,
}

impl<'a> BufferPool<'a> {
    pub(crate) fn new() -> Self {
        Self {
            buffers: vec![Buffer::growable(), Buffer::growable()],
        }
    }

    pub(crate) fn buffer(&self, id: BufferId) -> &Buffer<'a> {
        &self.buffers[id.index()]
    }

    pub(crate) fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Append `data` to growable buffer `id`, returning a piece over the newly
    /// written tail.
    pub(crate) fn feed(&mut self, id: BufferId, data: &[u8]) -> Piece {
        let buffer = &mut self.buffers[id.index()];
        let start = buffer.len();
        let line_table_start = buffer.newline_count();
        buffer.append(data);
        Piece {
            buffer: id,
            start,
            len: data.len(),
            newlines: buffer.newline_count() - line_table_start,
            line_table_start,
        }
    }

    /// Attach an immutable origin span, returning a piece covering all of it.
    pub(crate) fn attach_origin(&mut self, span: &'a [u8]) -> Piece {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Buffer::origin(span));
        Piece {
            buffer: id,
            start: 0,
            len: span.len(),
            newlines: self.buffers[id.index()].newline_count(),
            line_table_start: 0,
        }
    }
}
