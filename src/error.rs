//! Error types for astbuf.

use std::fmt;

/// Result type alias for buffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for buffer operations.
///
/// Every variant is a precondition violation. Arguments are validated before
/// any state changes, so a returned error never leaves the buffer or its
/// syntax tree partially mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Offset past the end of the buffer.
    InvalidOffset { offset: usize, size: usize },
    /// Line index past the last line.
    InvalidLine { line: usize, lines: usize },
    /// Range with inverted bounds or an end past the buffer.
    InvalidRange {
        start: usize,
        end: usize,
        size: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidOffset { offset, size } => {
                write!(f, "offset {offset} out of bounds for buffer of {size} bytes")
            }
            Self::InvalidLine { line, lines } => {
                write!(f, "line {line} out of bounds for buffer of {lines} lines")
            }
            Self::InvalidRange { start, end, size } => {
                write!(f, "invalid range {start}..{end} for buffer of {size} bytes")
            }
        }
    }
}

impl std::error::Error for Error {}
