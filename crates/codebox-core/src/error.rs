//! Error types shared by the buffer, the command system and the file-backed storage.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type EditResult<T> = Result<T, EditError>;

/// Structural edits that the current context does not allow.
///
/// These are the "this sub-range can't hold this edit" cases: a column-mode replay
/// skips the sub-range and moves on instead of aborting the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructuralViolation {
    /// A line break was inserted while line insertion is disallowed
    /// (single-line view, or a column-mode replay).
    #[error("line breaks cannot be inserted here")]
    LineBreakNotAllowed,
    /// Two lines would have to be merged while line removal is disallowed.
    #[error("lines cannot be merged here")]
    LineMergeNotAllowed,
}

/// Errors produced by the edit engine.
#[derive(Debug, Error)]
pub enum EditError {
    /// A line or character index lies outside the current document bounds.
    #[error("index {index} is out of range (length {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The current length of the indexed sequence.
        len: usize,
    },

    /// The edit is not allowed in the current context.
    #[error("invalid operation: {0}")]
    InvalidOperation(#[from] StructuralViolation),

    /// Every slot of the style table is already in use.
    #[error("style table is full ({capacity} slots)")]
    CapacityExceeded {
        /// Number of slots of the table.
        capacity: usize,
    },

    /// A style mask references a slot that holds no style.
    #[error("style slot {0} is not populated")]
    UnknownStyleSlot(usize),

    /// A regex pattern failed to compile.
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Opening or saving the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditError {
    /// Shorthand for an out-of-range error.
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Returns the structural violation carried by this error, if any.
    pub fn structural_violation(&self) -> Option<StructuralViolation> {
        match self {
            Self::InvalidOperation(violation) => Some(*violation),
            _ => None,
        }
    }
}
