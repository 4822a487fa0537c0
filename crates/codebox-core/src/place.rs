//! Document coordinates.

use std::cmp::Ordering;
use std::fmt;

/// A `(line, char)` coordinate inside a document.
///
/// Places are ordered line-major, then by character index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Place {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based character index within the line.
    pub ch: usize,
}

impl Place {
    /// Create a new place.
    pub const fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }

    /// The first place of a document.
    pub const fn origin() -> Self {
        Self { line: 0, ch: 0 }
    }
}

impl Ord for Place {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.ch.cmp(&other.ch))
    }
}

impl PartialOrd for Place {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.ch)
    }
}
