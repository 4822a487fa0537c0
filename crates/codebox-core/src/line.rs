//! Styled characters and lines.

use crate::style::StyleMask;
use std::time::Instant;

/// Stable identity of a line.
///
/// Ids are handed out in increasing order when a line is created and are never reused, so
/// they survive insertions and removals that renumber the lines around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u64);

/// Monotonic [`LineId`] generator owned by a text source.
#[derive(Debug, Default)]
pub struct LineIdGenerator {
    next: u64,
}

impl LineIdGenerator {
    /// Create a generator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> LineId {
        let id = LineId(self.next);
        self.next += 1;
        id
    }
}

/// A character together with the style layers applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character.
    pub ch: char,
    /// Style layers.
    pub style: StyleMask,
}

impl Cell {
    /// Unstyled cell.
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            style: StyleMask::NONE,
        }
    }

    /// Cell with the given style.
    pub const fn styled(ch: char, style: StyleMask) -> Self {
        Self { ch, style }
    }
}

impl From<char> for Cell {
    fn from(ch: char) -> Self {
        Self::new(ch)
    }
}

/// One line of styled text plus its metadata.
#[derive(Debug, Clone)]
pub struct Line {
    cells: Vec<Cell>,
    id: LineId,
    /// Set when the content differs from the backing file (or was never saved).
    pub is_changed: bool,
    /// Folding start marker, `None` when the line opens no block.
    pub folding_start_marker: Option<String>,
    /// Folding end marker, `None` when the line closes no block.
    pub folding_end_marker: Option<String>,
    /// Last time a host displayed or touched this line.
    pub last_visit: Option<Instant>,
    /// Opaque background handle owned by the host.
    pub background: Option<u64>,
    /// Cached auto-indent amount, cleared on every edit of the line.
    pub auto_indent_spaces_needed: Option<usize>,
}

impl Line {
    /// Create an empty line with the given id.
    pub fn new(id: LineId) -> Self {
        Self {
            cells: Vec::new(),
            id,
            is_changed: false,
            folding_start_marker: None,
            folding_end_marker: None,
            last_visit: None,
            background: None,
            auto_indent_spaces_needed: None,
        }
    }

    /// Create an unstyled line from text.
    pub fn from_text(id: LineId, text: &str) -> Self {
        let mut line = Self::new(id);
        line.cells = text.chars().map(Cell::new).collect();
        line
    }

    /// The line's unique id.
    pub fn id(&self) -> LineId {
        self.id
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the line holds no characters.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cell at `index`.
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Mutable cell at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    /// Character at `index`.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.cells.get(index).map(|c| c.ch)
    }

    /// The line's text without styles.
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.ch).collect()
    }

    /// Text of the half-open character span `[from, to)`, clamped to the line.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let to = to.min(self.cells.len());
        let from = from.min(to);
        self.cells[from..to].iter().map(|c| c.ch).collect()
    }

    /// Number of leading spaces and tabs.
    pub fn start_spaces_count(&self) -> usize {
        self.cells
            .iter()
            .take_while(|c| c.ch == ' ' || c.ch == '\t')
            .count()
    }

    /// Returns `true` if the line is empty or holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.ch.is_whitespace())
    }

    /// Insert a cell at `index`; `index` must not exceed the length.
    pub fn insert(&mut self, index: usize, cell: Cell) {
        self.cells.insert(index, cell);
        self.touch();
    }

    /// Insert several cells at `index`.
    pub fn insert_cells(&mut self, index: usize, cells: impl IntoIterator<Item = Cell>) {
        self.cells.splice(index..index, cells);
        self.touch();
    }

    /// Remove and return the cell at `index`.
    pub fn remove(&mut self, index: usize) -> Cell {
        let cell = self.cells.remove(index);
        self.touch();
        cell
    }

    /// Remove `count` cells starting at `index`.
    pub fn remove_range(&mut self, index: usize, count: usize) -> Vec<Cell> {
        let removed = self.cells.drain(index..index + count).collect();
        self.touch();
        removed
    }

    /// Split the line at `index`, returning the tail cells.
    pub fn split_off(&mut self, index: usize) -> Vec<Cell> {
        let tail = self.cells.split_off(index);
        self.touch();
        tail
    }

    /// Append cells at the end.
    pub fn extend(&mut self, cells: impl IntoIterator<Item = Cell>) {
        self.cells.extend(cells);
        self.touch();
    }

    /// Replace the content with unstyled text.
    pub fn set_text(&mut self, text: &str) {
        self.cells = text.chars().map(Cell::new).collect();
        self.touch();
    }

    /// Remove every character.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.is_changed = true;
        self.auto_indent_spaces_needed = None;
    }
}
