//! Folding: marker pairs, collapsed blocks and per-line visibility.
//!
//! Lines carry optional start/end marker strings (set by
//! [`Range::set_folding_markers`](crate::Range::set_folding_markers), which stores the start
//! pattern in both). A start marker opens a block that the next line carrying an equal end
//! marker closes.
//!
//! Visibility and the collapsed set are keyed by [`LineId`], never by index, so a folded
//! block stays folded while lines are inserted or removed around it. Each view owns its own
//! [`FoldingState`].

use crate::error::{EditError, EditResult};
use crate::line::LineId;
use crate::source::TextSource;
use std::collections::{BTreeMap, HashSet};
use std::ops::Range;
use tracing::debug;

/// Visibility of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibleState {
    /// Displayed normally.
    #[default]
    Visible,
    /// Displayed, and followed by a collapsed run of hidden lines.
    StartOfHiddenBlock,
    /// Inside a collapsed block; skipped by navigation.
    Hidden,
}

/// Folding state of one view.
#[derive(Debug, Clone, Default)]
pub struct FoldingState {
    hidden: HashSet<LineId>,
    block_starts: HashSet<LineId>,
    /// Collapsed block header -> last line of the block.
    collapsed: BTreeMap<LineId, LineId>,
}

impl FoldingState {
    /// No folded lines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility of the line with `id`.
    pub fn visible_state(&self, id: LineId) -> VisibleState {
        if self.hidden.contains(&id) {
            VisibleState::Hidden
        } else if self.block_starts.contains(&id) {
            VisibleState::StartOfHiddenBlock
        } else {
            VisibleState::Visible
        }
    }

    /// Visibility of the line at `index`.
    pub fn visible_state_at(&self, source: &TextSource, index: usize) -> EditResult<VisibleState> {
        Ok(self.visible_state(source.line_id(index)?))
    }

    /// Returns `true` if the block headed by `id` is in the collapsed set.
    pub fn is_collapsed(&self, id: LineId) -> bool {
        self.collapsed.contains_key(&id)
    }

    /// Ids of collapsed block headers, in id order.
    pub fn collapsed_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.collapsed.keys().copied()
    }

    /// Number of hidden lines.
    pub fn hidden_count(&self) -> usize {
        self.hidden.len()
    }

    fn set_state(&mut self, id: LineId, state: VisibleState) {
        match state {
            VisibleState::Visible => {
                self.hidden.remove(&id);
                self.block_starts.remove(&id);
            }
            VisibleState::StartOfHiddenBlock => {
                self.hidden.remove(&id);
                self.block_starts.insert(id);
            }
            VisibleState::Hidden => {
                self.block_starts.remove(&id);
                self.hidden.insert(id);
            }
        }
    }

    /// Pair block starts with block ends inside `window`.
    ///
    /// Lines carrying both markers are ignored. An end marker closes the innermost open
    /// block with an equal start marker; blocks opened above it that it skips over are closed
    /// at the same line. Blocks still open at the end of the window map to `window.end`.
    pub fn folding_pairs(
        source: &TextSource,
        window: Range<usize>,
    ) -> EditResult<BTreeMap<usize, usize>> {
        let end = window.end.min(source.line_count());
        let mut stack: Vec<usize> = Vec::new();
        let mut pairs = BTreeMap::new();

        for i in window.start..end {
            let line = source.line(i)?;
            match (&line.folding_start_marker, &line.folding_end_marker) {
                (Some(_), Some(_)) => continue,
                (Some(_), None) => stack.push(i),
                (None, Some(marker)) => {
                    while let Some(start) = stack.pop() {
                        pairs.insert(start, i);
                        if source.line(start)?.folding_start_marker.as_ref() == Some(marker) {
                            break;
                        }
                    }
                }
                (None, None) => {}
            }
        }
        for start in stack {
            pairs.insert(start, window.end);
        }
        Ok(pairs)
    }

    /// Index of the line closing the block opened at `start_line`.
    ///
    /// Returns the last line when the block is never closed, and the line reached after
    /// `max_lines` lines when the search runs out of budget.
    pub fn find_end_of_folding_block(
        source: &TextSource,
        start_line: usize,
        max_lines: usize,
    ) -> EditResult<usize> {
        let count = source.line_count();
        if start_line >= count {
            return Err(EditError::out_of_range(start_line, count));
        }
        let mut stack: Vec<&str> = Vec::new();
        for (scanned, i) in (start_line..count).enumerate() {
            let line = source.line(i)?;
            if let Some(marker) = &line.folding_start_marker {
                stack.push(marker);
            }
            if let Some(marker) = &line.folding_end_marker {
                while let Some(open) = stack.pop() {
                    if open == marker.as_str() {
                        break;
                    }
                }
                if stack.is_empty() {
                    return Ok(i);
                }
            }
            if scanned >= max_lines {
                return Ok(i);
            }
        }
        Ok(count - 1)
    }

    /// Collapse lines `from..=to`.
    ///
    /// The first non-blank line becomes the visible block header and the rest of the range is
    /// hidden. Returns the header index, or `None` when nothing was hidden.
    pub fn collapse_block(
        &mut self,
        source: &TextSource,
        from: usize,
        to: usize,
    ) -> EditResult<Option<usize>> {
        let (from, to) = (from.min(to), from.max(to));
        let count = source.line_count();
        if to >= count {
            return Err(EditError::out_of_range(to, count));
        }
        let mut header = None;
        for i in from..=to {
            if !source.line(i)?.is_blank() {
                header = Some(i);
                break;
            }
        }
        let Some(header) = header.filter(|&h| h < to) else {
            return Ok(None);
        };
        self.fold(source, header, to)?;
        Ok(Some(header))
    }

    /// Hide `header + 1..=to` under `header` and record the block by the header's id.
    fn fold(&mut self, source: &TextSource, header: usize, to: usize) -> EditResult<()> {
        for i in header + 1..=to {
            self.set_state(source.line_id(i)?, VisibleState::Hidden);
        }
        let header_id = source.line_id(header)?;
        self.set_state(header_id, VisibleState::StartOfHiddenBlock);
        self.collapsed.insert(header_id, source.line_id(to)?);
        debug!(header, to, "collapsed block");
        Ok(())
    }

    /// Collapse the marker block opened at `line`. Returns `false` if the line opens none.
    pub fn collapse_folding_block(&mut self, source: &TextSource, line: usize) -> EditResult<bool> {
        if source.line(line)?.folding_start_marker.is_none() {
            return Ok(false);
        }
        let end = Self::find_end_of_folding_block(source, line, usize::MAX)?;
        Ok(self.collapse_block(source, line, end)?.is_some())
    }

    /// Collapse every top-level marker block. Returns the number of collapsed blocks.
    pub fn collapse_all_folding_blocks(&mut self, source: &TextSource) -> EditResult<usize> {
        let mut collapsed = 0;
        let mut i = 0;
        while i < source.line_count() {
            if source.line(i)?.folding_start_marker.is_some() {
                let end = Self::find_end_of_folding_block(source, i, usize::MAX)?;
                if self.collapse_block(source, i, end)?.is_some() {
                    collapsed += 1;
                }
                i = end.max(i);
            }
            i += 1;
        }
        Ok(collapsed)
    }

    /// Expand the collapsed block headed at `line` and forget it.
    ///
    /// Nested blocks still in the collapsed set are folded again.
    pub fn expand_folded_block(&mut self, source: &TextSource, line: usize) -> EditResult<()> {
        let header_id = source.line_id(line)?;
        let last = source.line_count() - 1;
        let mut end = line;
        while end < last && self.visible_state(source.line_id(end + 1)?) == VisibleState::Hidden {
            end += 1;
        }
        for i in line..=end {
            self.set_state(source.line_id(i)?, VisibleState::Visible);
        }
        self.collapsed.remove(&header_id);
        debug!(line, end, "expanded block");
        self.adjust_folding(source)
    }

    /// Make the line at `line` visible after an edit touched it.
    ///
    /// Unhides the surrounding run of folded lines including its header. The collapsed set
    /// is left alone, so [`adjust_folding`](Self::adjust_folding) folds the block again.
    pub fn expand_block(&mut self, source: &TextSource, line: usize) -> EditResult<()> {
        let count = source.line_count();
        if line >= count || self.visible_state(source.line_id(line)?) == VisibleState::Visible {
            return Ok(());
        }
        for i in line..count {
            let id = source.line_id(i)?;
            if self.visible_state(id) == VisibleState::Visible {
                break;
            }
            self.set_state(id, VisibleState::Visible);
        }
        for i in (0..line).rev() {
            let id = source.line_id(i)?;
            if self.visible_state(id) == VisibleState::Visible {
                break;
            }
            self.set_state(id, VisibleState::Visible);
        }
        Ok(())
    }

    /// Fold again every visible line whose id is in the collapsed set, and drop ids of lines
    /// that no longer exist.
    pub fn adjust_folding(&mut self, source: &TextSource) -> EditResult<()> {
        let count = source.line_count();
        let mut present = HashSet::with_capacity(count);
        for i in 0..count {
            present.insert(source.line_id(i)?);
        }
        self.hidden.retain(|id| present.contains(id));
        self.block_starts.retain(|id| present.contains(id));
        self.collapsed.retain(|id, _| present.contains(id));

        // Hidden lines must follow a header or another hidden line.
        let mut folded = false;
        for i in 0..count {
            let id = source.line_id(i)?;
            let state = self.visible_state(id);
            if state == VisibleState::Hidden && !folded {
                self.set_state(id, VisibleState::Visible);
                folded = false;
            } else {
                folded = state != VisibleState::Visible;
            }
        }

        let mut i = 0;
        while i < source.line_count() {
            let id = source.line_id(i)?;
            if let Some(&end_id) = self.collapsed.get(&id)
                && self.visible_state(id) == VisibleState::Visible
            {
                // The recorded header stays the header, even if an edit left it blank.
                match self.block_end(source, i, end_id)? {
                    Some(end) if end > i => self.fold(source, i, end)?,
                    _ => {
                        self.collapsed.remove(&id);
                    }
                }
            }
            i += 1;
        }
        Ok(())
    }

    fn block_end(&self, source: &TextSource, header: usize, end_id: LineId) -> EditResult<Option<usize>> {
        for i in header + 1..source.line_count() {
            if source.line_id(i)? == end_id {
                return Ok(Some(i));
            }
        }
        if source.line(header)?.folding_start_marker.is_some() {
            return Ok(Some(Self::find_end_of_folding_block(source, header, usize::MAX)?));
        }
        Ok(None)
    }

    /// Show every line and forget all collapsed blocks.
    pub fn expand_all(&mut self) {
        self.hidden.clear();
        self.block_starts.clear();
        self.collapsed.clear();
    }
}
