//! Selections and ranges of text.
//!
//! A [`Range`] is a pair of [`Place`]s. In linear mode `start` is the caret and `end` the
//! anchor, and the covered text runs from the earlier place to the later one. In column
//! mode the range denotes the rectangle spanned by both places; column navigation moves
//! `end` and keeps `start` as the rectangle's anchor corner.
//!
//! Navigation takes a [`Viewport`] so that folded (hidden) lines are skipped. The
//! `*_through_folded` variants ignore folding and only need the [`TextSource`].

use crate::error::EditResult;
use crate::place::Place;
use crate::source::TextSource;
use crate::view::Viewport;

/// Rectangle spanned by a range: min/max of both endpoints on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Topmost line.
    pub start_line: usize,
    /// Leftmost character column.
    pub start_char: usize,
    /// Bottom line.
    pub end_line: usize,
    /// Rightmost character column.
    pub end_char: usize,
}

/// A selection or a span of text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Range {
    start: Place,
    end: Place,
    column_mode: bool,
    preferred_column: Option<usize>,
}

impl PartialEq for Range {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.column_mode == other.column_mode
    }
}

impl Eq for Range {}

/// Coarse character classes used by word navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Identifier,
    Space,
    Other,
}

fn char_class(ch: char) -> CharClass {
    if ch == '_' || ch.is_alphanumeric() {
        CharClass::Identifier
    } else if ch == ' ' || ch == '\t' {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

impl Range {
    /// Linear range with caret `start` and anchor `end`.
    pub const fn new(start: Place, end: Place) -> Self {
        Self {
            start,
            end,
            column_mode: false,
            preferred_column: None,
        }
    }

    /// Empty range at `place`.
    pub const fn at(place: Place) -> Self {
        Self::new(place, place)
    }

    /// Column-mode range spanning the rectangle of `start` and `end`.
    pub const fn column(start: Place, end: Place) -> Self {
        Self {
            start,
            end,
            column_mode: true,
            preferred_column: None,
        }
    }

    /// Linear range covering whole lines `from..=to`.
    pub fn lines(source: &TextSource, from: usize, to: usize) -> EditResult<Self> {
        Ok(Self::new(
            Place::new(from, 0),
            Place::new(to, source.line_len(to)?),
        ))
    }

    /// Linear range covering the whole document, caret at the end.
    pub fn all(source: &TextSource) -> EditResult<Self> {
        let last = source.line_count().saturating_sub(1);
        Ok(Self::new(
            Place::new(last, source.line_len(last)?),
            Place::origin(),
        ))
    }

    /// Select the whole document in linear mode, caret at the end.
    pub fn select_all(&mut self, source: &TextSource) -> EditResult<()> {
        *self = Self::all(source)?;
        Ok(())
    }

    /// Caret position (linear mode) or anchor corner (column mode).
    pub fn start(&self) -> Place {
        self.start
    }

    /// Anchor (linear mode) or moving corner (column mode).
    pub fn end(&self) -> Place {
        self.end
    }

    /// Move both endpoints to `place`.
    pub fn set_start(&mut self, place: Place) {
        self.start = place;
        self.end = place;
        self.preferred_column = None;
    }

    /// Move only the anchor.
    pub fn set_end(&mut self, place: Place) {
        self.end = place;
        self.preferred_column = None;
    }

    /// Set both endpoints.
    pub fn set(&mut self, start: Place, end: Place) {
        self.start = start;
        self.end = end;
        self.preferred_column = None;
    }

    /// Returns `true` in column (rectangular) mode.
    pub fn is_column_mode(&self) -> bool {
        self.column_mode
    }

    /// Switch between linear and column mode.
    pub fn set_column_mode(&mut self, column_mode: bool) {
        self.column_mode = column_mode;
    }

    /// Column that vertical navigation tries to return to.
    pub fn preferred_column(&self) -> Option<usize> {
        self.preferred_column
    }

    /// Returns `true` if the range covers no characters.
    ///
    /// A column range is empty when its rectangle has zero width, whatever its height.
    pub fn is_empty(&self) -> bool {
        if self.column_mode {
            self.start.ch == self.end.ch
        } else {
            self.start == self.end
        }
    }

    /// First line covered.
    pub fn from_line(&self) -> usize {
        self.start.line.min(self.end.line)
    }

    /// Last line covered.
    pub fn to_line(&self) -> usize {
        self.start.line.max(self.end.line)
    }

    /// Character column of the earlier endpoint.
    pub fn from_x(&self) -> usize {
        self.start.min(self.end).ch
    }

    /// Character column of the later endpoint.
    pub fn to_x(&self) -> usize {
        self.start.max(self.end).ch
    }

    /// The spanned rectangle.
    pub fn bounds(&self) -> Bounds {
        Bounds {
            start_line: self.start.line.min(self.end.line),
            start_char: self.start.ch.min(self.end.ch),
            end_line: self.start.line.max(self.end.line),
            end_char: self.start.ch.max(self.end.ch),
        }
    }

    /// Order the endpoints so that `start <= end`.
    pub fn normalize(&mut self) {
        if self.start > self.end {
            self.inverse();
        }
    }

    /// Normalized copy.
    pub fn normalized(&self) -> Self {
        let mut r = *self;
        r.normalize();
        r
    }

    /// Swap the endpoints.
    pub fn inverse(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }

    /// Grow to whole lines: normalized, from column 0 of the first line to the end of the last.
    pub fn expand(&mut self, source: &TextSource) -> EditResult<()> {
        self.normalize();
        let end_len = source.line_len(self.end.line)?;
        self.start = Place::new(self.start.line, 0);
        self.end = Place::new(self.end.line, end_len);
        self.preferred_column = None;
        Ok(())
    }

    /// Returns `true` if `place` lies inside the range.
    ///
    /// Linear ranges include both endpoints; column ranges cover `[min, max)` characters
    /// on each of their lines.
    pub fn contains(&self, place: Place) -> bool {
        if self.column_mode {
            let b = self.bounds();
            return place.line >= b.start_line
                && place.line <= b.end_line
                && place.ch >= b.start_char
                && place.ch < b.end_char;
        }
        let from = self.start.min(self.end);
        let to = self.start.max(self.end);
        if place.line < from.line || place.line > to.line {
            return false;
        }
        if place.line == from.line && place.ch < from.ch {
            return false;
        }
        !(place.line == to.line && place.ch > to.ch)
    }

    /// Overlap with `other`; an empty range at `start` when they do not overlap.
    ///
    /// In column mode only a single-line `other` inside the rectangle's lines can
    /// intersect.
    pub fn intersection_with(&self, other: &Range) -> Range {
        if self.column_mode {
            if other.start.line != other.end.line {
                return Range::at(self.start);
            }
            let b = self.bounds();
            let line = other.start.line;
            if line < b.start_line || line > b.end_line {
                return Range::at(self.start);
            }
            let row = Range::new(Place::new(line, b.start_char), Place::new(line, b.end_char));
            return row.intersection_with(other);
        }
        let r1 = self.normalized();
        let r2 = other.normalized();
        let start = r1.start.max(r2.start);
        let end = r1.end.min(r2.end);
        if end < start {
            return Range::at(self.start);
        }
        Range::new(start, end)
    }

    /// Smallest linear range covering both.
    pub fn union_with(&self, other: &Range) -> Range {
        let r1 = self.normalized();
        let r2 = other.normalized();
        Range::new(r1.start.min(r2.start), r1.end.max(r2.end))
    }

    /// Per-line sub-ranges of a column range; a linear range yields itself.
    ///
    /// Each sub-range runs from the rectangle's left edge to its right edge clipped to the
    /// line length, so on short lines `end < start`. Lines that end before the left edge
    /// are skipped unless `include_empty`.
    pub fn sub_ranges(&self, source: &TextSource, include_empty: bool) -> EditResult<Vec<Range>> {
        if !self.column_mode {
            return Ok(vec![*self]);
        }
        let b = self.bounds();
        let mut ranges = Vec::with_capacity(b.end_line - b.start_line + 1);
        for y in b.start_line..=b.end_line {
            let len = source.line_len(y)?;
            if b.start_char > len && !include_empty {
                continue;
            }
            ranges.push(Range::new(
                Place::new(y, b.start_char),
                Place::new(y, b.end_char.min(len)),
            ));
        }
        Ok(ranges)
    }

    /// Covered character spans as `(line, from, to)`, half-open and clipped to each line.
    pub(crate) fn char_spans(&self, source: &TextSource) -> EditResult<Vec<(usize, usize, usize)>> {
        let mut spans = Vec::new();
        if self.column_mode {
            let b = self.bounds();
            for y in b.start_line..=b.end_line {
                let len = source.line_len(y)?;
                spans.push((y, b.start_char.min(len), b.end_char.min(len)));
            }
            return Ok(spans);
        }
        let from = self.start.min(self.end);
        let to = self.start.max(self.end);
        for y in from.line..=to.line {
            let len = source.line_len(y)?;
            let from_x = if y == from.line { from.ch.min(len) } else { 0 };
            let to_x = if y == to.line { to.ch.min(len) } else { len };
            spans.push((y, from_x, to_x.max(from_x)));
        }
        Ok(spans)
    }

    /// Covered text.
    ///
    /// Lines are joined with the source's [`text_line_ending`](TextSource::text_line_ending),
    /// CRLF unless changed. Column ranges yield each line's slice of the rectangle.
    pub fn text(&self, source: &TextSource) -> EditResult<String> {
        let line_ending = source.text_line_ending();
        if self.column_mode {
            let mut out = String::new();
            for (i, (y, from, to)) in self.char_spans(source)?.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(line_ending.as_str());
                }
                out.push_str(&source.line(y)?.text_between(from, to));
            }
            return Ok(out);
        }
        Ok(line_ending.apply_to_text(&self.flat_text(source)?.text))
    }

    /// Character before the caret, `'\n'` at a line start.
    pub fn char_before_start(&self, source: &TextSource) -> EditResult<char> {
        if self.start.ch == 0 {
            return Ok('\n');
        }
        Ok(source
            .line(self.start.line)?
            .char_at(self.start.ch - 1)
            .unwrap_or('\n'))
    }

    /// Character after the caret, `'\n'` at a line end.
    pub fn char_after_start(&self, source: &TextSource) -> EditResult<char> {
        Ok(source
            .line(self.start.line)?
            .char_at(self.start.ch)
            .unwrap_or('\n'))
    }

    /// Returns `true` if the range touches a character carrying a read-only style.
    ///
    /// An empty range is read-only only when the characters on both sides of it are.
    pub fn is_read_only(&self, source: &TextSource) -> EditResult<bool> {
        let mask = source.styles().read_only_mask();
        if mask.is_empty() {
            return Ok(false);
        }
        if self.is_empty() {
            for r in self.sub_ranges(source, false)? {
                let line = source.line(r.start.line)?;
                let ch = r.start.ch;
                if ch > 0 && ch < line.len() {
                    let left = line.cells()[ch - 1].style;
                    let right = line.cells()[ch].style;
                    if left.intersects(mask) && right.intersects(mask) {
                        return Ok(true);
                    }
                }
            }
            return Ok(false);
        }
        for (y, from, to) in self.char_spans(source)? {
            let line = source.line(y)?;
            if line.cells()[from..to].iter().any(|c| c.style.intersects(mask)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // --- Navigation ---

    fn collapse_to(&mut self, place: Place) {
        self.set_start(place);
    }

    /// Move the caret one character left, onto the previous visible line's end at a line
    /// start.
    pub fn go_left(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start > self.end {
            self.collapse_to(self.end);
            return Ok(true);
        }
        if self.start.ch > 0 && vp.is_navigable(self.start.line)? {
            self.start.ch -= 1;
        } else {
            let line = vp.prev_visible_line(self.start.line)?;
            if line == self.start.line {
                return Ok(false);
            }
            self.start = Place::new(line, vp.line_len(line)?);
        }
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
        Ok(true)
    }

    /// Move the caret one character right, onto the next visible line's start at a line end.
    pub fn go_right(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start < self.end {
            self.collapse_to(self.end);
            return Ok(true);
        }
        if self.start.ch < vp.line_len(self.start.line)? && vp.is_navigable(self.start.line)? {
            self.start.ch += 1;
        } else {
            let line = vp.next_visible_line(self.start.line)?;
            if line == self.start.line {
                return Ok(false);
            }
            self.start = Place::new(line, 0);
        }
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
        Ok(true)
    }

    fn step_vertical(&mut self, vp: &Viewport<'_>, up: bool, steps: usize) -> EditResult<bool> {
        let preferred = self.preferred_column.unwrap_or(self.start.ch);
        let mut line = self.start.line;
        for _ in 0..steps {
            let next = if up {
                vp.prev_visible_line(line)?
            } else {
                vp.next_visible_line(line)?
            };
            if next == line {
                break;
            }
            line = next;
        }
        if line == self.start.line {
            return Ok(false);
        }
        self.start = Place::new(line, preferred.min(vp.line_len(line)?));
        self.preferred_column = Some(preferred);
        Ok(true)
    }

    /// Move the caret to the previous visible line, keeping the preferred column.
    pub fn go_up(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start.line > self.end.line {
            self.collapse_to(self.end);
            return Ok(true);
        }
        let moved = self.step_vertical(vp, true, 1)?;
        if !extend {
            self.end = self.start;
        }
        Ok(moved)
    }

    /// Move the caret to the next visible line, keeping the preferred column.
    pub fn go_down(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start.line < self.end.line {
            self.collapse_to(self.end);
            return Ok(true);
        }
        let moved = self.step_vertical(vp, false, 1)?;
        if !extend {
            self.end = self.start;
        }
        Ok(moved)
    }

    /// Move the caret up by one page of visible lines.
    pub fn go_page_up(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        let moved = self.step_vertical(vp, true, vp.page_lines().max(1))?;
        if !extend {
            self.end = self.start;
        }
        Ok(moved)
    }

    /// Move the caret down by one page of visible lines.
    pub fn go_page_down(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        let moved = self.step_vertical(vp, false, vp.page_lines().max(1))?;
        if !extend {
            self.end = self.start;
        }
        Ok(moved)
    }

    /// Move the caret to the start of its line.
    pub fn go_home(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !vp.is_navigable(self.start.line)? {
            return Ok(false);
        }
        self.start = Place::new(self.start.line, 0);
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
        Ok(true)
    }

    /// Move the caret to the end of its line.
    pub fn go_end(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !vp.is_navigable(self.start.line)? {
            return Ok(false);
        }
        self.start = Place::new(self.start.line, vp.line_len(self.start.line)?);
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
        Ok(true)
    }

    /// Move the caret to the document start.
    pub fn go_first(&mut self, extend: bool) {
        self.column_mode = false;
        self.start = Place::origin();
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
    }

    /// Move the caret to the end of the last visible line.
    pub fn go_last(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<()> {
        self.column_mode = false;
        let mut line = vp.line_count().saturating_sub(1);
        if !vp.is_navigable(line)? {
            line = vp.prev_visible_line(line)?;
        }
        self.start = Place::new(line, vp.line_len(line)?);
        if !extend {
            self.end = self.start;
        }
        self.preferred_column = None;
        Ok(())
    }

    /// Move the caret to the start of the current or previous word.
    pub fn go_word_left(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start > self.end {
            self.collapse_to(self.end);
            return Ok(true);
        }
        let source = vp.source();
        let mut r = *self;
        let mut moved = false;
        while char_class(r.char_before_start(source)?) == CharClass::Space {
            if !r.go_left(vp, extend)? {
                break;
            }
            moved = true;
        }
        let before = r.char_before_start(source)?;
        if before != '\n' {
            let class = char_class(before);
            loop {
                let c = r.char_before_start(source)?;
                if c == '\n' || char_class(c) != class || !r.go_left(vp, extend)? {
                    break;
                }
                moved = true;
            }
        } else if !moved {
            moved = r.go_left(vp, extend)?;
        }
        self.start = r.start;
        self.end = r.end;
        self.preferred_column = None;
        Ok(moved)
    }

    /// Move the caret past the end of the current or next word.
    pub fn go_word_right(&mut self, vp: &Viewport<'_>, extend: bool) -> EditResult<bool> {
        self.column_mode = false;
        if !extend && self.start < self.end {
            self.collapse_to(self.end);
            return Ok(true);
        }
        let source = vp.source();
        let mut r = *self;
        let mut moved = false;
        if r.char_after_start(source)? == '\n' {
            if !r.go_right(vp, extend)? {
                return Ok(false);
            }
            moved = true;
        }
        while char_class(r.char_after_start(source)?) == CharClass::Space {
            if !r.go_right(vp, extend)? {
                break;
            }
            moved = true;
        }
        let after = r.char_after_start(source)?;
        if after != '\n' {
            let class = char_class(after);
            loop {
                let c = r.char_after_start(source)?;
                if c == '\n' || char_class(c) != class || !r.go_right(vp, extend)? {
                    break;
                }
                moved = true;
            }
        }
        self.start = r.start;
        self.end = r.end;
        self.preferred_column = None;
        Ok(moved)
    }

    /// Move the caret one character left, ignoring folding.
    pub fn go_left_through_folded(&mut self, source: &TextSource) -> EditResult<bool> {
        self.column_mode = false;
        if self.start.ch == 0 && self.start.line == 0 {
            return Ok(false);
        }
        if self.start.ch > 0 {
            self.start.ch -= 1;
        } else {
            let line = self.start.line - 1;
            self.start = Place::new(line, source.line_len(line)?);
        }
        self.end = self.start;
        self.preferred_column = None;
        Ok(true)
    }

    /// Move the caret one character right, ignoring folding.
    pub fn go_right_through_folded(&mut self, source: &TextSource) -> EditResult<bool> {
        self.column_mode = false;
        let last = source.line_count().saturating_sub(1);
        let len = source.line_len(self.start.line)?;
        if self.start.line >= last && self.start.ch >= len {
            return Ok(false);
        }
        if self.start.ch < len {
            self.start.ch += 1;
        } else {
            self.start = Place::new(self.start.line + 1, 0);
        }
        self.end = self.start;
        self.preferred_column = None;
        Ok(true)
    }

    /// Grow or shrink a column selection to the left.
    pub fn go_left_column_mode(&mut self) -> bool {
        self.column_mode = true;
        if self.end.ch == 0 {
            return false;
        }
        self.end.ch -= 1;
        true
    }

    /// Grow or shrink a column selection to the right, up to the longest spanned line.
    pub fn go_right_column_mode(&mut self, vp: &Viewport<'_>) -> EditResult<bool> {
        self.column_mode = true;
        let b = self.bounds();
        let mut longest = 0;
        for y in b.start_line..=b.end_line {
            longest = longest.max(vp.line_len(y)?);
        }
        if self.end.ch >= longest {
            return Ok(false);
        }
        self.end.ch += 1;
        Ok(true)
    }

    /// Move the column selection's moving corner to the previous visible line.
    pub fn go_up_column_mode(&mut self, vp: &Viewport<'_>) -> EditResult<bool> {
        self.column_mode = true;
        let line = vp.prev_visible_line(self.end.line)?;
        if line == self.end.line {
            return Ok(false);
        }
        self.end.line = line;
        Ok(true)
    }

    /// Move the column selection's moving corner to the next visible line.
    pub fn go_down_column_mode(&mut self, vp: &Viewport<'_>) -> EditResult<bool> {
        self.column_mode = true;
        let line = vp.next_visible_line(self.end.line)?;
        if line == self.end.line {
            return Ok(false);
        }
        self.end.line = line;
        Ok(true)
    }
}
