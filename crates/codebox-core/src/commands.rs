//! Reversible edit commands.
//!
//! Every mutation of a document that should be undoable is a [`Command`]. A command is a
//! plain value: [`CommandKind`] holds the edit parameters plus the payload its undo needs,
//! and the command records the selection before (`sel`) and after (`last_sel`) it ran.
//! Cloning a command yields an independent copy, which is how one edit is replayed on every
//! line of a column selection.
//!
//! Commands run against an [`EditContext`], the explicit pairing of a document's
//! [`TextSource`] with the [`View`] whose selection the edit follows. Most callers go through
//! [`Document::execute`](crate::Document::execute) rather than calling
//! [`Command::execute`] directly, so that the edit is recorded in the undo history.
//!
//! # Example
//!
//! ```rust
//! use codebox_core::{Command, EditContext, Place, TextSource, View};
//!
//! let mut source = TextSource::from_text("hello");
//! let mut view = View::default();
//! view.set_caret(Place::new(0, 5));
//!
//! let mut cmd = Command::insert_text(" world");
//! let mut ctx = EditContext::new(&mut source, &mut view);
//! assert!(cmd.execute(&mut ctx).unwrap());
//! assert_eq!(source.text(), "hello world");
//!
//! let mut ctx = EditContext::new(&mut source, &mut view);
//! cmd.undo(&mut ctx).unwrap();
//! assert_eq!(source.text(), "hello");
//! ```

use crate::error::{EditError, EditResult, StructuralViolation};
use crate::events::TextChanging;
use crate::line::Cell;
use crate::line_ending;
use crate::place::Place;
use crate::range::Range;
use crate::source::TextSource;
use crate::view::View;
use tracing::debug;

/// Character that deletes the character left of the caret when inserted.
pub const BACKSPACE: char = '\u{8}';

/// A document paired with the view whose selection an edit follows.
pub struct EditContext<'a> {
    /// The document being edited.
    pub source: &'a mut TextSource,
    /// The view owning the selection.
    pub view: &'a mut View,
    /// Whether the edit may insert or remove lines. Cleared while a column edit is replayed.
    pub allow_line_changes: bool,
}

impl<'a> EditContext<'a> {
    /// Context allowing line changes.
    pub fn new(source: &'a mut TextSource, view: &'a mut View) -> Self {
        Self {
            source,
            view,
            allow_line_changes: true,
        }
    }

    fn can_break_lines(&self) -> bool {
        self.allow_line_changes && self.view.settings().multiline
    }
}

/// The edit a [`Command`] performs, with the data needed to reverse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Insert one character at the caret.
    ///
    /// `'\n'` splits the line, [`BACKSPACE`] deletes left (merging lines at a line start) and
    /// `'\t'` inserts spaces up to the next tab stop.
    InsertChar {
        /// The character.
        ch: char,
        /// Character removed by a backspace (`'\n'` for a line merge).
        deleted: Option<char>,
    },
    /// Insert a string at the caret.
    InsertText {
        /// LF-normalized text.
        text: String,
    },
    /// Delete the selected text.
    ClearSelected {
        /// The deleted text.
        deleted: String,
    },
    /// Replace several ranges, each with its own text.
    Replace {
        /// Normalized ranges sorted by start, with their replacement.
        edits: Vec<(Range, String)>,
        /// Original text of each range.
        previous: Vec<String>,
    },
    /// Remove whole lines.
    RemoveLines {
        /// Sorted, deduplicated line indices.
        indices: Vec<usize>,
        /// Text of each removed line.
        removed: Vec<String>,
        /// An empty line was added because the document became empty.
        placeholder: bool,
    },
    /// Replay a command on every line of a column selection.
    MultiRange {
        /// The replayed command.
        inner: Box<Command>,
        /// Per-line commands that changed the document.
        applied: Vec<Command>,
    },
    /// Record the selection so that undo can restore it.
    Select,
}

impl CommandKind {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertChar { .. } => "insert_char",
            Self::InsertText { .. } => "insert_text",
            Self::ClearSelected { .. } => "clear_selected",
            Self::Replace { .. } => "replace",
            Self::RemoveLines { .. } => "remove_lines",
            Self::MultiRange { .. } => "multi_range",
            Self::Select => "select",
        }
    }
}

/// An undoable edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    sel: Range,
    last_sel: Range,
}

impl Command {
    fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            sel: Range::default(),
            last_sel: Range::default(),
        }
    }

    /// Insert one character. `'\r'` is treated as `'\n'`.
    pub fn insert_char(ch: char) -> Self {
        let ch = if ch == '\r' { '\n' } else { ch };
        Self::new(CommandKind::InsertChar { ch, deleted: None })
    }

    /// Insert a string. Line endings are normalized to `'\n'`.
    pub fn insert_text(text: impl AsRef<str>) -> Self {
        Self::new(CommandKind::InsertText {
            text: clean_text(text.as_ref()),
        })
    }

    /// Delete the selection.
    pub fn clear_selected() -> Self {
        Self::new(CommandKind::ClearSelected {
            deleted: String::new(),
        })
    }

    /// Replace every range with the same text.
    pub fn replace_text(ranges: impl IntoIterator<Item = Range>, text: &str) -> Self {
        Self::replace_multiple(ranges.into_iter().map(|r| (r, text.to_string())))
    }

    /// Replace each range with its own text. Ranges must not overlap.
    pub fn replace_multiple(edits: impl IntoIterator<Item = (Range, String)>) -> Self {
        let mut edits: Vec<(Range, String)> = edits
            .into_iter()
            .map(|(r, text)| {
                let r = r.normalized();
                (Range::new(r.start(), r.end()), line_ending::normalize(&text))
            })
            .collect();
        edits.sort_by_key(|(r, _)| r.start());
        Self::new(CommandKind::Replace {
            edits,
            previous: Vec::new(),
        })
    }

    /// Remove the lines at `indices`, in any order.
    pub fn remove_lines(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self::new(CommandKind::RemoveLines {
            indices,
            removed: Vec::new(),
            placeholder: false,
        })
    }

    /// Record the current selection.
    pub fn select() -> Self {
        Self::new(CommandKind::Select)
    }

    /// Replay `inner` on every line of the column selection current at execution.
    pub fn multi_range(inner: Command) -> Self {
        Self::new(CommandKind::MultiRange {
            inner: Box::new(inner),
            applied: Vec::new(),
        })
    }

    /// The edit.
    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Selection before the last execution.
    pub fn sel(&self) -> Range {
        self.sel
    }

    /// Selection after the last execution.
    pub fn last_sel(&self) -> Range {
        self.last_sel
    }

    /// Returns `true` for edits that act at the selection and are therefore replayed per line
    /// in column mode. Replacements and line removal carry their own positions.
    pub fn follows_selection(&self) -> bool {
        matches!(
            self.kind,
            CommandKind::InsertChar { .. }
                | CommandKind::InsertText { .. }
                | CommandKind::ClearSelected { .. }
        )
    }

    /// Returns `true` if the edit would touch text carrying a read-only style.
    ///
    /// Selection edits check `selection`, replacements check each target range and line
    /// removal checks each whole line.
    pub fn touches_read_only(&self, source: &TextSource, selection: &Range) -> EditResult<bool> {
        match &self.kind {
            CommandKind::InsertChar { .. }
            | CommandKind::InsertText { .. }
            | CommandKind::ClearSelected { .. }
            | CommandKind::MultiRange { .. } => selection.is_read_only(source),
            CommandKind::Replace { edits, .. } => {
                for (r, _) in edits {
                    if r.is_read_only(source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CommandKind::RemoveLines { indices, .. } => {
                for &index in indices {
                    if Range::lines(source, index, index)?.is_read_only(source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            CommandKind::Select => Ok(false),
        }
    }

    /// Apply the edit.
    ///
    /// Returns `Ok(false)` when nothing changed (empty selection, vetoed by a
    /// [`TextChanging`] hook, backspace at the document start). An error leaves the document
    /// unchanged.
    ///
    /// The edit is one notification batch: subscribers see a single `TextChanged` and the
    /// text version moves once, however many lines a column replay touched.
    pub fn execute(&mut self, ctx: &mut EditContext<'_>) -> EditResult<bool> {
        ctx.source.begin_update();
        let result = self.apply(ctx);
        ctx.source.end_update();
        result
    }

    fn apply(&mut self, ctx: &mut EditContext<'_>) -> EditResult<bool> {
        let sel = *ctx.view.selection();
        self.sel = sel;
        let applied = match &mut self.kind {
            CommandKind::InsertChar { ch, deleted } => exec_insert_char(ctx, ch, deleted)?,
            CommandKind::InsertText { text } => exec_insert_text(ctx, text)?,
            CommandKind::ClearSelected { deleted } => exec_clear_selected(ctx, deleted)?,
            CommandKind::Replace { edits, previous } => exec_replace(ctx, edits, previous)?,
            CommandKind::RemoveLines {
                indices,
                removed,
                placeholder,
            } => exec_remove_lines(ctx, indices, removed, placeholder)?,
            CommandKind::MultiRange { inner, applied } => {
                exec_multi_range(ctx, inner, sel, applied)?
            }
            CommandKind::Select => true,
        };
        self.last_sel = *ctx.view.selection();
        debug!(command = self.kind.name(), applied, "executed command");
        if applied {
            self.notify(ctx);
        }
        Ok(applied)
    }

    /// Reverse the last execution and restore the selection it started from.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) -> EditResult<()> {
        ctx.source.begin_update();
        let result = self.revert(ctx);
        ctx.source.end_update();
        result
    }

    fn revert(&mut self, ctx: &mut EditContext<'_>) -> EditResult<()> {
        let (sel, last_sel) = (self.sel, self.last_sel);
        match &mut self.kind {
            CommandKind::InsertChar { ch, deleted } => undo_insert_char(ctx, *ch, *deleted, sel, last_sel)?,
            CommandKind::InsertText { .. } => {
                remove_span(ctx.source, sel.start(), last_sel.start())?;
            }
            CommandKind::ClearSelected { deleted } => {
                insert_literal(ctx.source, last_sel.start(), deleted)?;
            }
            CommandKind::Replace { edits, previous } => undo_replace(ctx.source, edits, previous)?,
            CommandKind::RemoveLines {
                indices,
                removed,
                placeholder,
            } => {
                if *placeholder {
                    ctx.source.remove_lines(0, 1)?;
                }
                for (index, text) in indices.iter().zip(removed.iter()) {
                    let mut line = ctx.source.create_line();
                    line.set_text(text);
                    ctx.source.insert_line(*index, line)?;
                }
            }
            CommandKind::MultiRange { applied, .. } => {
                for cmd in applied.iter_mut().rev() {
                    cmd.undo(ctx)?;
                }
            }
            CommandKind::Select => {}
        }
        ctx.view.set_selection(sel);
        debug!(command = self.kind.name(), "undid command");
        if !matches!(self.kind, CommandKind::Select) {
            self.notify(ctx);
        }
        Ok(())
    }

    fn notify(&self, ctx: &mut EditContext<'_>) {
        if matches!(self.kind, CommandKind::Select) {
            return;
        }
        let mut from = self.sel.from_line().min(self.last_sel.from_line());
        let mut to = self.sel.to_line().max(self.last_sel.to_line());
        match &self.kind {
            CommandKind::Replace { edits, .. } => {
                for (r, _) in edits {
                    from = from.min(r.from_line());
                    to = to.max(r.to_line());
                }
            }
            CommandKind::RemoveLines { indices, .. } => {
                if let (Some(first), Some(last)) = (indices.first(), indices.last()) {
                    from = from.min(*first);
                    to = to.max(*last);
                }
            }
            _ => {}
        }
        let last = ctx.source.line_count().saturating_sub(1);
        let (from, to) = (from.min(last), to.min(last));
        ctx.source.text_changed(from, to);
        ctx.source.need_recalc(from, to);
        ctx.source.recalc_word_wrap(from, to);
    }
}

fn clean_text(text: &str) -> String {
    let mut text = line_ending::normalize(text);
    text.retain(|c| c != BACKSPACE);
    text
}

fn check_place(source: &TextSource, place: Place) -> EditResult<()> {
    let len = source.line_len(place.line)?;
    if place.ch > len {
        return Err(EditError::out_of_range(place.ch, len));
    }
    Ok(())
}

/// Place reached by inserting `text` at `start`.
fn advance(start: Place, text: &str) -> Place {
    match text.rsplit_once('\n') {
        Some((head, tail)) => Place::new(
            start.line + head.matches('\n').count() + 1,
            tail.chars().count(),
        ),
        None => Place::new(start.line, start.ch + text.chars().count()),
    }
}

fn break_line(source: &mut TextSource, at: Place) -> EditResult<()> {
    let tail = source.line_mut(at.line)?.split_off(at.ch);
    let mut line = source.create_line();
    line.extend(tail);
    source.insert_line(at.line + 1, line)
}

/// Append the line after `index` to it.
fn merge_lines(source: &mut TextSource, index: usize) -> EditResult<()> {
    let next = source.line(index + 1)?.cells().to_vec();
    source.line_mut(index)?.extend(next);
    source.remove_lines(index + 1, 1)
}

/// Insert `text` at `at` without tab expansion, splitting lines at `'\n'`.
fn insert_literal(source: &mut TextSource, at: Place, text: &str) -> EditResult<Place> {
    check_place(source, at)?;
    let mut pos = at;
    for (i, piece) in text.split('\n').enumerate() {
        if i > 0 {
            break_line(source, pos)?;
            pos = Place::new(pos.line + 1, 0);
        }
        source
            .line_mut(pos.line)?
            .insert_cells(pos.ch, piece.chars().map(Cell::from));
        pos.ch += piece.chars().count();
    }
    Ok(pos)
}

/// Delete the text between two places (in either order), returning it.
fn remove_span(source: &mut TextSource, a: Place, b: Place) -> EditResult<String> {
    let (from, to) = (a.min(b), a.max(b));
    check_place(source, from)?;
    check_place(source, to)?;
    let text = Range::new(from, to).flat_text(source)?.text.clone();
    if from.line == to.line {
        source
            .line_mut(from.line)?
            .remove_range(from.ch, to.ch - from.ch);
    } else {
        let tail = source.line_mut(to.line)?.split_off(to.ch);
        let first = source.line_mut(from.line)?;
        first.split_off(from.ch);
        first.extend(tail);
        source.remove_lines(from.line + 1, to.line - from.line)?;
    }
    Ok(text)
}

/// Insert `ch` at the caret and move the caret past it.
fn insert_char_at(
    ctx: &mut EditContext<'_>,
    ch: char,
    deleted: &mut Option<char>,
) -> EditResult<bool> {
    let caret = ctx.view.caret();
    check_place(ctx.source, caret)?;
    match ch {
        '\n' => {
            if !ctx.can_break_lines() {
                return Err(StructuralViolation::LineBreakNotAllowed.into());
            }
            break_line(ctx.source, caret)?;
            ctx.view.set_caret(Place::new(caret.line + 1, 0));
        }
        BACKSPACE if caret.ch == 0 => {
            if caret.line == 0 {
                return Ok(false);
            }
            if !ctx.allow_line_changes {
                return Err(StructuralViolation::LineMergeNotAllowed.into());
            }
            let prev_len = ctx.source.line_len(caret.line - 1)?;
            merge_lines(ctx.source, caret.line - 1)?;
            *deleted = Some('\n');
            ctx.view.set_caret(Place::new(caret.line - 1, prev_len));
        }
        BACKSPACE => {
            let cell = ctx.source.line_mut(caret.line)?.remove(caret.ch - 1);
            *deleted = Some(cell.ch);
            ctx.view.set_caret(Place::new(caret.line, caret.ch - 1));
        }
        '\t' => {
            let tab = ctx.view.settings().tab_length.max(1);
            let spaces = tab - caret.ch % tab;
            ctx.source
                .line_mut(caret.line)?
                .insert_cells(caret.ch, std::iter::repeat_n(Cell::new(' '), spaces));
            ctx.view.set_caret(Place::new(caret.line, caret.ch + spaces));
        }
        _ => {
            ctx.source.line_mut(caret.line)?.insert(caret.ch, Cell::new(ch));
            ctx.view.set_caret(Place::new(caret.line, caret.ch + 1));
        }
    }
    Ok(true)
}

fn exec_insert_char(
    ctx: &mut EditContext<'_>,
    ch: &mut char,
    deleted: &mut Option<char>,
) -> EditResult<bool> {
    let mut args = TextChanging::insertion(ch.to_string());
    if !ctx.source.text_changing(&mut args) {
        return Ok(false);
    }
    // A hook may substitute another single character.
    let mut chars = args.text().chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        *ch = if c == '\r' { '\n' } else { c };
    }
    *deleted = None;
    insert_char_at(ctx, *ch, deleted)
}

fn undo_insert_char(
    ctx: &mut EditContext<'_>,
    ch: char,
    deleted: Option<char>,
    sel: Range,
    last_sel: Range,
) -> EditResult<()> {
    let at = sel.start();
    match ch {
        '\n' => merge_lines(ctx.source, at.line),
        BACKSPACE => match deleted {
            Some('\n') => break_line(ctx.source, last_sel.start()),
            Some(c) => {
                let to = last_sel.start();
                ctx.source.line_mut(to.line)?.insert(to.ch, Cell::new(c));
                Ok(())
            }
            None => Ok(()),
        },
        '\t' => {
            let count = last_sel.start().ch.saturating_sub(at.ch);
            ctx.source.line_mut(at.line)?.remove_range(at.ch, count);
            Ok(())
        }
        _ => {
            ctx.source.line_mut(at.line)?.remove(at.ch);
            Ok(())
        }
    }
}

fn exec_insert_text(ctx: &mut EditContext<'_>, text: &mut String) -> EditResult<bool> {
    let mut args = TextChanging::insertion(text.clone());
    if !ctx.source.text_changing(&mut args) {
        return Ok(false);
    }
    *text = clean_text(args.text());
    if text.is_empty() {
        return Ok(false);
    }
    if text.contains('\n') && !ctx.can_break_lines() {
        return Err(StructuralViolation::LineBreakNotAllowed.into());
    }
    check_place(ctx.source, ctx.view.caret())?;

    let mut deleted = None;
    for c in text.chars() {
        insert_char_at(ctx, c, &mut deleted)?;
    }
    Ok(true)
}

fn exec_clear_selected(ctx: &mut EditContext<'_>, deleted: &mut String) -> EditResult<bool> {
    let sel = *ctx.view.selection();
    let (from, to) = (sel.start().min(sel.end()), sel.start().max(sel.end()));
    check_place(ctx.source, from)?;
    check_place(ctx.source, to)?;
    if from == to {
        return Ok(false);
    }
    if from.line != to.line && !ctx.allow_line_changes {
        return Err(StructuralViolation::LineMergeNotAllowed.into());
    }
    if !ctx.source.text_changing(&mut TextChanging::deletion()) {
        return Ok(false);
    }
    *deleted = remove_span(ctx.source, from, to)?;
    ctx.view.set_caret(from);
    Ok(true)
}

fn exec_replace(
    ctx: &mut EditContext<'_>,
    edits: &[(Range, String)],
    previous: &mut Vec<String>,
) -> EditResult<bool> {
    if edits.is_empty() {
        return Ok(false);
    }
    // Stale places are an error, never clamped.
    for (r, _) in edits.iter() {
        check_place(ctx.source, r.start())?;
        check_place(ctx.source, r.end())?;
    }
    let multiline = edits
        .iter()
        .any(|(r, text)| r.from_line() != r.to_line() || text.contains('\n'));
    if multiline && !ctx.allow_line_changes {
        return Err(StructuralViolation::LineBreakNotAllowed.into());
    }
    if !ctx.source.text_changing(&mut TextChanging::deletion()) {
        return Ok(false);
    }

    previous.clear();
    for (r, text) in edits.iter().rev() {
        previous.push(remove_span(ctx.source, r.start(), r.end())?);
        insert_literal(ctx.source, r.start(), text)?;
    }
    previous.reverse();

    let (first, text) = &edits[0];
    ctx.view.set_caret(advance(first.start(), text));
    Ok(true)
}

fn undo_replace(
    source: &mut TextSource,
    edits: &[(Range, String)],
    previous: &[String],
) -> EditResult<()> {
    for ((r, text), original) in edits.iter().zip(previous) {
        let start = r.start();
        remove_span(source, start, advance(start, text))?;
        insert_literal(source, start, original)?;
    }
    Ok(())
}

fn exec_remove_lines(
    ctx: &mut EditContext<'_>,
    indices: &[usize],
    removed: &mut Vec<String>,
    placeholder: &mut bool,
) -> EditResult<bool> {
    let Some(&last) = indices.last() else {
        return Ok(false);
    };
    let count = ctx.source.line_count();
    if last >= count {
        return Err(EditError::out_of_range(last, count));
    }
    if !ctx.allow_line_changes {
        return Err(StructuralViolation::LineMergeNotAllowed.into());
    }
    if !ctx.source.text_changing(&mut TextChanging::deletion()) {
        return Ok(false);
    }

    removed.clear();
    *placeholder = false;
    for &index in indices.iter().rev() {
        removed.push(ctx.source.line_text(index)?);
        ctx.source.remove_lines(index, 1)?;
    }
    if ctx.source.line_count() == 0 {
        let line = ctx.source.create_line();
        ctx.source.insert_line(0, line)?;
        *placeholder = true;
    }
    removed.reverse();

    let line = indices[0].min(ctx.source.line_count() - 1);
    ctx.view.set_caret(Place::new(line, 0));
    Ok(true)
}

fn exec_multi_range(
    ctx: &mut EditContext<'_>,
    inner: &Command,
    range: Range,
    applied: &mut Vec<Command>,
) -> EditResult<bool> {
    applied.clear();
    let allow = ctx.allow_line_changes;
    ctx.allow_line_changes = false;
    let result = replay(ctx, inner, range, applied);
    ctx.allow_line_changes = allow;

    let column = match result {
        Ok(column) => column,
        Err(err) => {
            for cmd in applied.iter_mut().rev() {
                cmd.undo(ctx)?;
            }
            applied.clear();
            ctx.view.set_selection(range);
            return Err(err);
        }
    };

    let selection = match column {
        Some(ch) => Range::column(
            Place::new(range.start().line, ch),
            Place::new(range.end().line, ch),
        ),
        None => range,
    };
    ctx.view.set_selection(selection);
    Ok(!applied.is_empty())
}

/// Run `inner` on each line of the column `range`. Returns the rightmost caret column.
fn replay(
    ctx: &mut EditContext<'_>,
    inner: &Command,
    range: Range,
    applied: &mut Vec<Command>,
) -> EditResult<Option<usize>> {
    let mut column = None;
    let text = match &inner.kind {
        CommandKind::InsertText { text } => Some(text.clone()),
        CommandKind::InsertChar { ch, .. } if *ch != BACKSPACE => Some(ch.to_string()),
        _ => None,
    };

    let Some(text) = text else {
        for sub in range.sub_ranges(ctx.source, false)? {
            ctx.view.set_selection(sub);
            replay_one(ctx, inner.clone(), applied, &mut column)?;
        }
        return Ok(column);
    };

    // Each line gets the next line of the text, cycling.
    let pieces: Vec<&str> = text.split('\n').collect();
    for (i, sub) in range.sub_ranges(ctx.source, true)?.into_iter().enumerate() {
        let line = ctx.source.line(sub.start().line)?;
        let short = sub.end() < sub.start();
        if short && line.start_spaces_count() == line.len() {
            continue;
        }
        let mut piece = pieces[i % pieces.len()].to_string();
        let mut target = sub;
        if short && !piece.is_empty() {
            piece.insert_str(0, &" ".repeat(sub.start().ch - sub.end().ch));
            target = Range::at(sub.end());
        }
        ctx.view.set_selection(target);
        if !target.is_empty() {
            replay_one(ctx, Command::clear_selected(), applied, &mut column)?;
        }
        if !piece.is_empty() {
            replay_one(ctx, Command::insert_text(piece), applied, &mut column)?;
        }
    }
    Ok(column)
}

fn replay_one(
    ctx: &mut EditContext<'_>,
    mut cmd: Command,
    applied: &mut Vec<Command>,
    column: &mut Option<usize>,
) -> EditResult<()> {
    match cmd.execute(ctx) {
        Ok(true) => {
            let ch = ctx.view.selection().end().ch;
            *column = Some(column.map_or(ch, |c| c.max(ch)));
            applied.push(cmd);
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(err) => match err.structural_violation() {
            Some(violation) => {
                debug!(%violation, line = ctx.view.caret().line, "skipped line of column edit");
                Ok(())
            }
            None => Err(err),
        },
    }
}
