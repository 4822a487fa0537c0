//! A text source together with its undo history.

use crate::commands::{BACKSPACE, Command, EditContext};
use crate::error::EditResult;
use crate::file_lines::FileOptions;
use crate::folding::VisibleState;
use crate::history::{CommandManager, HistoryConfig};
use crate::range::Range;
use crate::source::TextSource;
use crate::view::View;
use std::path::Path;
use tracing::{debug, warn};

/// A [`TextSource`] paired with exactly one [`CommandManager`].
///
/// Views are not owned by the document: every edit takes the [`View`] whose selection it
/// follows, so several views can share one document.
///
/// ```rust
/// use codebox_core::{Document, View};
///
/// let mut doc = Document::from_text("fn main() {}");
/// let mut view = View::default();
/// doc.insert_text(&mut view, "// entry\n").unwrap();
/// assert_eq!(doc.source().text(), "// entry\nfn main() {}");
///
/// doc.undo(&mut view).unwrap();
/// assert_eq!(doc.source().text(), "fn main() {}");
/// ```
#[derive(Debug, Default)]
pub struct Document {
    source: TextSource,
    commands: CommandManager,
}

impl Document {
    /// Empty in-memory document.
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory document holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_source(TextSource::from_text(text))
    }

    /// Wrap an existing source with a fresh history.
    pub fn from_source(source: TextSource) -> Self {
        Self {
            source,
            commands: CommandManager::default(),
        }
    }

    /// Open a file-backed document.
    pub fn open_file(path: impl AsRef<Path>, options: &FileOptions) -> EditResult<Self> {
        let path = path.as_ref();
        let source = TextSource::open_file(path, options)?;
        debug!(path = %path.display(), lines = source.line_count(), "opened document");
        Ok(Self::from_source(source))
    }

    /// Open a file-backed document, falling back to an empty document if opening fails.
    pub fn open_or_empty(path: impl AsRef<Path>, options: &FileOptions) -> Self {
        let path = path.as_ref();
        match Self::open_file(path, options) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to open document, starting empty");
                Self::new()
            }
        }
    }

    /// Replace the history limits. Recorded history is dropped.
    pub fn with_history(mut self, config: HistoryConfig) -> Self {
        self.commands = CommandManager::new(config);
        self
    }

    /// The text source.
    pub fn source(&self) -> &TextSource {
        &self.source
    }

    /// Mutable text source. Edits made here bypass the history.
    pub fn source_mut(&mut self) -> &mut TextSource {
        &mut self.source
    }

    /// The undo history.
    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    fn run<R>(
        &mut self,
        view: &mut View,
        op: impl FnOnce(&mut CommandManager, &mut EditContext<'_>) -> EditResult<R>,
    ) -> EditResult<R> {
        self.source.begin_update();
        view.begin_selection_update();
        let result = {
            let mut ctx = EditContext::new(&mut self.source, view);
            op(&mut self.commands, &mut ctx)
        };
        let result = result.and_then(|r| {
            view.adjust_folding(&self.source)?;
            Ok(r)
        });
        view.end_selection_update();
        self.source.end_update();
        result
    }

    /// Execute `command` against `view`'s selection and record it.
    ///
    /// An edit at a folded line unfolds it first; blocks remembered as collapsed are folded
    /// again afterwards.
    pub fn execute(&mut self, view: &mut View, command: Command) -> EditResult<bool> {
        let caret = view.caret().line;
        if caret < self.source.line_count()
            && view.folding().visible_state_at(&self.source, caret)? != VisibleState::Visible
        {
            view.folding_mut().expand_block(&self.source, caret)?;
        }
        let applied = self.run(view, |commands, ctx| commands.execute(ctx, command))?;
        if applied {
            view.text_changed();
        }
        Ok(applied)
    }

    /// Undo the last group of commands.
    pub fn undo(&mut self, view: &mut View) -> EditResult<bool> {
        let undone = self.run(view, |commands, ctx| commands.undo(ctx))?;
        if undone {
            view.text_changed();
        }
        Ok(undone)
    }

    /// Redo the last undone group of commands.
    pub fn redo(&mut self, view: &mut View) -> EditResult<bool> {
        let redone = self.run(view, |commands, ctx| commands.redo(ctx))?;
        if redone {
            view.text_changed();
        }
        Ok(redone)
    }

    /// Start an undo group, see [`CommandManager::begin_auto_undo`].
    ///
    /// The group is also one notification batch of the source.
    pub fn begin_auto_undo(&mut self) {
        self.commands.begin_auto_undo();
        self.source.begin_update();
    }

    /// End an undo group.
    pub fn end_auto_undo(&mut self) {
        if self.commands.auto_undo_depth() == 0 {
            return;
        }
        self.commands.end_auto_undo();
        self.source.end_update();
    }

    /// Forget the undo history.
    pub fn clear_history(&mut self) {
        self.commands.clear_history();
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    /// Number of commands on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.commands.undo_depth()
    }

    /// Number of commands on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.commands.redo_depth()
    }

    /// Returns `true` if nothing changed since the last save.
    pub fn is_clean(&self) -> bool {
        self.commands.is_clean()
    }

    /// Mark the current state as saved.
    pub fn mark_clean(&mut self) {
        self.commands.mark_clean();
    }

    /// Write the document to `path` and mark it clean.
    pub fn save(&mut self, path: impl AsRef<Path>) -> EditResult<()> {
        self.source.save(path)?;
        self.commands.mark_clean();
        Ok(())
    }

    // --- Typing helpers ---

    fn replacing_selection(
        &mut self,
        view: &mut View,
        command: Command,
    ) -> EditResult<bool> {
        let selection = *view.selection();
        if selection.is_empty() || selection.is_column_mode() {
            return self.execute(view, command);
        }
        self.begin_auto_undo();
        let result = self
            .execute(view, Command::clear_selected())
            .and_then(|cleared| Ok(self.execute(view, command)? || cleared));
        self.end_auto_undo();
        result
    }

    /// Type `text` at the caret, replacing the selection.
    pub fn insert_text(&mut self, view: &mut View, text: &str) -> EditResult<bool> {
        self.replacing_selection(view, Command::insert_text(text))
    }

    /// Type one character at the caret, replacing the selection.
    pub fn insert_char(&mut self, view: &mut View, ch: char) -> EditResult<bool> {
        self.replacing_selection(view, Command::insert_char(ch))
    }

    /// Delete the selection, or the character left of the caret when nothing is selected.
    pub fn backspace(&mut self, view: &mut View) -> EditResult<bool> {
        if view.selection().is_empty() {
            self.execute(view, Command::insert_char(BACKSPACE))
        } else {
            self.delete_selection(view)
        }
    }

    /// Delete the selected text.
    pub fn delete_selection(&mut self, view: &mut View) -> EditResult<bool> {
        self.execute(view, Command::clear_selected())
    }

    /// Replace every range with `text` as one undoable step.
    pub fn replace_ranges(&mut self, view: &mut View, ranges: Vec<Range>, text: &str) -> EditResult<bool> {
        self.execute(view, Command::replace_text(ranges, text))
    }

    /// Remove whole lines as one undoable step.
    pub fn remove_lines(&mut self, view: &mut View, indices: &[usize]) -> EditResult<bool> {
        self.execute(view, Command::remove_lines(indices.iter().copied()))
    }

    /// Record the current selection, then select `range`. Undo restores the old selection.
    pub fn select(&mut self, view: &mut View, range: Range) -> EditResult<()> {
        self.execute(view, Command::select())?;
        view.set_selection(range);
        Ok(())
    }
}
