//! Undo/redo history.
//!
//! [`CommandManager`] executes [`Command`]s and keeps the undo and redo stacks. Commands
//! executed between [`begin_auto_undo`](CommandManager::begin_auto_undo) and the matching
//! [`end_auto_undo`](CommandManager::end_auto_undo) share a group id and are undone and
//! redone together.

use crate::commands::{Command, CommandKind, EditContext};
use crate::error::{EditError, EditResult};
use tracing::debug;

/// Default number of commands kept on the undo stack.
pub const DEFAULT_MAX_UNDO: usize = 200;

/// History limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of commands on the undo stack; the oldest groups are dropped first.
    pub max_undo: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

impl HistoryConfig {
    /// Set the undo depth.
    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo.max(1);
        self
    }
}

#[derive(Debug, Clone)]
struct UndoStep {
    group_id: usize,
    command: Command,
}

/// Executes commands and records them for undo.
#[derive(Debug)]
pub struct CommandManager {
    config: HistoryConfig,
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    /// Clean point tracking. Uses `undo_stack.len()` as the saved position in the linear history.
    /// When `redo_stack` is non-empty, `clean_index` may be greater than `undo_stack.len()`.
    clean_index: Option<usize>,
    next_group_id: usize,
    auto_undo_depth: usize,
    open_group_id: Option<usize>,
}

impl CommandManager {
    /// Create an empty history.
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            clean_index: Some(0),
            next_group_id: 0,
            auto_undo_depth: 0,
            open_group_id: None,
        }
    }

    /// History limits.
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Execute `command` and record it.
    ///
    /// Returns `Ok(false)` without touching the document when the view is read-only or the
    /// edit would touch read-only text, and when the command itself changed nothing. While
    /// the selection is in column mode, edits at the selection are replayed per line through
    /// [`Command::multi_range`]. Failed and unapplied commands are not recorded.
    pub fn execute(&mut self, ctx: &mut EditContext<'_>, mut command: Command) -> EditResult<bool> {
        let edits_text = !matches!(command.kind(), CommandKind::Select);
        let read_only = edits_text
            && (ctx.view.settings().read_only
                || command.touches_read_only(ctx.source, ctx.view.selection())?);
        if read_only {
            debug!(command = command.kind().name(), "rejected edit of read-only text");
            return Ok(false);
        }
        if command.follows_selection() && ctx.view.selection().is_column_mode() {
            command = Command::multi_range(command);
        }
        if !command.execute(ctx)? {
            return Ok(false);
        }
        self.push(command);
        Ok(true)
    }

    /// Undo the most recent group. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>) -> EditResult<bool> {
        self.open_group_id = None;
        let Some(mut steps) = self.pop_undo_group() else {
            return Ok(false);
        };

        let mut done = 0;
        let mut failure: Option<EditError> = None;
        for step in steps.iter_mut() {
            if let Err(err) = step.command.undo(ctx) {
                failure = Some(err);
                break;
            }
            done += 1;
        }
        let pending = steps.split_off(done);
        self.undo_stack.extend(pending.into_iter().rev());
        // Newest first, so the oldest command of the group is popped first on redo.
        self.redo_stack.extend(steps);
        debug!(commands = done, "undo");

        match failure {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    /// Redo the most recently undone group. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self, ctx: &mut EditContext<'_>) -> EditResult<bool> {
        self.open_group_id = None;
        let Some(steps) = self.pop_redo_group() else {
            return Ok(false);
        };

        let mut redone = Vec::with_capacity(steps.len());
        let mut failure: Option<EditError> = None;
        let mut steps = steps.into_iter();
        for mut step in steps.by_ref() {
            ctx.view.set_selection(step.command.sel());
            match step.command.execute(ctx) {
                Ok(true) => redone.push(step),
                Ok(false) => debug!(command = step.command.kind().name(), "redo changed nothing"),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        let pending: Vec<UndoStep> = steps.collect();
        self.redo_stack.extend(pending.into_iter().rev());
        debug!(commands = redone.len(), "redo");
        self.undo_stack.extend(redone);

        match failure {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    /// Start grouping executed commands into one undo step. Calls nest.
    pub fn begin_auto_undo(&mut self) {
        if self.auto_undo_depth == 0 {
            self.open_group_id = None;
        }
        self.auto_undo_depth += 1;
    }

    /// End a group started by [`begin_auto_undo`](Self::begin_auto_undo).
    pub fn end_auto_undo(&mut self) {
        if self.auto_undo_depth == 0 {
            return;
        }
        self.auto_undo_depth -= 1;
        if self.auto_undo_depth == 0 {
            self.open_group_id = None;
        }
    }

    /// Current auto-undo nesting depth.
    pub fn auto_undo_depth(&self) -> usize {
        self.auto_undo_depth
    }

    /// Forget every recorded command.
    pub fn clear_history(&mut self) {
        self.clean_index = self.is_clean().then_some(0);
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group_id = None;
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of commands on the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of commands on the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns `true` if the history is at the last saved point.
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Mark the current history position as saved.
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
        self.open_group_id = None;
    }

    fn push(&mut self, command: Command) {
        self.clear_redo_and_adjust_clean();

        let group_id = if self.auto_undo_depth > 0 {
            match self.open_group_id {
                Some(id) => id,
                None => {
                    let id = self.allocate_group_id();
                    self.open_group_id = Some(id);
                    id
                }
            }
        } else {
            self.allocate_group_id()
        };
        self.undo_stack.push(UndoStep { group_id, command });
        self.trim();
    }

    fn allocate_group_id(&mut self) -> usize {
        let id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        id
    }

    /// Drop the oldest groups while the stack is over its limit, keeping the open group.
    fn trim(&mut self) {
        while self.undo_stack.len() > self.config.max_undo {
            let oldest = self.undo_stack[0].group_id;
            if Some(oldest) == self.open_group_id {
                break;
            }
            let count = self
                .undo_stack
                .iter()
                .take_while(|step| step.group_id == oldest)
                .count();
            self.undo_stack.drain(..count);
            self.clean_index = match self.clean_index {
                Some(clean_index) if clean_index >= count => Some(clean_index - count),
                _ => None,
            };
        }
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }

        // If clean point is in redo area, it becomes unreachable after clearing redo.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }

        self.redo_stack.clear();
    }

    fn pop_undo_group(&mut self) -> Option<Vec<UndoStep>> {
        Self::pop_group(&mut self.undo_stack)
    }

    fn pop_redo_group(&mut self) -> Option<Vec<UndoStep>> {
        Self::pop_group(&mut self.redo_stack)
    }

    fn pop_group(stack: &mut Vec<UndoStep>) -> Option<Vec<UndoStep>> {
        let last_group_id = stack.last().map(|s| s.group_id)?;
        let mut steps: Vec<UndoStep> = Vec::new();

        while let Some(step) = stack.pop_if(|s| s.group_id == last_group_id) {
            steps.push(step);
        }

        Some(steps)
    }
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}
