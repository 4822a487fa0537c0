//! Per-view editing context.
//!
//! A [`View`] is everything an editor widget owns on top of the shared document: the
//! selection, view settings, its own folding state, the visible line range and the
//! debounced "delayed" notifications. Commands receive it explicitly through
//! [`EditContext`](crate::EditContext).

use crate::debounce::Debouncer;
use crate::error::{EditError, EditResult};
use crate::folding::{FoldingState, VisibleState};
use crate::place::Place;
use crate::range::Range;
use crate::source::TextSource;
use std::fmt;
use std::time::{Duration, Instant};

/// Settings of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    /// Tab stop width used when a tab is typed.
    pub tab_length: usize,
    /// Lines moved by page up/down.
    pub page_lines: usize,
    /// Allow more than one line.
    pub multiline: bool,
    /// Reject every edit.
    pub read_only: bool,
    /// Quiet interval of the delayed notifications.
    pub delayed_interval: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            tab_length: 4,
            page_lines: 30,
            multiline: true,
            read_only: false,
            delayed_interval: Duration::from_millis(100),
        }
    }
}

impl ViewSettings {
    /// Set the tab stop width.
    pub fn with_tab_length(mut self, tab_length: usize) -> Self {
        self.tab_length = tab_length.max(1);
        self
    }

    /// Set the page size.
    pub fn with_page_lines(mut self, page_lines: usize) -> Self {
        self.page_lines = page_lines;
        self
    }

    /// Allow or forbid line breaks.
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Make the view read-only.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Set the quiet interval of delayed notifications.
    pub fn with_delayed_interval(mut self, interval: Duration) -> Self {
        self.delayed_interval = interval;
        self
    }
}

/// Notifications raised by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// The selection changed.
    SelectionChanged,
    /// The selection stopped changing for the quiet interval.
    SelectionChangedDelayed,
    /// The text stopped changing for the quiet interval.
    TextChangedDelayed,
    /// The visible line range stopped changing for the quiet interval.
    VisibleRangeChangedDelayed,
}

/// Read-only window on a document through one view's folding state.
#[derive(Clone, Copy)]
pub struct Viewport<'a> {
    source: &'a TextSource,
    folding: &'a FoldingState,
    page_lines: usize,
}

impl<'a> Viewport<'a> {
    /// Combine a document with a folding state.
    pub fn new(source: &'a TextSource, folding: &'a FoldingState, page_lines: usize) -> Self {
        Self {
            source,
            folding,
            page_lines,
        }
    }

    /// The document.
    pub fn source(&self) -> &'a TextSource {
        self.source
    }

    /// Lines per page.
    pub fn page_lines(&self) -> usize {
        self.page_lines
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.source.line_count()
    }

    /// Length of the line at `index`.
    pub fn line_len(&self, index: usize) -> EditResult<usize> {
        self.source.line_len(index)
    }

    /// Visibility of the line at `index`.
    pub fn visible_state(&self, index: usize) -> EditResult<VisibleState> {
        self.folding.visible_state_at(self.source, index)
    }

    /// Returns `true` if the caret may rest on the line.
    pub fn is_navigable(&self, index: usize) -> EditResult<bool> {
        Ok(self.visible_state(index)? != VisibleState::Hidden)
    }

    /// Nearest navigable line below `index`, or `index` itself when there is none.
    pub fn next_visible_line(&self, index: usize) -> EditResult<usize> {
        let count = self.line_count();
        if index >= count {
            return Err(EditError::out_of_range(index, count));
        }
        for i in index + 1..count {
            if self.is_navigable(i)? {
                return Ok(i);
            }
        }
        Ok(index)
    }

    /// Nearest navigable line above `index`, or `index` itself when there is none.
    pub fn prev_visible_line(&self, index: usize) -> EditResult<usize> {
        let count = self.line_count();
        if index >= count {
            return Err(EditError::out_of_range(index, count));
        }
        for i in (0..index).rev() {
            if self.is_navigable(i)? {
                return Ok(i);
            }
        }
        Ok(index)
    }
}

/// Selection, settings and folding of one editor view.
pub struct View {
    settings: ViewSettings,
    selection: Range,
    folding: FoldingState,
    visible_lines: std::ops::Range<usize>,
    selection_update_depth: usize,
    selection_changed_pending: bool,
    selection_delayed: Debouncer,
    text_delayed: Debouncer,
    visible_delayed: Debouncer,
    subscribers: Vec<Box<dyn FnMut(&ViewEvent)>>,
}

impl View {
    /// Create a view with the caret at the document start.
    pub fn new(settings: ViewSettings) -> Self {
        let interval = settings.delayed_interval;
        Self {
            settings,
            selection: Range::default(),
            folding: FoldingState::new(),
            visible_lines: 0..0,
            selection_update_depth: 0,
            selection_changed_pending: false,
            selection_delayed: Debouncer::new(interval),
            text_delayed: Debouncer::new(interval),
            visible_delayed: Debouncer::new(interval),
            subscribers: Vec::new(),
        }
    }

    /// View settings.
    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Replace the view settings.
    pub fn set_settings(&mut self, settings: ViewSettings) {
        let interval = settings.delayed_interval;
        self.selection_delayed.set_interval(interval);
        self.text_delayed.set_interval(interval);
        self.visible_delayed.set_interval(interval);
        self.settings = settings;
    }

    /// Subscribe to view notifications.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ViewEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    fn emit(&mut self, event: ViewEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    // --- Selection ---

    /// Current selection.
    pub fn selection(&self) -> &Range {
        &self.selection
    }

    /// Caret position.
    pub fn caret(&self) -> Place {
        self.selection.start()
    }

    /// Replace the selection.
    pub fn set_selection(&mut self, selection: Range) {
        self.selection = selection;
        self.selection_changed();
    }

    /// Collapse the selection to `place`.
    pub fn set_caret(&mut self, place: Place) {
        self.set_selection(Range::at(place));
    }

    fn selection_changed(&mut self) {
        if self.selection_update_depth > 0 {
            self.selection_changed_pending = true;
            return;
        }
        self.selection_changed_pending = false;
        self.selection_delayed.trigger();
        self.emit(ViewEvent::SelectionChanged);
    }

    /// Start a selection batch. Batches nest.
    pub fn begin_selection_update(&mut self) {
        self.selection_update_depth += 1;
    }

    /// End a selection batch; the outermost end reports one change if any happened.
    pub fn end_selection_update(&mut self) {
        if self.selection_update_depth == 0 {
            return;
        }
        self.selection_update_depth -= 1;
        if self.selection_update_depth == 0 && self.selection_changed_pending {
            self.selection_changed();
        }
    }

    /// Viewport over `source` through this view's folding.
    pub fn viewport<'a>(&'a self, source: &'a TextSource) -> Viewport<'a> {
        Viewport::new(source, &self.folding, self.settings.page_lines)
    }

    /// Run a navigation operator on the selection.
    ///
    /// ```
    /// use codebox_core::{TextSource, View, ViewSettings};
    ///
    /// let source = TextSource::from_text("hello\nworld");
    /// let mut view = View::new(ViewSettings::default());
    /// view.navigate(&source, |sel, vp| sel.go_down(vp, false)).unwrap();
    /// assert_eq!(view.caret().line, 1);
    /// ```
    pub fn navigate<R>(
        &mut self,
        source: &TextSource,
        op: impl FnOnce(&mut Range, &Viewport<'_>) -> EditResult<R>,
    ) -> EditResult<R> {
        let mut selection = self.selection;
        let result = {
            let vp = self.viewport(source);
            op(&mut selection, &vp)?
        };
        if selection != self.selection || selection.preferred_column() != self.selection.preferred_column() {
            self.selection = selection;
            self.selection_changed();
        }
        Ok(result)
    }

    /// Returns `true` if an edit at the selection must be rejected.
    pub fn is_read_only(&self, source: &TextSource) -> EditResult<bool> {
        Ok(self.settings.read_only || self.selection.is_read_only(source)?)
    }

    // --- Visible range and delayed notifications ---

    /// Lines currently displayed by the host.
    pub fn visible_lines(&self) -> std::ops::Range<usize> {
        self.visible_lines.clone()
    }

    /// Record the displayed lines.
    pub fn set_visible_lines(&mut self, lines: std::ops::Range<usize>) {
        if lines != self.visible_lines {
            self.visible_lines = lines;
            self.visible_delayed.trigger();
        }
    }

    /// Record a text change for the delayed notification.
    pub fn text_changed(&mut self) {
        self.text_delayed.trigger();
    }

    /// Fire the delayed notifications whose quiet interval elapsed by `now`.
    pub fn poll_delayed(&mut self, now: Instant) -> Vec<ViewEvent> {
        let mut fired = Vec::new();
        if self.selection_delayed.poll(now) {
            fired.push(ViewEvent::SelectionChangedDelayed);
        }
        if self.text_delayed.poll(now) {
            fired.push(ViewEvent::TextChangedDelayed);
        }
        if self.visible_delayed.poll(now) {
            fired.push(ViewEvent::VisibleRangeChangedDelayed);
        }
        for &event in &fired {
            self.emit(event);
        }
        fired
    }

    // --- Folding ---

    /// This view's folding state.
    pub fn folding(&self) -> &FoldingState {
        &self.folding
    }

    /// Mutable folding state.
    pub fn folding_mut(&mut self) -> &mut FoldingState {
        &mut self.folding
    }

    /// Collapse lines `from..=to` and move the caret out of the hidden lines.
    pub fn collapse_block(&mut self, source: &TextSource, from: usize, to: usize) -> EditResult<()> {
        let Some(header) = self.folding.collapse_block(source, from, to)? else {
            return Ok(());
        };
        self.move_caret_out_of_fold(source, header, from.max(to))
    }

    /// Collapse the marker block opened at `line`.
    pub fn collapse_folding_block(&mut self, source: &TextSource, line: usize) -> EditResult<bool> {
        if source.line(line)?.folding_start_marker.is_none() {
            return Ok(false);
        }
        let end = FoldingState::find_end_of_folding_block(source, line, usize::MAX)?;
        match self.folding.collapse_block(source, line, end)? {
            Some(header) => {
                self.move_caret_out_of_fold(source, header, end)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Expand the collapsed block headed at `line`.
    pub fn expand_folded_block(&mut self, source: &TextSource, line: usize) -> EditResult<()> {
        self.folding.expand_folded_block(source, line)
    }

    /// Fold again the blocks of the collapsed set that edits unfolded.
    pub fn adjust_folding(&mut self, source: &TextSource) -> EditResult<()> {
        self.folding.adjust_folding(source)?;
        let caret = self.caret();
        if caret.line < source.line_count()
            && self.folding.visible_state_at(source, caret.line)? == VisibleState::Hidden
        {
            let vp = self.viewport(source);
            let line = vp.prev_visible_line(caret.line)?;
            self.set_caret(Place::new(line, 0));
        }
        Ok(())
    }

    fn move_caret_out_of_fold(&mut self, source: &TextSource, header: usize, to: usize) -> EditResult<()> {
        let caret = self.caret();
        if caret.line <= header || caret.line > to {
            return Ok(());
        }
        let vp = self.viewport(source);
        let next = vp.next_visible_line(to)?;
        let line = if next != to { next } else { header };
        self.set_caret(Place::new(line, 0));
        Ok(())
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(ViewSettings::default())
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("settings", &self.settings)
            .field("selection", &self.selection)
            .field("folding", &self.folding)
            .field("visible_lines", &self.visible_lines)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(view: &mut View) -> Rc<RefCell<Vec<ViewEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        view.subscribe(move |e| sink.borrow_mut().push(*e));
        events
    }

    #[test]
    fn test_navigation_skips_hidden_lines() {
        let source = TextSource::from_text("a\nhead\nx\ny\nz");
        let mut view = View::default();
        view.collapse_block(&source, 1, 3).unwrap();

        view.set_caret(Place::new(0, 0));
        view.navigate(&source, |sel, vp| sel.go_down(vp, false)).unwrap();
        assert_eq!(view.caret(), Place::new(1, 0));
        view.navigate(&source, |sel, vp| sel.go_down(vp, false)).unwrap();
        assert_eq!(view.caret(), Place::new(4, 0));
        view.navigate(&source, |sel, vp| sel.go_left(vp, false)).unwrap();
        assert_eq!(view.caret(), Place::new(1, 4));
    }

    #[test]
    fn test_collapse_moves_caret_out_of_hidden_lines() {
        let source = TextSource::from_text("head\nx\ny\nafter");
        let mut view = View::default();
        view.set_caret(Place::new(2, 1));
        view.collapse_block(&source, 0, 2).unwrap();
        assert_eq!(view.caret(), Place::new(3, 0));
    }

    #[test]
    fn test_selection_updates_coalesce() {
        let mut view = View::default();
        let events = record(&mut view);

        view.begin_selection_update();
        view.set_caret(Place::new(0, 1));
        view.set_caret(Place::new(0, 2));
        view.end_selection_update();

        assert_eq!(events.borrow().as_slice(), &[ViewEvent::SelectionChanged]);
    }

    #[test]
    fn test_delayed_notifications() {
        let mut view = View::new(ViewSettings::default().with_delayed_interval(Duration::from_millis(500)));
        view.text_changed();
        view.set_visible_lines(0..10);
        assert!(view.poll_delayed(Instant::now()).is_empty());

        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(
            view.poll_delayed(later),
            vec![ViewEvent::TextChangedDelayed, ViewEvent::VisibleRangeChangedDelayed]
        );
        assert!(view.poll_delayed(later).is_empty());
    }

    #[test]
    fn test_page_down_uses_page_lines() {
        let text = (0..10).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let source = TextSource::from_text(&text);
        let mut view = View::new(ViewSettings::default().with_page_lines(4));
        view.navigate(&source, |sel, vp| sel.go_page_down(vp, false)).unwrap();
        assert_eq!(view.caret().line, 4);
        view.navigate(&source, |sel, vp| sel.go_page_down(vp, true)).unwrap();
        assert_eq!(view.selection().start().line, 8);
        assert_eq!(view.selection().end().line, 4);
    }
}
