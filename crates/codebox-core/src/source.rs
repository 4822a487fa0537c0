//! The document buffer: an ordered list of styled lines plus the style table.
//!
//! [`TextSource`] owns the lines (through a [`LineStorage`] backend), hands out line ids,
//! and raises [`DocumentEvent`]s. Text-change notifications can be batched with
//! [`begin_update`](TextSource::begin_update)/[`end_update`](TextSource::end_update): inside a
//! batch, changed spans are merged and delivered once when the outermost batch ends.

use crate::encoding::TextEncoding;
use crate::error::{EditError, EditResult};
use crate::events::{DocumentEvent, DocumentEventCallback, TextChanging, TextChangingCallback};
use crate::file_lines::{FileLines, FileOptions};
use crate::line::{Line, LineId, LineIdGenerator};
use crate::line_ending::{self, LineEnding};
use crate::place::Place;
use crate::search::FlatText;
use crate::storage::{LineStorage, MemoryLines, SaveOptions};
use crate::style::{MaskWidth, Style, StyleTable};
use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    from: usize,
    to: usize,
}

impl LineSpan {
    fn new(from: usize, to: usize) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
        }
    }

    fn union(self, other: Self) -> Self {
        Self {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }
}

type FlatKey = (Place, Place, u64);

/// Ordered collection of styled lines.
///
/// There is always at least one line. Use [`TextSource::new`] for an empty in-memory
/// buffer, [`TextSource::from_text`] to load a string, or [`TextSource::open_file`] for a
/// lazily loaded file.
pub struct TextSource {
    storage: Box<dyn LineStorage>,
    styles: StyleTable,
    ids: LineIdGenerator,
    text_version: u64,
    save_options: SaveOptions,
    text_line_ending: LineEnding,
    subscribers: Vec<DocumentEventCallback>,
    changing_hooks: Vec<TextChangingCallback>,
    update_depth: usize,
    pending_changed: Option<LineSpan>,
    pending_recalc: Option<LineSpan>,
    pending_wrap: Option<LineSpan>,
    flat_cache: RefCell<Option<(FlatKey, Rc<FlatText>)>>,
}

impl TextSource {
    /// Create an in-memory buffer holding one empty line.
    pub fn new() -> Self {
        Self::with_mask_width(MaskWidth::default())
    }

    /// Create an in-memory buffer whose style table has the given width.
    pub fn with_mask_width(width: MaskWidth) -> Self {
        let mut ids = LineIdGenerator::new();
        let first = Line::new(ids.next_id());
        Self::from_parts(
            Box::new(MemoryLines::from_lines(vec![first])),
            ids,
            StyleTable::new(width),
            SaveOptions::default(),
        )
    }

    /// Create an in-memory buffer from text. Any line ending is accepted.
    pub fn from_text(text: &str) -> Self {
        let mut ids = LineIdGenerator::new();
        let line_ending = LineEnding::detect_in_text(text).unwrap_or_default();
        let lines = line_ending::normalize(text)
            .split('\n')
            .map(|t| Line::from_text(ids.next_id(), t))
            .collect();
        Self::from_parts(
            Box::new(MemoryLines::from_lines(lines)),
            ids,
            StyleTable::default(),
            SaveOptions {
                line_ending,
                ..SaveOptions::default()
            },
        )
    }

    /// Open a file with lazy line loading.
    ///
    /// The encoding comes from the byte-order mark, or `options.default_encoding` when there
    /// is none. The first line ending found is remembered for saving; files without a line
    /// break get the platform default.
    pub fn open_file(path: impl AsRef<Path>, options: &FileOptions) -> EditResult<Self> {
        let mut ids = LineIdGenerator::new();
        let lines = FileLines::open(path, &mut ids, options)?;
        let save_options = SaveOptions {
            encoding: lines.encoding(),
            write_bom: lines.has_bom(),
            line_ending: lines.detected_line_ending().unwrap_or_default(),
        };
        Ok(Self::from_parts(
            Box::new(lines),
            ids,
            StyleTable::default(),
            save_options,
        ))
    }

    fn from_parts(
        storage: Box<dyn LineStorage>,
        ids: LineIdGenerator,
        styles: StyleTable,
        save_options: SaveOptions,
    ) -> Self {
        Self {
            storage,
            styles,
            ids,
            text_version: 0,
            save_options,
            text_line_ending: LineEnding::Crlf,
            subscribers: Vec::new(),
            changing_hooks: Vec::new(),
            update_depth: 0,
            pending_changed: None,
            pending_recalc: None,
            pending_wrap: None,
            flat_cache: RefCell::new(None),
        }
    }

    // --- Lines ---

    /// Number of lines (always at least one after construction).
    pub fn line_count(&self) -> usize {
        self.storage.len()
    }

    fn check_line(&self, index: usize) -> EditResult<()> {
        let len = self.storage.len();
        if index < len {
            Ok(())
        } else {
            Err(EditError::out_of_range(index, len))
        }
    }

    /// The line at `index`.
    pub fn line(&self, index: usize) -> EditResult<&Line> {
        self.check_line(index)?;
        Ok(self.storage.get(index))
    }

    /// Mutable line at `index`.
    ///
    /// Callers that change text are expected to report it with [`text_changed`](Self::text_changed).
    pub fn line_mut(&mut self, index: usize) -> EditResult<&mut Line> {
        self.check_line(index)?;
        self.invalidate_flat_cache();
        Ok(self.storage.get_mut(index))
    }

    /// Id of the line at `index`, without loading it.
    pub fn line_id(&self, index: usize) -> EditResult<LineId> {
        self.check_line(index)?;
        Ok(self.storage.line_id(index))
    }

    /// Index of the line with `id`, scanning from the top.
    pub fn find_line(&self, id: LineId) -> Option<usize> {
        (0..self.storage.len()).find(|&i| self.storage.line_id(i) == id)
    }

    /// Number of characters of the line at `index`.
    pub fn line_len(&self, index: usize) -> EditResult<usize> {
        Ok(self.line(index)?.len())
    }

    /// Text of the line at `index`.
    pub fn line_text(&self, index: usize) -> EditResult<String> {
        Ok(self.line(index)?.text())
    }

    /// Character at `place`, `None` past the end of the line.
    pub fn char_at(&self, place: Place) -> EditResult<Option<char>> {
        Ok(self.line(place.line)?.char_at(place.ch))
    }

    /// Create a detached empty line with a fresh id.
    pub fn create_line(&mut self) -> Line {
        Line::new(self.ids.next_id())
    }

    /// Insert `line` before `index` (`index == line_count()` appends).
    pub fn insert_line(&mut self, index: usize, line: Line) -> EditResult<()> {
        self.insert_lines(index, vec![line])
    }

    /// Insert several lines before `index`.
    pub fn insert_lines(&mut self, index: usize, lines: Vec<Line>) -> EditResult<()> {
        let len = self.storage.len();
        if index > len {
            return Err(EditError::out_of_range(index, len));
        }
        let count = lines.len();
        if count == 0 {
            return Ok(());
        }
        self.invalidate_flat_cache();
        for (offset, line) in lines.into_iter().enumerate() {
            self.storage.insert(index + offset, line);
        }
        self.emit(DocumentEvent::LineInserted { index, count });
        Ok(())
    }

    /// Remove `count` lines starting at `index`.
    pub fn remove_lines(&mut self, index: usize, count: usize) -> EditResult<()> {
        let len = self.storage.len();
        if count == 0 {
            return Ok(());
        }
        if index >= len || count > len - index {
            return Err(EditError::out_of_range(index + count - 1, len));
        }
        // Ids are only collected when someone listens.
        let removed_ids = if self.subscribers.is_empty() {
            Vec::new()
        } else {
            (index..index + count)
                .map(|i| self.storage.line_id(i))
                .collect()
        };
        self.invalidate_flat_cache();
        self.storage.remove(index, count);
        self.emit(DocumentEvent::LineRemoved {
            index,
            count,
            removed_ids,
        });
        Ok(())
    }

    /// Text of every line joined with `'\n'`.
    pub fn text(&self) -> String {
        self.lines_text(0..self.storage.len())
    }

    /// Text of the given lines joined with `'\n'`; out-of-range indices are clipped.
    pub fn lines_text(&self, lines: Range<usize>) -> String {
        let end = lines.end.min(self.storage.len());
        let start = lines.start.min(end);
        let mut out = String::new();
        for i in start..end {
            if i > start {
                out.push('\n');
            }
            out.extend(self.storage.get(i).cells().iter().map(|c| c.ch));
        }
        out
    }

    /// Returns `true` if the line is materialized in memory.
    pub fn is_line_loaded(&self, index: usize) -> bool {
        index < self.storage.len() && self.storage.is_loaded(index)
    }

    /// Drop the in-memory copy of an unchanged file-backed line.
    pub fn unload_line(&mut self, index: usize) -> bool {
        index < self.storage.len() && self.storage.unload(index)
    }

    /// Drop unchanged file-backed lines far from the visible range.
    pub fn unload_far_lines(&mut self, visible: Range<usize>) -> usize {
        self.storage.unload_far_lines(visible)
    }

    /// Record that the line at `index` was displayed or touched now.
    pub fn visit_line(&mut self, index: usize) -> EditResult<()> {
        self.check_line(index)?;
        self.storage.get_mut(index).last_visit = Some(Instant::now());
        Ok(())
    }

    /// The file-backed storage, if the document was opened from a file.
    pub fn file_lines(&self) -> Option<&FileLines> {
        self.storage.as_file_lines()
    }

    /// Mutable file-backed storage, e.g. to install load/save hooks.
    pub fn file_lines_mut(&mut self) -> Option<&mut FileLines> {
        self.storage.as_file_lines_mut()
    }

    /// Line break inserted between lines by [`Range::text`](crate::Range::text).
    ///
    /// Defaults to CRLF. Searching and the command system always work on `'\n'`.
    pub fn text_line_ending(&self) -> LineEnding {
        self.text_line_ending
    }

    /// Change the line break used by [`Range::text`](crate::Range::text).
    pub fn set_text_line_ending(&mut self, line_ending: LineEnding) {
        self.text_line_ending = line_ending;
    }

    // --- Saving ---

    /// Options used by [`save`](Self::save).
    pub fn save_options(&self) -> &SaveOptions {
        &self.save_options
    }

    /// Line ending written on save.
    pub fn save_line_ending(&self) -> LineEnding {
        self.save_options.line_ending
    }

    /// Change the line ending written on save.
    pub fn set_save_line_ending(&mut self, line_ending: LineEnding) {
        self.save_options.line_ending = line_ending;
    }

    /// Change the encoding (and byte-order mark policy) written on save.
    pub fn set_save_encoding(&mut self, encoding: TextEncoding, write_bom: bool) {
        self.save_options.encoding = encoding;
        self.save_options.write_bom = write_bom;
    }

    /// Write the document to `path`.
    ///
    /// A file-backed document is rebound to the written file afterwards.
    pub fn save(&mut self, path: impl AsRef<Path>) -> EditResult<()> {
        let path = path.as_ref();
        let options = self.save_options;
        self.storage.save(path, &options)?;
        debug!(path = %path.display(), lines = self.storage.len(), "document saved");
        Ok(())
    }

    // --- Styles ---

    /// The style table.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Mutable style table.
    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Register a style, returning its slot.
    pub fn add_style(&mut self, style: Arc<Style>) -> EditResult<usize> {
        self.styles.add_style(style)
    }

    // --- Notifications ---

    /// Monotonic counter bumped once per committed text change.
    ///
    /// A batch, and therefore a whole command or undo group, counts as one change.
    pub fn text_version(&self) -> u64 {
        self.text_version
    }

    /// Subscribe to document events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&DocumentEvent) + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Install a pre-edit hook, see [`TextChanging`].
    pub fn on_text_changing<F>(&mut self, callback: F)
    where
        F: FnMut(&mut TextChanging) + 'static,
    {
        self.changing_hooks.push(Box::new(callback));
    }

    /// Run the pre-edit hooks. Returns `false` if a hook vetoed the edit.
    pub fn text_changing(&mut self, args: &mut TextChanging) -> bool {
        for hook in &mut self.changing_hooks {
            hook(args);
        }
        !args.is_vetoed()
    }

    /// Report a text change in the inclusive span.
    ///
    /// Inside a batch the span is merged into the pending change, and the text version is
    /// bumped once when the outermost batch ends.
    pub fn text_changed(&mut self, from_line: usize, to_line: usize) {
        let span = LineSpan::new(from_line, to_line);
        if self.update_depth > 0 {
            self.pending_changed = Some(match self.pending_changed {
                Some(pending) => pending.union(span),
                None => span,
            });
            return;
        }
        self.text_version += 1;
        self.emit(DocumentEvent::TextChanged {
            from_line: span.from,
            to_line: span.to,
        });
    }

    /// Report that per-line caches must be recomputed for the inclusive span.
    pub fn need_recalc(&mut self, from_line: usize, to_line: usize) {
        let span = LineSpan::new(from_line, to_line);
        if self.update_depth > 0 {
            self.pending_recalc = Some(match self.pending_recalc {
                Some(pending) => pending.union(span),
                None => span,
            });
            return;
        }
        self.emit(DocumentEvent::RecalcNeeded {
            from_line: span.from,
            to_line: span.to,
        });
    }

    /// Report that word wrap must be recomputed for the inclusive span.
    pub fn recalc_word_wrap(&mut self, from_line: usize, to_line: usize) {
        let span = LineSpan::new(from_line, to_line);
        if self.update_depth > 0 {
            self.pending_wrap = Some(match self.pending_wrap {
                Some(pending) => pending.union(span),
                None => span,
            });
            return;
        }
        self.emit(DocumentEvent::RecalcWordWrap {
            from_line: span.from,
            to_line: span.to,
        });
    }

    /// Start a notification batch. Batches nest.
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// End a notification batch, flushing merged notifications when the outermost ends.
    pub fn end_update(&mut self) {
        if self.update_depth == 0 {
            return;
        }
        self.update_depth -= 1;
        if self.update_depth > 0 {
            return;
        }
        if let Some(span) = self.pending_recalc.take() {
            self.emit(DocumentEvent::RecalcNeeded {
                from_line: span.from,
                to_line: span.to,
            });
        }
        if let Some(span) = self.pending_wrap.take() {
            self.emit(DocumentEvent::RecalcWordWrap {
                from_line: span.from,
                to_line: span.to,
            });
        }
        if let Some(span) = self.pending_changed.take() {
            self.text_version += 1;
            self.emit(DocumentEvent::TextChanged {
                from_line: span.from,
                to_line: span.to,
            });
        }
    }

    /// Returns `true` inside a notification batch.
    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    fn emit(&mut self, event: DocumentEvent) {
        trace!(?event, "document event");
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
    }

    // --- Flattened text memo ---

    pub(crate) fn cached_flat(&self, from: Place, to: Place) -> Option<Rc<FlatText>> {
        let cache = self.flat_cache.borrow();
        match cache.as_ref() {
            Some((key, flat)) if *key == (from, to, self.text_version) => Some(Rc::clone(flat)),
            _ => None,
        }
    }

    pub(crate) fn store_flat(&self, from: Place, to: Place, flat: Rc<FlatText>) {
        *self.flat_cache.borrow_mut() = Some(((from, to, self.text_version), flat));
    }

    fn invalidate_flat_cache(&mut self) {
        self.flat_cache.get_mut().take();
    }
}

impl Default for TextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSource")
            .field("lines", &self.storage.len())
            .field("text_version", &self.text_version)
            .field("save_options", &self.save_options)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(source: &mut TextSource) -> Rc<RefCell<Vec<DocumentEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        source.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn test_new_source_has_one_empty_line() {
        let source = TextSource::new();
        assert_eq!(source.line_count(), 1);
        assert_eq!(source.text(), "");
    }

    #[test]
    fn test_from_text_normalizes_and_remembers_line_ending() {
        let source = TextSource::from_text("a\r\nb\r\nc");
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.text(), "a\nb\nc");
        assert_eq!(source.save_line_ending(), LineEnding::Crlf);
    }

    #[test]
    fn test_line_out_of_range() {
        let source = TextSource::from_text("a");
        assert!(matches!(
            source.line(3),
            Err(EditError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_remove_reports_ids_to_subscribers() {
        let mut source = TextSource::from_text("a\nb\nc");
        let ids = [source.line_id(1).unwrap(), source.line_id(2).unwrap()];
        let events = record(&mut source);

        source.remove_lines(1, 2).unwrap();

        assert_eq!(
            events.borrow().as_slice(),
            &[DocumentEvent::LineRemoved {
                index: 1,
                count: 2,
                removed_ids: ids.to_vec(),
            }]
        );
    }

    #[test]
    fn test_insert_line_and_ids_are_unique() {
        let mut source = TextSource::from_text("a\nb");
        let line = source.create_line();
        let id = line.id();
        source.insert_line(2, line).unwrap();
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.find_line(id), Some(2));
        assert_ne!(source.line_id(0).unwrap(), id);
        assert!(source.insert_line(9, Line::new(LineId(77))).is_err());
    }

    #[test]
    fn test_updates_coalesce_text_changed() {
        let mut source = TextSource::from_text("a\nb\nc\nd");
        let events = record(&mut source);

        source.begin_update();
        source.begin_update();
        source.text_changed(2, 2);
        source.end_update();
        source.text_changed(0, 1);
        assert!(events.borrow().is_empty());
        source.end_update();

        assert_eq!(
            events.borrow().as_slice(),
            &[DocumentEvent::TextChanged {
                from_line: 0,
                to_line: 2
            }]
        );
        assert_eq!(source.text_version(), 1);

        source.text_changed(3, 3);
        assert_eq!(source.text_version(), 2);
    }

    #[test]
    fn test_text_changing_hooks_can_rewrite() {
        let mut source = TextSource::new();
        source.on_text_changing(|args| {
            if args.text() == "bad" {
                args.cancel();
            } else {
                args.text_mut().make_ascii_uppercase();
            }
        });

        let mut ok = TextChanging::insertion("abc");
        assert!(source.text_changing(&mut ok));
        assert_eq!(ok.text(), "ABC");

        let mut bad = TextChanging::insertion("bad");
        assert!(!source.text_changing(&mut bad));
    }

    #[test]
    fn test_lines_text_clips() {
        let source = TextSource::from_text("a\nb\nc");
        assert_eq!(source.lines_text(1..10), "b\nc");
        assert_eq!(source.lines_text(5..10), "");
    }
}
