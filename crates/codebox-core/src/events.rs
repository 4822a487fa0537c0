//! Change notifications raised by a [`TextSource`](crate::TextSource).
//!
//! Subscribers are plain callbacks, invoked synchronously on the thread that mutates the
//! document.

use crate::line::LineId;

/// Notification raised after the document changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// `count` lines were inserted starting at `index`.
    LineInserted {
        /// Index of the first inserted line.
        index: usize,
        /// Number of inserted lines.
        count: usize,
    },
    /// `count` lines were removed starting at `index`.
    LineRemoved {
        /// Index of the first removed line.
        index: usize,
        /// Number of removed lines.
        count: usize,
        /// Ids of the removed lines, in document order.
        removed_ids: Vec<LineId>,
    },
    /// Text changed in the inclusive line span.
    TextChanged {
        /// First affected line.
        from_line: usize,
        /// Last affected line.
        to_line: usize,
    },
    /// Cached per-line data (layout, highlighting) must be recomputed for the span.
    RecalcNeeded {
        /// First affected line.
        from_line: usize,
        /// Last affected line.
        to_line: usize,
    },
    /// Word-wrap data must be recomputed for the span, after an edit changed its text.
    RecalcWordWrap {
        /// First affected line.
        from_line: usize,
        /// Last affected line.
        to_line: usize,
    },
}

/// Subscriber callback type.
pub type DocumentEventCallback = Box<dyn FnMut(&DocumentEvent)>;

/// Callback run before an edit, see [`TextChanging`].
pub type TextChangingCallback = Box<dyn FnMut(&mut TextChanging)>;

/// Pre-edit notification payload.
///
/// Listeners may rewrite the text about to be inserted, or veto the edit either by calling
/// [`cancel`](Self::cancel) or by clearing a non-empty insertion. A vetoed edit is a no-op,
/// not an error.
#[derive(Debug, Clone)]
pub struct TextChanging {
    text: String,
    was_insertion: bool,
    cancelled: bool,
}

impl TextChanging {
    /// Payload for an insertion of `text`.
    pub fn insertion(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            was_insertion: !text.is_empty(),
            text,
            cancelled: false,
        }
    }

    /// Payload for an edit that inserts nothing (deletions, line removal).
    pub fn deletion() -> Self {
        Self::insertion(String::new())
    }

    /// The text about to be inserted.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Mutable access to the text about to be inserted.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    /// Veto the edit.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns `true` if a listener vetoed the edit.
    pub fn is_vetoed(&self) -> bool {
        self.cancelled || (self.was_insertion && self.text.is_empty())
    }

    /// Consume the payload, returning the (possibly rewritten) text.
    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearing_an_insertion_vetoes_it() {
        let mut args = TextChanging::insertion("abc");
        assert!(!args.is_vetoed());
        args.text_mut().clear();
        assert!(args.is_vetoed());
    }

    #[test]
    fn test_deletion_only_vetoed_by_cancel() {
        let mut args = TextChanging::deletion();
        assert!(!args.is_vetoed());
        args.cancel();
        assert!(args.is_vetoed());
    }
}
