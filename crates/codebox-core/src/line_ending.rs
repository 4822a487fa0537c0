//! Line ending helpers.
//!
//! `codebox-core` stores text as separate lines and flattens it with LF (`'\n'`). Every
//! string entering the command system goes through [`normalize`] first, so commands only
//! ever see `'\n'`. The detected line ending is remembered for saving, and
//! [`Range::text`](crate::Range::text) joins lines with a configurable one.

/// A newline sequence, used when saving and when reading a range's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Classic Mac CR (`'\r'`).
    Cr,
}

impl LineEnding {
    /// The line ending of the platform the crate was built for.
    pub const fn platform_default() -> Self {
        if cfg!(windows) { Self::Crlf } else { Self::Lf }
    }

    /// The newline sequence.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the line ending used by a source text.
    ///
    /// Policy: any CRLF wins, then any bare LF, then a bare CR. Text without line breaks
    /// yields `None`.
    pub fn detect_in_text(text: &str) -> Option<Self> {
        if text.contains("\r\n") {
            Some(Self::Crlf)
        } else if text.contains('\n') {
            Some(Self::Lf)
        } else if text.contains('\r') {
            Some(Self::Cr)
        } else {
            None
        }
    }

    /// Convert an LF-normalized text to this line ending.
    pub fn apply_to_text(self, text: &str) -> String {
        match self {
            Self::Lf => text.to_string(),
            _ => text.replace('\n', self.as_str()),
        }
    }
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Convert `"\r\n"` and bare `'\r'` to `'\n'`.
pub fn normalize(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
