#![warn(missing_docs)]
//! Codebox Core - Headless Edit Engine for Code Editor Widgets
//!
//! # Overview
//!
//! `codebox-core` is the document and edit engine underneath a syntax-highlighting code
//! editor widget. It does not render anything: the host draws lines, assigns highlighting
//! styles and maps keys to edits, and calls into this crate for everything that has to stay
//! consistent under editing.
//!
//! # Core Features
//!
//! - **Styled Line Buffer**: every character carries a style bitmask from a fixed-capacity table
//! - **Lazy File Loading**: huge files are indexed once and lines are decoded on demand
//! - **Reversible Commands**: undo/redo with grouping, bounded history and clean tracking
//! - **Column Selection**: one edit replayed on every line of a rectangular selection
//! - **Folding by Identity**: collapsed blocks are keyed by line id and survive edits above them
//! - **Regex Queries**: search, fragments and bracket matching over ranges
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document (TextSource + CommandManager)     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Commands & History                         │  ← Undo / Redo
//! ├─────────────────────────────────────────────┤
//! │  View (Selection, Folding, Viewport)        │  ← Navigation
//! ├─────────────────────────────────────────────┤
//! │  Range / Search / Markup                    │  ← Queries
//! ├─────────────────────────────────────────────┤
//! │  TextSource (Lines, Styles, Events)         │  ← Buffer
//! ├─────────────────────────────────────────────┤
//! │  LineStorage (Memory / FileLines)           │  ← Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use codebox_core::{Document, Place, Range, View};
//!
//! let mut doc = Document::from_text("fn main() {\n}");
//! let mut view = View::default();
//!
//! view.set_caret(Place::new(0, 11));
//! doc.insert_text(&mut view, "\n\tprintln!();").unwrap();
//! assert_eq!(doc.source().text(), "fn main() {\n    println!();\n}");
//!
//! // Column selection: type on two lines at once.
//! view.set_selection(Range::column(Place::new(0, 0), Place::new(1, 0)));
//! doc.insert_char(&mut view, '#').unwrap();
//! assert_eq!(doc.source().line_text(1).unwrap(), "#    println!();");
//!
//! doc.undo(&mut view).unwrap();
//! doc.undo(&mut view).unwrap();
//! assert_eq!(doc.source().text(), "fn main() {\n}");
//! ```
//!
//! # Module Description
//!
//! - [`source`] - Line buffer, style table and change notifications
//! - [`storage`] / [`file_lines`] - In-memory and lazily loaded line storage
//! - [`commands`] / [`history`] - Reversible commands and the undo history
//! - [`range`] - Selections and folding-aware navigation
//! - [`search`] / [`markup`] - Regex queries and style/marker application over ranges
//! - [`folding`] - Collapsed blocks keyed by line identity
//! - [`view`] - Per-view selection, folding and delayed notifications
//! - [`document`] - A source paired with its history

pub mod commands;
pub mod debounce;
pub mod document;
pub mod encoding;
pub mod error;
pub mod events;
pub mod file_lines;
pub mod folding;
pub mod history;
pub mod line;
pub mod line_ending;
pub mod markup;
pub mod place;
pub mod range;
pub mod search;
pub mod source;
pub mod storage;
pub mod style;
pub mod view;

pub use commands::{BACKSPACE, Command, CommandKind, EditContext};
pub use debounce::Debouncer;
pub use document::Document;
pub use encoding::TextEncoding;
pub use error::{EditError, EditResult, StructuralViolation};
pub use events::{DocumentEvent, TextChanging};
pub use file_lines::{DEFAULT_UNLOAD_MARGIN, FileLines, FileOptions, LineHook};
pub use folding::{FoldingState, VisibleState};
pub use history::{CommandManager, DEFAULT_MAX_UNDO, HistoryConfig};
pub use line::{Cell, Line, LineId};
pub use line_ending::LineEnding;
pub use place::Place;
pub use range::{Bounds, Range};
pub use search::{MAX_BRACKET_SEARCH_ITERATIONS, SearchOptions};
pub use source::TextSource;
pub use storage::{LineStorage, MemoryLines, SaveOptions};
pub use style::{MaskWidth, Style, StyleMask, StyleTable};
pub use view::{View, ViewEvent, ViewSettings, Viewport};
