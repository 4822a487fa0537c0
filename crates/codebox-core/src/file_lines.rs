//! File-backed, lazily loaded line storage.
//!
//! Opening a file only scans it for line starts: the storage keeps one byte offset per line
//! and reads the line's text the first time it is accessed. Unchanged lines can be dropped
//! again to bound memory on very large files. Saving streams every line to a temporary file
//! next to the target and renames it into place.

use crate::encoding::TextEncoding;
use crate::error::EditResult;
use crate::line::{Line, LineId, LineIdGenerator};
use crate::line_ending::LineEnding;
use crate::storage::{AtomicWriter, LineStorage, SaveOptions};
use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Lines further than this from the visible range are eligible for unloading.
pub const DEFAULT_UNLOAD_MARGIN: usize = 2000;

/// Hook run on a line's text when it is loaded or saved: `(line index, text)`.
pub type LineHook = Box<dyn Fn(usize, &mut String)>;

/// Options for opening a file.
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Encoding assumed when the file has no byte-order mark.
    pub default_encoding: TextEncoding,
    /// Distance from the visible range beyond which unchanged lines are unloaded.
    pub unload_margin: usize,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            default_encoding: TextEncoding::Utf8,
            unload_margin: DEFAULT_UNLOAD_MARGIN,
        }
    }
}

struct FileSlot {
    /// Start of the line in the backing file; `None` for lines that never were on disk.
    offset: Option<u64>,
    id: LineId,
    line: OnceCell<Line>,
}

/// Line storage backed by a file on disk.
pub struct FileLines {
    path: PathBuf,
    file: RefCell<File>,
    encoding: TextEncoding,
    has_bom: bool,
    detected_line_ending: Option<LineEnding>,
    slots: Vec<FileSlot>,
    unload_margin: usize,
    on_line_loaded: Option<LineHook>,
    on_line_saved: Option<LineHook>,
}

impl FileLines {
    /// Open `path` and index its lines.
    ///
    /// Ids for every line are allocated up front, so a line keeps its id across unload and
    /// reload.
    pub fn open(
        path: impl AsRef<Path>,
        ids: &mut LineIdGenerator,
        options: &FileOptions,
    ) -> EditResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let mut prefix = [0u8; 4];
        let read = read_prefix(&mut file, &mut prefix)?;
        let (encoding, bom_len, has_bom) = match TextEncoding::detect_bom(&prefix[..read]) {
            Some((encoding, len)) => (encoding, len as u64, true),
            None => (options.default_encoding, 0, false),
        };

        file.seek(SeekFrom::Start(bom_len))?;
        let (offsets, detected_line_ending) =
            scan_line_starts(BufReader::new(&mut file), encoding, bom_len)?;

        debug!(
            path = %path.display(),
            lines = offsets.len(),
            ?encoding,
            has_bom,
            "indexed file"
        );

        let slots = offsets
            .into_iter()
            .map(|offset| FileSlot {
                offset: Some(offset),
                id: ids.next_id(),
                line: OnceCell::new(),
            })
            .collect();

        Ok(Self {
            path,
            file: RefCell::new(file),
            encoding,
            has_bom,
            detected_line_ending,
            slots,
            unload_margin: options.unload_margin,
            on_line_loaded: None,
            on_line_saved: None,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding of the backing file.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Returns `true` if the backing file starts with a byte-order mark.
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// First line ending found in the file, `None` for single-line files.
    pub fn detected_line_ending(&self) -> Option<LineEnding> {
        self.detected_line_ending
    }

    /// Number of lines currently materialized.
    pub fn loaded_count(&self) -> usize {
        self.slots.iter().filter(|s| s.line.get().is_some()).count()
    }

    /// Install a hook that may rewrite each line's text as it is loaded.
    pub fn set_on_line_loaded(&mut self, hook: Option<LineHook>) {
        self.on_line_loaded = hook;
    }

    /// Install a hook that may rewrite each line's text as it is saved.
    pub fn set_on_line_saved(&mut self, hook: Option<LineHook>) {
        self.on_line_saved = hook;
    }

    fn load_line(&self, index: usize) -> Line {
        let slot = &self.slots[index];
        let mut text = match slot.offset {
            Some(offset) => match self.read_line_text(offset) {
                Ok(text) => text,
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        line = index,
                        error = %err,
                        "failed to load line, using an empty line"
                    );
                    String::new()
                }
            },
            None => String::new(),
        };
        if let Some(hook) = &self.on_line_loaded {
            hook(index, &mut text);
        }
        trace!(line = index, "loaded line");
        Line::from_text(slot.id, &text)
    }

    fn read_line_text(&self, offset: u64) -> io::Result<String> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(&mut *file);

        let unit_len = self.encoding.unit_len();
        let mut unit = [0u8; 4];
        let mut bytes = Vec::new();
        while read_unit(&mut reader, &mut unit[..unit_len])? {
            let value = self.encoding.unit_value(&unit[..unit_len]);
            if value == 0x0A || value == 0x0D {
                break;
            }
            bytes.extend_from_slice(&unit[..unit_len]);
        }
        Ok(self.encoding.decode(&bytes))
    }

    fn distance_from(index: usize, visible: &Range<usize>) -> usize {
        if index < visible.start {
            visible.start - index
        } else if index >= visible.end {
            index + 1 - visible.end
        } else {
            0
        }
    }
}

impl fmt::Debug for FileLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLines")
            .field("path", &self.path)
            .field("encoding", &self.encoding)
            .field("has_bom", &self.has_bom)
            .field("lines", &self.slots.len())
            .field("loaded", &self.loaded_count())
            .finish_non_exhaustive()
    }
}

impl LineStorage for FileLines {
    fn len(&self) -> usize {
        self.slots.len()
    }

    fn line_id(&self, index: usize) -> LineId {
        self.slots[index].id
    }

    fn get(&self, index: usize) -> &Line {
        self.slots[index]
            .line
            .get_or_init(|| self.load_line(index))
    }

    fn get_mut(&mut self, index: usize) -> &mut Line {
        if self.slots[index].line.get().is_none() {
            let line = self.load_line(index);
            let _ = self.slots[index].line.set(line);
        }
        self.slots[index]
            .line
            .get_mut()
            .expect("line materialized above")
    }

    fn insert(&mut self, index: usize, mut line: Line) {
        // Never on disk, so it must not be unloaded before the next save.
        line.is_changed = true;
        self.slots.insert(
            index,
            FileSlot {
                offset: None,
                id: line.id(),
                line: OnceCell::from(line),
            },
        );
    }

    fn remove(&mut self, index: usize, count: usize) {
        self.slots.drain(index..index + count);
    }

    fn is_loaded(&self, index: usize) -> bool {
        self.slots[index].line.get().is_some()
    }

    fn unload(&mut self, index: usize) -> bool {
        let slot = &mut self.slots[index];
        let unchanged = slot.line.get().is_some_and(|line| !line.is_changed);
        if slot.offset.is_some() && unchanged {
            slot.line.take();
            true
        } else {
            false
        }
    }

    fn unload_far_lines(&mut self, visible: Range<usize>) -> usize {
        let mut unloaded = 0;
        for index in 0..self.slots.len() {
            if Self::distance_from(index, &visible) > self.unload_margin && self.unload(index) {
                unloaded += 1;
            }
        }
        if unloaded > 0 {
            debug!(unloaded, remaining = self.loaded_count(), "unloaded far lines");
        }
        unloaded
    }

    fn save(&mut self, path: &Path, options: &SaveOptions) -> EditResult<()> {
        let separator = options.encoding.encode(options.line_ending.as_str());
        let mut writer = AtomicWriter::new(path)?;
        if options.write_bom {
            writer.write_all(options.encoding.bom())?;
        }

        let mut offsets = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                writer.write_all(&separator)?;
            }
            offsets.push(writer.position());

            let mut text = match (slot.line.get(), slot.offset) {
                (Some(line), _) if line.is_changed => line.text(),
                (_, Some(offset)) => self.read_line_text(offset)?,
                (Some(line), None) => line.text(),
                (None, None) => String::new(),
            };
            if let Some(hook) = &self.on_line_saved {
                hook(index, &mut text);
            }
            writer.write_all(&options.encoding.encode(&text))?;
        }
        writer.commit()?;

        *self.file.get_mut() = File::open(path)?;
        self.path = path.to_path_buf();
        self.encoding = options.encoding;
        self.has_bom = options.write_bom;
        for (slot, offset) in self.slots.iter_mut().zip(offsets) {
            slot.offset = Some(offset);
            if let Some(line) = slot.line.get_mut() {
                line.is_changed = false;
            }
        }

        debug!(path = %path.display(), lines = self.slots.len(), "saved file");
        Ok(())
    }

    fn as_file_lines(&self) -> Option<&FileLines> {
        Some(self)
    }

    fn as_file_lines_mut(&mut self) -> Option<&mut FileLines> {
        Some(self)
    }
}

fn read_prefix(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn read_unit(reader: &mut impl Read, unit: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(unit) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(err) => Err(err),
    }
}

/// Scan code units for line starts.
///
/// `'\n'` ends a line and the next line starts at the following unit. A `'\r'` not followed
/// by `'\n'` ends a line too, and a trailing `'\r'` yields a final empty line. The first
/// break found decides the detected line ending.
fn scan_line_starts(
    mut reader: impl Read,
    encoding: TextEncoding,
    start: u64,
) -> io::Result<(Vec<u64>, Option<LineEnding>)> {
    let unit_len = encoding.unit_len();
    let mut unit = [0u8; 4];
    let mut offsets = vec![start];
    let mut line_ending = None;
    let mut pos = start;
    let mut prev_cr = false;

    while read_unit(&mut reader, &mut unit[..unit_len])? {
        let value = encoding.unit_value(&unit[..unit_len]);
        let unit_start = pos;
        pos += unit_len as u64;

        if value == 0x0A {
            offsets.push(pos);
            line_ending.get_or_insert(if prev_cr { LineEnding::Crlf } else { LineEnding::Lf });
            prev_cr = false;
        } else {
            if prev_cr {
                offsets.push(unit_start);
                line_ending.get_or_insert(LineEnding::Cr);
            }
            prev_cr = value == 0x0D;
        }
    }
    if prev_cr {
        offsets.push(pos);
        line_ending.get_or_insert(LineEnding::Cr);
    }

    Ok((offsets, line_ending))
}
