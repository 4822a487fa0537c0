//! Line storage backends.
//!
//! A [`TextSource`](crate::TextSource) keeps its lines behind the [`LineStorage`] trait.
//! [`MemoryLines`] holds everything in a `Vec`; [`FileLines`](crate::FileLines) keeps only an
//! offset index in memory and materializes lines on first access.
//!
//! Index validation is the caller's job: every method may assume `index < len()` (or
//! `index <= len()` for insertion).

use crate::encoding::TextEncoding;
use crate::error::EditResult;
use crate::file_lines::FileLines;
use crate::line::{Line, LineId};
use crate::line_ending::LineEnding;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// How a document is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Encoding of the written bytes.
    pub encoding: TextEncoding,
    /// Write the encoding's byte-order mark first.
    pub write_bom: bool,
    /// Separator written between lines.
    pub line_ending: LineEnding,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            write_bom: false,
            line_ending: LineEnding::platform_default(),
        }
    }
}

/// Storage of the document's lines.
pub trait LineStorage {
    /// Number of lines.
    fn len(&self) -> usize;

    /// Returns `true` if there are no lines.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id of the line at `index`, without materializing it.
    fn line_id(&self, index: usize) -> LineId;

    /// The line at `index`, loading it if needed.
    fn get(&self, index: usize) -> &Line;

    /// Mutable line at `index`, loading it if needed.
    fn get_mut(&mut self, index: usize) -> &mut Line;

    /// Insert `line` before `index`.
    fn insert(&mut self, index: usize, line: Line);

    /// Remove `count` lines starting at `index`.
    fn remove(&mut self, index: usize, count: usize);

    /// Returns `true` if the line at `index` is materialized.
    fn is_loaded(&self, _index: usize) -> bool {
        true
    }

    /// Drop the in-memory copy of an unchanged line. Returns `true` if it was dropped.
    fn unload(&mut self, _index: usize) -> bool {
        false
    }

    /// Drop unchanged lines far away from `visible`. Returns the number of lines dropped.
    fn unload_far_lines(&mut self, _visible: Range<usize>) -> usize {
        0
    }

    /// Write every line to `path`.
    fn save(&mut self, path: &Path, options: &SaveOptions) -> EditResult<()>;

    /// The file-backed storage, if this is one.
    fn as_file_lines(&self) -> Option<&FileLines> {
        None
    }

    /// Mutable file-backed storage, if this is one.
    fn as_file_lines_mut(&mut self) -> Option<&mut FileLines> {
        None
    }
}

/// All lines held in memory.
#[derive(Debug, Default)]
pub struct MemoryLines {
    lines: Vec<Line>,
}

impl MemoryLines {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing lines.
    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }
}

impl LineStorage for MemoryLines {
    fn len(&self) -> usize {
        self.lines.len()
    }

    fn line_id(&self, index: usize) -> LineId {
        self.lines[index].id()
    }

    fn get(&self, index: usize) -> &Line {
        &self.lines[index]
    }

    fn get_mut(&mut self, index: usize) -> &mut Line {
        &mut self.lines[index]
    }

    fn insert(&mut self, index: usize, line: Line) {
        self.lines.insert(index, line);
    }

    fn remove(&mut self, index: usize, count: usize) {
        self.lines.drain(index..index + count);
    }

    fn save(&mut self, path: &Path, options: &SaveOptions) -> EditResult<()> {
        let separator = options.encoding.encode(options.line_ending.as_str());
        let mut writer = AtomicWriter::new(path)?;
        if options.write_bom {
            writer.write_all(options.encoding.bom())?;
        }
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writer.write_all(&separator)?;
            }
            writer.write_all(&options.encoding.encode(&line.text()))?;
        }
        writer.commit()?;
        for line in &mut self.lines {
            line.is_changed = false;
        }
        Ok(())
    }
}

/// Writes to a sibling temporary file and renames it over the target on commit.
///
/// Dropping the writer without committing removes the temporary file and leaves the target
/// untouched.
pub(crate) struct AtomicWriter {
    target_path: PathBuf,
    temp_path: PathBuf,
    writer: Option<BufWriter<fs::File>>,
    written: u64,
}

impl AtomicWriter {
    pub(crate) fn new(path: &Path) -> io::Result<Self> {
        let target_path = path.to_path_buf();
        let parent = match target_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let file_name = target_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let temp_path = parent.join(format!(".{}.tmp.{}", file_name, std::process::id()));
        let file = fs::File::create(&temp_path)?;

        Ok(Self {
            target_path,
            temp_path,
            writer: Some(BufWriter::new(file)),
            written: 0,
        })
    }

    /// Bytes written so far.
    pub(crate) fn position(&self) -> u64 {
        self.written
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("atomic writer already committed"))?;
        writer.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(())
    }

    pub(crate) fn commit(mut self) -> io::Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&self.temp_path, &self.target_path)
    }
}

impl Drop for AtomicWriter {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}
