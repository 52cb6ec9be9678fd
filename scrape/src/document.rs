//! The generated lookup-table document.
//!
//! A document has three segments: a two-line preamble, the entry lines, and
//! a one-line terminator. [`OutputDocument`] writes them in that order over
//! any [`Write`] sink and keeps a SHA-256 digest of everything written.
//! [`DocumentFile`] adds file handling: it writes to a `*.partial` sibling
//! and renames it over the target only once the terminator is written, so an
//! aborted run never leaves a truncated table behind.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use gearset_core::TableEntry;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Fixed preamble lines: a dependency guard and the opening of the
/// registration call.
pub const PREAMBLE: [&str; 2] = [
    r#"if not LibStub("LibPeriodicTable-3.1", true) then error("PT3 must be loaded before data") end"#,
    r#"LibStub("LibPeriodicTable-3.1"):AddData("GearSet", gsub("$Rev: 584 $", "(%d+)", function(n) return n+90000 end), {"#,
];

/// Fixed terminator line closing the registration call.
pub const TERMINATOR: &str = "}";

/// Error while opening, writing or closing a document file.
#[derive(Debug, thiserror::Error)]
#[error("failed to {action} '{}': {source}", path.display())]
pub struct DocumentError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl DocumentError {
    fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Totals for a closed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStats {
    /// Entry lines written between preamble and terminator.
    pub entries: usize,
    /// Total bytes written.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the full document.
    pub checksum: String,
}

/// Preamble, entries and terminator over a [`Write`] sink.
///
/// # Examples
///
/// ```
/// use gearset_core::TableEntry;
/// use gearset_scrape::document::OutputDocument;
///
/// let mut doc = OutputDocument::open(Vec::new()).unwrap();
/// doc.append(&[TableEntry::new("1", 60, "Warrior", "Battlegear of Might")]).unwrap();
/// let (bytes, stats) = doc.close().unwrap();
///
/// let text = String::from_utf8(bytes).unwrap();
/// assert_eq!(text.lines().count(), 4);
/// assert_eq!(stats.entries, 1);
/// ```
pub struct OutputDocument<W: Write> {
    writer: W,
    hasher: Sha256,
    entries: usize,
    bytes: u64,
}

impl<W: Write> OutputDocument<W> {
    /// Writes the preamble and returns the open document.
    pub fn open(writer: W) -> io::Result<Self> {
        let mut doc = Self {
            writer,
            hasher: Sha256::new(),
            entries: 0,
            bytes: 0,
        };
        let mut preamble = String::new();
        for line in PREAMBLE {
            preamble.push_str(line);
            preamble.push('\n');
        }
        doc.write_chunk(&preamble)?;
        Ok(doc)
    }

    /// Appends entry lines.
    ///
    /// All lines are rendered before the single write, so a batch is either
    /// handed to the sink whole or not at all.
    pub fn append(&mut self, entries: &[TableEntry]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut chunk = String::new();
        for entry in entries {
            chunk.push_str(&entry.line());
            chunk.push('\n');
        }
        self.write_chunk(&chunk)?;
        self.entries += entries.len();
        Ok(())
    }

    /// Entry lines written so far.
    pub fn entries_written(&self) -> usize {
        self.entries
    }

    /// Writes the terminator, flushes, and hands back the sink.
    pub fn close(mut self) -> io::Result<(W, DocumentStats)> {
        self.write_chunk(&format!("{TERMINATOR}\n"))?;
        self.writer.flush()?;
        let stats = DocumentStats {
            entries: self.entries,
            bytes: self.bytes,
            checksum: format!("{:x}", self.hasher.finalize()),
        };
        Ok((self.writer, stats))
    }

    fn write_chunk(&mut self, chunk: &str) -> io::Result<()> {
        self.writer.write_all(chunk.as_bytes())?;
        self.hasher.update(chunk.as_bytes());
        self.bytes += chunk.len() as u64;
        Ok(())
    }
}

/// A finished document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub path: PathBuf,
    pub stats: DocumentStats,
}

/// An [`OutputDocument`] backed by a file that appears at its final path
/// only after [`finish`](DocumentFile::finish).
///
/// Dropping an unfinished `DocumentFile` closes the handle and removes the
/// partial file.
pub struct DocumentFile {
    path: PathBuf,
    partial: PathBuf,
    document: Option<OutputDocument<BufWriter<File>>>,
}

impl DocumentFile {
    /// Creates the partial file (and missing parent directories) and writes
    /// the preamble.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let partial = partial_path(&path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| DocumentError::new("create directory", parent, err))?;
            }
        }

        let file =
            File::create(&partial).map_err(|err| DocumentError::new("create", &partial, err))?;
        let document = OutputDocument::open(BufWriter::new(file))
            .map_err(|err| DocumentError::new("write preamble to", &partial, err))?;
        debug!(path = %path.display(), "opened output document");

        Ok(Self {
            path,
            partial,
            document: Some(document),
        })
    }

    /// Final path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends entry lines.
    pub fn append(&mut self, entries: &[TableEntry]) -> Result<(), DocumentError> {
        let Some(document) = self.document.as_mut() else {
            return Err(self.closed_error());
        };
        document
            .append(entries)
            .map_err(|err| DocumentError::new("write to", &self.partial, err))
    }

    /// Entry lines written so far.
    pub fn entries_written(&self) -> usize {
        self.document
            .as_ref()
            .map_or(0, OutputDocument::entries_written)
    }

    /// Writes the terminator, syncs and closes the file, and moves it to its
    /// final path.
    pub fn finish(mut self) -> Result<DocumentSummary, DocumentError> {
        let Some(document) = self.document.take() else {
            return Err(self.closed_error());
        };
        let stats = match self.close_and_rename(document) {
            Ok(stats) => stats,
            Err(err) => {
                let _ = fs::remove_file(&self.partial);
                return Err(err);
            }
        };
        debug!(path = %self.path.display(), entries = stats.entries, "closed output document");

        Ok(DocumentSummary {
            path: self.path.clone(),
            stats,
        })
    }

    fn close_and_rename(
        &self,
        document: OutputDocument<BufWriter<File>>,
    ) -> Result<DocumentStats, DocumentError> {
        let (writer, stats) = document
            .close()
            .map_err(|err| DocumentError::new("write terminator to", &self.partial, err))?;
        let file = writer
            .into_inner()
            .map_err(|err| DocumentError::new("flush", &self.partial, err.into_error()))?;
        file.sync_all()
            .map_err(|err| DocumentError::new("sync", &self.partial, err))?;
        drop(file);

        fs::rename(&self.partial, &self.path)
            .map_err(|err| DocumentError::new("rename", &self.path, err))?;
        Ok(stats)
    }

    fn closed_error(&self) -> DocumentError {
        DocumentError::new(
            "write to",
            &self.partial,
            io::Error::other("document already closed"),
        )
    }
}

impl Drop for DocumentFile {
    fn drop(&mut self) {
        if self.document.take().is_some() {
            let _ = fs::remove_file(&self.partial);
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
