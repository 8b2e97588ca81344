//! Persistence sinks and line-oriented file helpers.

/// Flat text file sink and line reader/writer.
pub mod flat_file;

use std::fmt;

use crate::{
    codec::CodecError,
    core::catalog::CatalogSnapshot,
    movie::MovieRecord,
    types::Username,
};

/// Failure to read or write catalog lines.
#[derive(Debug)]
pub enum PersistError {
    /// The file could not be opened, read, or written.
    Io(std::io::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(err) => write!(f, "i/o failure: {err}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Result alias for persistence calls.
pub type PersistResult<T> = Result<T, PersistError>;

/// One decoded store line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Owning library, or `None` for untagged lines.
    pub library: Option<Username>,
    /// Decoded record.
    pub record: MovieRecord,
}

/// A line that was skipped while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_no: usize,
    /// Why the line was rejected.
    pub error: CodecError,
    /// The line as read, without its `\n` terminator.
    pub raw: Vec<u8>,
}

/// Outcome of reading a line-oriented file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineReport {
    /// Lines decoded into records.
    pub accepted: usize,
    /// Lines that failed to decode, in file order.
    pub skipped: Vec<SkippedLine>,
}

impl LineReport {
    /// Number of skipped lines.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Backing store a [`crate::core::catalog::Catalog`] loads from and saves to.
pub trait CatalogSink {
    /// Reads every persisted record, skipping undecodable lines.
    fn load(&mut self) -> PersistResult<(Vec<StoredEntry>, LineReport)>;
    /// Replaces the persisted records with `snapshot`, returning records written.
    ///
    /// Lines skipped by the last `load` are not records of the snapshot;
    /// implementations keep them rather than dropping them.
    fn save(&mut self, snapshot: &CatalogSnapshot) -> PersistResult<usize>;
    /// Forces buffered state to durable storage.
    fn flush(&mut self) -> PersistResult<()> {
        Ok(())
    }
}
