//! Flat text file sink: one codec line per record.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{
    codec::{self, CodecError},
    core::catalog::CatalogSnapshot,
};

use super::{CatalogSink, LineReport, PersistResult, SkippedLine, StoredEntry};

/// File-backed implementation of [`crate::persist::CatalogSink`].
///
/// Lines that fail to decode on load are remembered verbatim and written
/// back after the records on every save, so a damaged line survives until
/// someone repairs it by hand.
#[derive(Debug, Clone)]
pub struct FlatFileSink {
    path: PathBuf,
    preserved: Vec<Vec<u8>>,
}

impl FlatFileSink {
    /// Sink reading and writing `path`. Nothing is touched until load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            preserved: Vec::new(),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Undecodable lines from the last load, kept for the next save.
    pub fn preserved_lines(&self) -> &[Vec<u8>] {
        &self.preserved
    }
}

impl CatalogSink for FlatFileSink {
    /// A missing file loads as an empty catalog.
    fn load(&mut self) -> PersistResult<(Vec<StoredEntry>, LineReport)> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file yet");
                self.preserved.clear();
                return Ok((Vec::new(), LineReport::default()));
            }
            Err(err) => return Err(err.into()),
        };

        let (entries, report) = read_entries(BufReader::new(file))?;
        self.preserved = report.skipped.iter().map(|line| line.raw.clone()).collect();
        debug!(
            path = %self.path.display(),
            loaded = report.accepted,
            skipped = report.skipped_count(),
            "loaded store file"
        );
        Ok((entries, report))
    }

    /// Atomically replaces the store file. Preserved lines follow the records.
    fn save(&mut self, snapshot: &CatalogSnapshot) -> PersistResult<usize> {
        let records = snapshot.libraries.iter().flat_map(|library| {
            library
                .records
                .iter()
                .map(|record| codec::encode_entry(&library.username, record).into_bytes())
        });
        let lines = replace_lines(&self.path, records.chain(self.preserved.iter().cloned()))?;
        let written = lines - self.preserved.len();
        debug!(
            path = %self.path.display(),
            written,
            preserved = self.preserved.len(),
            "saved store file"
        );
        Ok(written)
    }
}

/// Opens `path` and decodes every non-blank line.
pub fn read_entries_from(path: impl AsRef<Path>) -> PersistResult<(Vec<StoredEntry>, LineReport)> {
    let file = File::open(path)?;
    read_entries(BufReader::new(file))
}

/// Decodes every non-blank line of `reader`, tagged or bare.
///
/// Undecodable lines, including ones that are not valid UTF-8, are skipped
/// and reported with their raw bytes. Only read failures abort.
pub fn read_entries(mut reader: impl BufRead) -> PersistResult<(Vec<StoredEntry>, LineReport)> {
    let mut entries = Vec::new();
    let mut report = LineReport::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;

        let decoded = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => codec::decode_entry(line),
            Err(_) => Err(CodecError::MalformedRecord(
                "line is not valid UTF-8".to_string(),
            )),
        };

        match decoded {
            Ok((library, record)) => {
                report.accepted += 1;
                entries.push(StoredEntry { library, record });
            }
            Err(error) => {
                warn!(line_no, %error, "skipping undecodable line");
                let raw = buf.strip_suffix(b"\n").unwrap_or(&buf).to_vec();
                report.skipped.push(SkippedLine { line_no, error, raw });
            }
        }
    }

    Ok((entries, report))
}

/// Truncates `path` and writes each line followed by `\n`.
pub fn write_lines<I>(path: impl AsRef<Path>, lines: I) -> PersistResult<usize>
where
    I: IntoIterator<Item = String>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let written = write_all_lines(&mut out, lines)?;
    out.flush()?;
    Ok(written)
}

/// Replaces `path` with `lines`, each followed by `\n`.
///
/// The lines go to a temporary file in the same directory which is synced
/// and then renamed over `path`. On failure `path` keeps its old contents.
pub fn replace_lines<I, L>(path: impl AsRef<Path>, lines: I) -> PersistResult<usize>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    replace_with(path.as_ref(), |out| write_all_lines(out, lines))
}

fn replace_with<F>(path: &Path, write: F) -> PersistResult<usize>
where
    F: FnOnce(&mut dyn Write) -> io::Result<usize>,
{
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    let written = {
        let mut out = BufWriter::new(&mut tmp);
        let written = write(&mut out)?;
        out.flush()?;
        written
    };
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(written)
}

fn write_all_lines<I, L>(out: &mut dyn Write, lines: I) -> io::Result<usize>
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut written = 0usize;
    for line in lines {
        out.write_all(line.as_ref())?;
        out.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}
