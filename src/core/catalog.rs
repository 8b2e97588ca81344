//! Per-user movie libraries and every operation on them.
//!
//! A [`Catalog`] owns its records outright. Mutations mark it dirty; a dirty
//! catalog with a sink writes itself back on [`Catalog::save`],
//! [`Catalog::shutdown`] or drop.

use std::{fmt, path::Path};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    codec,
    config::CatalogConfig,
    core::recommend::{self, Recommendation},
    movie::{MovieDraft, MovieRecord},
    persist::{CatalogSink, LineReport, PersistResult, flat_file::{self, FlatFileSink}},
    types::{MovieField, Rating, Username, is_valid_rating},
};

/// Failure of a catalog operation. The catalog is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record titled `title` in `username`'s library.
    NotFound {
        /// Library that was searched.
        username: Username,
        /// Title that was looked up.
        title: String,
    },
    /// Sort or filter criterion text that names no [`MovieField`].
    InvalidCriterion(String),
    /// Rating outside `1..=5`.
    InvalidRating(Rating),
}

impl StoreError {
    fn not_found(username: &str, title: &str) -> Self {
        Self::NotFound {
            username: username.to_string(),
            title: title.to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { username, title } => {
                write!(f, "movie `{title}` not found in library `{username}`")
            }
            StoreError::InvalidCriterion(raw) => write!(
                f,
                "invalid criterion `{raw}` (expected title, year, director or genre)"
            ),
            StoreError::InvalidRating(rating) => {
                write!(f, "rating {rating} is outside 1..=5")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// One user's library, records in library order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    /// Library owner.
    pub username: Username,
    /// Records in library order.
    pub records: Vec<MovieRecord>,
}

/// Owned copy of a whole catalog, libraries sorted by username.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Libraries in username order.
    pub libraries: Vec<LibrarySnapshot>,
}

/// In-memory movie catalog partitioned by username.
///
/// Titles are not unique. Title-addressed operations act on the first
/// match, except [`Catalog::delete_movie`] which removes them all. Reads
/// on an unknown username see an empty library and never create one.
pub struct Catalog {
    libraries: HashMap<Username, Vec<MovieRecord>>,
    sink: Option<Box<dyn CatalogSink>>,
    config: CatalogConfig,
    load_report: LineReport,
    dirty: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("libraries", &self.libraries)
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    /// Empty catalog with no backing store.
    pub fn new() -> Self {
        Self {
            libraries: HashMap::new(),
            sink: None,
            config: CatalogConfig::default(),
            load_report: LineReport::default(),
            dirty: false,
        }
    }

    /// Opens the flat store file named by `config`, creating nothing until the first save.
    pub fn open(config: CatalogConfig) -> PersistResult<Self> {
        let sink = FlatFileSink::new(config.store_path.clone());
        Self::with_sink(Box::new(sink), config)
    }

    /// Loads every entry `sink` holds, placing untagged ones in
    /// `config.default_library`.
    pub fn with_sink(mut sink: Box<dyn CatalogSink>, config: CatalogConfig) -> PersistResult<Self> {
        let (entries, load_report) = sink.load()?;
        let mut catalog = Self {
            libraries: HashMap::new(),
            sink: Some(sink),
            config,
            load_report,
            dirty: false,
        };

        for entry in entries {
            let library = entry
                .library
                .unwrap_or_else(|| catalog.config.default_library.clone());
            catalog.libraries.entry(library).or_default().push(entry.record);
        }

        debug!(
            libraries = catalog.libraries.len(),
            records = catalog.len(),
            "catalog opened"
        );
        Ok(catalog)
    }

    /// Catalog holding a copy of `snapshot`, without a sink.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let mut catalog = Self::new();
        for library in snapshot.libraries {
            catalog
                .libraries
                .entry(library.username)
                .or_default()
                .extend(library.records);
        }
        catalog
    }

    /// Copies every library, sorted by username.
    pub fn export_snapshot(&self) -> CatalogSnapshot {
        let libraries = self
            .usernames()
            .into_iter()
            .map(|username| LibrarySnapshot {
                username: username.to_string(),
                records: self.library(username).to_vec(),
            })
            .collect();
        CatalogSnapshot { libraries }
    }

    /// Settings the catalog was opened with.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Outcome of the initial load. Empty for catalogs without a sink.
    pub fn load_report(&self) -> &LineReport {
        &self.load_report
    }

    /// Whether there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records of `username`, in library order.
    pub fn library(&self, username: &str) -> &[MovieRecord] {
        self.libraries
            .get(username)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Library owners, sorted.
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libraries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Records across all libraries.
    pub fn len(&self) -> usize {
        self.libraries.values().map(Vec::len).sum()
    }

    /// True when no library holds a record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a record to `username`'s library, creating it if needed.
    ///
    /// The title is not checked here. A record with an empty title is
    /// saved like any other but fails to decode on the next load, where it
    /// is skipped and kept verbatim in the store.
    pub fn add_movie(&mut self, username: &str, record: impl Into<MovieRecord>) {
        self.libraries
            .entry(username.to_string())
            .or_default()
            .push(record.into());
        self.dirty = true;
    }

    /// Replaces the descriptive fields of the first record titled `title`,
    /// keeping its position, ratings and reviews. Returns false when absent.
    pub fn edit_movie(&mut self, username: &str, title: &str, draft: MovieDraft) -> bool {
        let Ok(record) = self.find_mut(username, title) else {
            return false;
        };
        record.apply_draft(draft);
        self.dirty = true;
        true
    }

    /// Removes every record titled `title`, returning how many went.
    pub fn delete_movie(&mut self, username: &str, title: &str) -> usize {
        let Some(library) = self.libraries.get_mut(username) else {
            return 0;
        };
        let before = library.len();
        library.retain(|record| record.title != title);
        let removed = before - library.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// First record titled `title`.
    pub fn search_movie(&self, username: &str, title: &str) -> Option<&MovieRecord> {
        self.library(username)
            .iter()
            .find(|record| record.title == title)
    }

    /// Parses `criterion` as a [`MovieField`] and sorts by it. On
    /// [`StoreError::InvalidCriterion`] the library is untouched.
    pub fn sort_movies(&mut self, username: &str, criterion: &str) -> Result<(), StoreError> {
        let field = criterion.parse::<MovieField>()?;
        self.sort_by_field(username, field);
        Ok(())
    }

    /// Stable ascending sort in place.
    pub fn sort_by_field(&mut self, username: &str, field: MovieField) {
        let Some(library) = self.libraries.get_mut(username) else {
            return;
        };
        match field {
            MovieField::Title => library.sort_by(|a, b| a.title.cmp(&b.title)),
            MovieField::Year => library.sort_by_key(|record| record.year),
            MovieField::Director => library.sort_by(|a, b| a.director.cmp(&b.director)),
            MovieField::Genre => library.sort_by(|a, b| a.genre.cmp(&b.genre)),
        }
        self.dirty = true;
    }

    /// Records whose `field` equals `value`, in library order.
    ///
    /// The iterator is lazy and can be cloned to walk the matches again.
    pub fn filter_movies<'a>(
        &'a self,
        username: &str,
        field: MovieField,
        value: &'a str,
    ) -> impl Iterator<Item = &'a MovieRecord> + Clone + use<'a> {
        self.library(username)
            .iter()
            .filter(move |record| record.field_matches(field, value))
    }

    /// Appends `rating` to `username`'s ratings of the first record titled
    /// `title`. Earlier ratings are kept.
    pub fn rate_movie(&mut self, username: &str, title: &str, rating: Rating) -> Result<(), StoreError> {
        if !is_valid_rating(rating) {
            return Err(StoreError::InvalidRating(rating));
        }
        let record = self.find_mut(username, title)?;
        record
            .ratings
            .entry(username.to_string())
            .or_default()
            .push(rating);
        self.dirty = true;
        Ok(())
    }

    /// Sets `username`'s review of the first record titled `title`,
    /// replacing any earlier one.
    pub fn review_movie(&mut self, username: &str, title: &str, text: &str) -> Result<(), StoreError> {
        let record = self.find_mut(username, title)?;
        record.reviews.insert(username.to_string(), text.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Titles `username` has rated anywhere in the catalog, most-rated first.
    pub fn recommend_movies(&self, username: &str) -> Vec<Recommendation> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in self.libraries.values().flatten() {
            if record.is_rated_by(username) {
                *counts.entry(record.title.as_str()).or_default() += 1;
            }
        }
        recommend::rank(counts)
    }

    /// Appends every decodable line of `path` to `username`'s library.
    ///
    /// Library tags on the lines are ignored. Bad lines are skipped and
    /// listed in the returned report.
    pub fn import_movies(&mut self, path: impl AsRef<Path>, username: &str) -> PersistResult<LineReport> {
        let path = path.as_ref();
        let (entries, report) = flat_file::read_entries_from(path)?;
        if !entries.is_empty() {
            self.libraries
                .entry(username.to_string())
                .or_default()
                .extend(entries.into_iter().map(|entry| entry.record));
            self.dirty = true;
        }
        info!(
            path = %path.display(),
            username,
            imported = report.accepted,
            skipped = report.skipped_count(),
            "imported movies"
        );
        Ok(report)
    }

    /// Overwrites `path` with `username`'s library as bare record lines.
    pub fn export_movies(&self, path: impl AsRef<Path>, username: &str) -> PersistResult<usize> {
        let path = path.as_ref();
        let lines = self.library(username).iter().map(codec::encode);
        let written = flat_file::write_lines(path, lines)?;
        debug!(path = %path.display(), username, written, "exported movies");
        Ok(written)
    }

    /// Writes the whole catalog through the sink and clears the dirty flag.
    ///
    /// Returns the number of records written, or 0 without a sink. On error
    /// the catalog stays dirty.
    pub fn save(&mut self) -> PersistResult<usize> {
        let snapshot = self.export_snapshot();
        let Some(sink) = self.sink.as_mut() else {
            return Ok(0);
        };
        let written = sink.save(&snapshot)?;
        sink.flush()?;
        self.dirty = false;
        Ok(written)
    }

    /// Saves unsaved changes and releases the catalog.
    pub fn shutdown(mut self) -> PersistResult<()> {
        let result = if self.dirty {
            self.save().map(|_| ())
        } else {
            Ok(())
        };
        self.dirty = false;
        result
    }

    fn find_mut(&mut self, username: &str, title: &str) -> Result<&mut MovieRecord, StoreError> {
        self.libraries
            .get_mut(username)
            .and_then(|library| library.iter_mut().find(|record| record.title == title))
            .ok_or_else(|| StoreError::not_found(username, title))
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        if !self.dirty || !self.config.persist_on_drop || self.sink.is_none() {
            return;
        }
        if let Err(err) = self.save() {
            error!(
                path = %self.config.store_path.display(),
                %err,
                "failed to save catalog on drop"
            );
        }
    }
}
