//! Movie domain record and draft types.

use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::types::{MovieField, Rating, Username};

/// The six descriptive fields of a movie, without per-user annotations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieDraft {
    /// Movie title.
    pub title: String,
    /// Release year.
    pub year: i32,
    /// Director name.
    pub director: String,
    /// Genre label.
    pub genre: String,
    /// Cast members in billing order.
    pub cast: Vec<String>,
    /// Free-form plot summary.
    pub plot_summary: String,
}

/// Fully materialized catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecord {
    /// Movie title; the lookup key inside a library.
    pub title: String,
    /// Release year.
    pub year: i32,
    /// Director name.
    pub director: String,
    /// Genre label.
    pub genre: String,
    /// Cast members in billing order.
    pub cast: Vec<String>,
    /// Free-form plot summary.
    pub plot_summary: String,
    /// Every rating each user has given, oldest first.
    #[serde(default)]
    pub ratings: BTreeMap<Username, Vec<Rating>>,
    /// Latest review text per user.
    #[serde(default)]
    pub reviews: BTreeMap<Username, String>,
}

impl From<MovieDraft> for MovieRecord {
    fn from(draft: MovieDraft) -> Self {
        Self {
            title: draft.title,
            year: draft.year,
            director: draft.director,
            genre: draft.genre,
            cast: draft.cast,
            plot_summary: draft.plot_summary,
            ratings: BTreeMap::new(),
            reviews: BTreeMap::new(),
        }
    }
}

impl MovieRecord {
    /// Overwrites the descriptive fields, keeping ratings and reviews.
    pub fn apply_draft(&mut self, draft: MovieDraft) {
        self.title = draft.title;
        self.year = draft.year;
        self.director = draft.director;
        self.genre = draft.genre;
        self.cast = draft.cast;
        self.plot_summary = draft.plot_summary;
    }

    /// Textual value of `field`; the year is rendered in decimal.
    pub fn field_text(&self, field: MovieField) -> Cow<'_, str> {
        match field {
            MovieField::Title => Cow::Borrowed(&self.title),
            MovieField::Year => Cow::Owned(self.year.to_string()),
            MovieField::Director => Cow::Borrowed(&self.director),
            MovieField::Genre => Cow::Borrowed(&self.genre),
        }
    }

    /// Returns true when `field` equals `value` exactly.
    pub fn field_matches(&self, field: MovieField, value: &str) -> bool {
        self.field_text(field) == value
    }

    /// Ratings `username` has given this movie.
    pub fn ratings_by(&self, username: &str) -> &[Rating] {
        self.ratings.get(username).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true when `username` has rated this movie at least once.
    pub fn is_rated_by(&self, username: &str) -> bool {
        !self.ratings_by(username).is_empty()
    }
}
