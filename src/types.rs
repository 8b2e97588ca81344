//! Shared primitive aliases and catalog-related enums.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::core::catalog::StoreError;

/// Library owner name.
pub type Username = String;
/// Single star rating.
pub type Rating = u8;

/// Lowest accepted rating.
pub const RATING_MIN: Rating = 1;
/// Highest accepted rating.
pub const RATING_MAX: Rating = 5;

/// Returns true when `rating` lies within `RATING_MIN..=RATING_MAX`.
pub fn is_valid_rating(rating: Rating) -> bool {
    (RATING_MIN..=RATING_MAX).contains(&rating)
}

/// Record field used as a sort or filter criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieField {
    /// Movie title.
    Title,
    /// Release year.
    Year,
    /// Director name.
    Director,
    /// Genre label.
    Genre,
}

impl MovieField {
    /// All criteria in menu order.
    pub const ALL: [MovieField; 4] = [
        MovieField::Title,
        MovieField::Year,
        MovieField::Director,
        MovieField::Genre,
    ];

    /// Lowercase criterion name.
    pub fn as_str(self) -> &'static str {
        match self {
            MovieField::Title => "title",
            MovieField::Year => "year",
            MovieField::Director => "director",
            MovieField::Genre => "genre",
        }
    }
}

impl fmt::Display for MovieField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovieField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::InvalidCriterion(s.to_string()))
    }
}
