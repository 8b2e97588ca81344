//! Single-line text codec for movie records.
//!
//! Every record is one JSON object on one line:
//!
//! ```text
//! {"title":"Alien","year":1979,"director":"Ridley Scott","genre":"Horror","cast":["Sigourney Weaver"],"plotSummary":"In space, no one can hear you scream.","ratings":{"alice":[5]},"reviews":{}}
//! ```
//!
//! String values use JSON escaping (`\"`, `\\`, `\n`, `\u00XX`), so commas,
//! quotes, braces and line breaks inside a field never end it early and the
//! encoded form never spans more than one line. The decoder tokenizes the
//! whole line before reading any field.
//!
//! Lines written by the catalog store carry the owning library:
//!
//! ```text
//! {"library":"alice","record":{...}}
//! ```
//!
//! [`decode_entry`] accepts both shapes; bare lines report no library.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::{
    movie::MovieRecord,
    types::{Username, is_valid_rating},
};

const LIBRARY_KEY: &str = "library";
const RECORD_KEY: &str = "record";
const YEAR_KEY: &str = "year";
const REQUIRED_FIELDS: [&str; 6] = ["title", YEAR_KEY, "director", "genre", "cast", "plotSummary"];

/// Failure to turn a line back into a [`MovieRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The line is not a structurally valid record.
    MalformedRecord(String),
    /// The `year` field holds something other than an integer.
    InvalidYear(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::MalformedRecord(reason) => write!(f, "malformed record: {reason}"),
            CodecError::InvalidYear(raw) => write!(f, "invalid year: {raw}"),
        }
    }
}

impl std::error::Error for CodecError {}

/// Encodes `record` as a single line without a trailing newline.
pub fn encode(record: &MovieRecord) -> String {
    record_value(record).to_string()
}

/// Decodes a line produced by [`encode`].
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. Lines
/// without `ratings`/`reviews` decode with empty maps.
pub fn decode(line: &str) -> Result<MovieRecord, CodecError> {
    record_from_value(parse_line(line)?)
}

/// Encodes `record` tagged with the library that owns it.
pub fn encode_entry(library: &str, record: &MovieRecord) -> String {
    json!({
        "library": library,
        "record": record_value(record),
    })
    .to_string()
}

/// Decodes a tagged store line or a bare record line.
///
/// Returns `None` as the library for bare lines.
pub fn decode_entry(line: &str) -> Result<(Option<Username>, MovieRecord), CodecError> {
    match parse_line(line)? {
        Value::Object(mut fields)
            if fields.contains_key(LIBRARY_KEY) && fields.contains_key(RECORD_KEY) =>
        {
            let library = match fields.remove(LIBRARY_KEY) {
                Some(Value::String(library)) => library,
                _ => return Err(malformed("library tag is not a string")),
            };
            let record = fields.remove(RECORD_KEY).unwrap_or_default();
            Ok((Some(library), record_from_value(record)?))
        }
        bare => Ok((None, record_from_value(bare)?)),
    }
}

fn record_value(record: &MovieRecord) -> Value {
    json!({
        "title": record.title,
        "year": record.year,
        "director": record.director,
        "genre": record.genre,
        "cast": record.cast,
        "plotSummary": record.plot_summary,
        "ratings": record.ratings,
        "reviews": record.reviews,
    })
}

fn parse_line(line: &str) -> Result<Value, CodecError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(malformed("empty line"));
    }
    serde_json::from_str(line).map_err(malformed)
}

fn record_from_value(value: Value) -> Result<MovieRecord, CodecError> {
    let Value::Object(fields) = value else {
        return Err(malformed("expected a JSON object"));
    };

    if let Some(missing) = REQUIRED_FIELDS.iter().find(|key| !fields.contains_key(**key)) {
        return Err(malformed(format!("missing field `{missing}`")));
    }
    check_year(&fields)?;

    let record: MovieRecord = serde_json::from_value(Value::Object(fields)).map_err(malformed)?;
    if record.title.is_empty() {
        return Err(malformed("empty title"));
    }
    for (user, ratings) in &record.ratings {
        if let Some(bad) = ratings.iter().find(|r| !is_valid_rating(**r)) {
            return Err(malformed(format!("rating {bad} by `{user}` is out of range")));
        }
    }
    Ok(record)
}

fn check_year(fields: &Map<String, Value>) -> Result<(), CodecError> {
    let raw = fields
        .get(YEAR_KEY)
        .ok_or_else(|| malformed("missing field `year`"))?;
    raw.as_i64()
        .and_then(|year| i32::try_from(year).ok())
        .map(|_| ())
        .ok_or_else(|| CodecError::InvalidYear(raw.to_string()))
}

fn malformed(reason: impl fmt::Display) -> CodecError {
    CodecError::MalformedRecord(reason.to_string())
}
