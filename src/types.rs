use crate::constants;
use crate::error::{AnalyticsError, Result};
use crate::schema::{self, Schema};
use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::HashMap;

/// A cell that could not be converted to its column's type. Kept alongside the
/// row so only the queries reading that column fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoercionFailure {
    pub column: &'static str,
    pub raw: String,
    pub line: u64,
    pub expected: &'static str,
}

impl From<CoercionFailure> for AnalyticsError {
    fn from(f: CoercionFailure) -> Self {
        AnalyticsError::TypeCoercion {
            column: f.column.to_string(),
            raw: f.raw,
            line: f.line,
            expected: f.expected.to_string(),
        }
    }
}

pub type Coerced<T> = std::result::Result<T, CoercionFailure>;

/// One listening event from the logs source
#[derive(Debug, Clone, PartialEq)]
pub struct ListenEvent {
    pub user_id: String,
    pub song_id: String,
    pub timestamp: Coerced<Option<NaiveDateTime>>,
    pub duration_sec: Coerced<Option<f64>>,
    /// 1-based line in the source file, header included
    pub line: u64,
}

impl ListenEvent {
    /// Builds an event from raw cells, coercing the typed columns. An empty
    /// timestamp or duration cell is null, not a coercion failure.
    pub fn from_raw(user_id: &str, song_id: &str, timestamp: &str, duration_sec: &str, line: u64) -> Self {
        let timestamp = nullable(timestamp, schema::parse_timestamp).ok_or_else(|| CoercionFailure {
            column: constants::TIMESTAMP,
            raw: timestamp.to_string(),
            line,
            expected: "a timestamp",
        });
        let duration_sec = nullable(duration_sec, schema::parse_duration).ok_or_else(|| CoercionFailure {
            column: constants::DURATION_SEC,
            raw: duration_sec.to_string(),
            line,
            expected: "a non-negative number",
        });

        Self {
            user_id: user_id.trim().to_string(),
            song_id: song_id.trim().to_string(),
            timestamp,
            duration_sec,
            line,
        }
    }

    /// Seconds listened, `None` when the cell was empty
    pub fn duration(&self) -> Result<Option<f64>> {
        self.duration_sec.clone().map_err(AnalyticsError::from)
    }

    /// Hour-of-day of the stored timestamp, 0..=23; `None` when the cell was empty
    pub fn hour(&self) -> Result<Option<u32>> {
        self.timestamp
            .as_ref()
            .map(|ts| ts.map(|ts| ts.hour()))
            .map_err(|f| AnalyticsError::from(f.clone()))
    }
}

/// `Some(None)` for an empty cell, `Some(Some(v))` when it parses, `None` otherwise.
fn nullable<T>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Option<Option<T>> {
    if raw.trim().is_empty() {
        Some(None)
    } else {
        parse(raw).map(Some)
    }
}

/// One catalog entry from the songs source
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub genre: String,
}

#[derive(Debug, Clone, Default)]
pub struct Logs {
    pub rows: Vec<ListenEvent>,
    pub schema: Schema,
}

impl Logs {
    pub fn new(rows: Vec<ListenEvent>) -> Self {
        Self {
            rows,
            schema: Schema::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Songs {
    pub rows: Vec<Song>,
    pub schema: Schema,
}

impl Songs {
    pub fn new(rows: Vec<Song>) -> Self {
        Self {
            rows,
            schema: Schema::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Join index: song_id to every genre listed for it, in catalog order.
    /// A duplicated song_id maps to several genres and multiplies joined rows.
    pub fn genre_index(&self) -> HashMap<&str, Vec<&str>> {
        let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
        for song in &self.rows {
            index
                .entry(song.song_id.as_str())
                .or_default()
                .push(song.genre.as_str());
        }
        index
    }
}

/// A relation that can be previewed and written as delimited text.
pub trait Tabular {
    const HEADER: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

/// Shortest round-trip form, always with a decimal point (`75.0`, `66.66666666666667`).
pub fn format_double(value: f64) -> String {
    format!("{value:?}")
}

/// Like `format_double`, with null written as an empty cell.
pub fn format_nullable(value: Option<f64>) -> String {
    value.map(format_double).unwrap_or_default()
}

/// Q1 output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteGenre {
    pub user_id: String,
    pub genre: String,
    pub genre_listen_count: u64,
}

impl Tabular for FavoriteGenre {
    const HEADER: &'static [&'static str] = &["user_id", "genre", "genre_listen_count"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_id.clone(),
            self.genre.clone(),
            self.genre_listen_count.to_string(),
        ]
    }
}

/// Q2 output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageListenTime {
    pub user_id: String,
    /// `None` when every duration of the user was null
    pub avg_duration: Option<f64>,
}

impl Tabular for AverageListenTime {
    const HEADER: &'static [&'static str] = &["user_id", "avg_duration"];

    fn cells(&self) -> Vec<String> {
        vec![self.user_id.clone(), format_nullable(self.avg_duration)]
    }
}

/// Q3 output row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoyaltyScore {
    pub genre: String,
    pub user_id: String,
    /// `None` when every duration in the genre was null
    pub loyalty_score: Option<f64>,
}

impl Tabular for LoyaltyScore {
    const HEADER: &'static [&'static str] = &["genre", "user_id", "loyalty_score"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.genre.clone(),
            self.user_id.clone(),
            format_nullable(self.loyalty_score),
        ]
    }
}

/// Q4 output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightListener {
    pub user_id: String,
}

impl Tabular for NightListener {
    const HEADER: &'static [&'static str] = &["user_id"];

    fn cells(&self) -> Vec<String> {
        vec![self.user_id.clone()]
    }
}
