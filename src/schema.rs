use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Column type inferred from the content of a delimited source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    Integer,
    Double,
    Timestamp,
    String,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Double => "double",
            ColumnType::Timestamp => "timestamp",
            ColumnType::String => "string",
        };
        f.write_str(name)
    }
}

impl ColumnType {
    fn of_cell(cell: &str) -> ColumnType {
        if cell.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnType::Double
        } else if parse_timestamp(cell).is_some() {
            ColumnType::Timestamp
        } else {
            ColumnType::String
        }
    }

    /// Least upper bound of two observed types.
    fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Integer, Double) | (Double, Integer) => Double,
            _ => String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Renders the schema as an indented tree, one column per line.
    pub fn tree_string(&self) -> String {
        let mut out = String::from("root\n");
        for c in &self.columns {
            out.push_str(&format!(
                " |-- {}: {} (nullable = {})\n",
                c.name, c.data_type, c.nullable
            ));
        }
        out
    }
}

/// Accumulates per-column type observations while rows stream past.
#[derive(Debug)]
pub struct SchemaInference {
    names: Vec<String>,
    types: Vec<Option<ColumnType>>,
    nullable: Vec<bool>,
}

impl SchemaInference {
    pub fn new(names: Vec<String>) -> Self {
        let n = names.len();
        Self {
            names,
            types: vec![None; n],
            nullable: vec![false; n],
        }
    }

    pub fn observe<'a, I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for (i, cell) in cells.into_iter().enumerate().take(self.names.len()) {
            let cell = cell.trim();
            if cell.is_empty() {
                self.nullable[i] = true;
                continue;
            }
            let seen = ColumnType::of_cell(cell);
            self.types[i] = Some(match self.types[i] {
                Some(t) => t.widen(seen),
                None => seen,
            });
        }
    }

    /// Columns that never held a value are typed as strings.
    pub fn finish(self) -> Schema {
        let columns = self
            .names
            .into_iter()
            .zip(self.types)
            .zip(self.nullable)
            .map(|((name, t), nullable)| Column {
                name,
                data_type: t.unwrap_or(ColumnType::String),
                nullable,
            })
            .collect();
        Schema { columns }
    }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses a timestamp cell, keeping the stored wall-clock time. Values carrying an
/// offset are not converted to another timezone; a bare date reads as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a listen duration in seconds. Only finite, non-negative values qualify.
pub fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
