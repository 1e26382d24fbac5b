use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Source not found or unreadable: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Schema mismatch in {path}: {detail}")]
    SchemaMismatch { path: PathBuf, detail: String },

    #[error("Type coercion failed for column '{column}' at line {line}: '{raw}' is not {expected}")]
    TypeCoercion {
        column: String,
        raw: String,
        line: u64,
        expected: String,
    },

    #[error("Failed to write {path}: {source}")]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Task error: {0}")]
    Task(String),
}

impl AnalyticsError {
    /// Wraps an I/O failure on an output destination.
    pub fn sink(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalyticsError::SinkWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
