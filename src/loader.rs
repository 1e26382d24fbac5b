use crate::config::Config;
use crate::constants;
use crate::error::{AnalyticsError, Result};
use crate::schema::SchemaInference;
use crate::types::{ListenEvent, Logs, Song, Songs};
use csv::{ReaderBuilder, StringRecord};
use metrics::{counter, histogram};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Opens a delimited source, mapping an unreadable location to `SourceNotFound`.
fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        debug!("Failed to open {}: {}", path.display(), e);
        AnalyticsError::SourceNotFound {
            path: path.to_path_buf(),
        }
    })
}

/// Header positions of the columns a table requires, in the order requested.
fn column_indices(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<Vec<usize>> {
    let names: Vec<&str> = headers.iter().map(str::trim).collect();
    required
        .iter()
        .map(|want| {
            names.iter().position(|h| h == want).ok_or_else(|| {
                AnalyticsError::SchemaMismatch {
                    path: path.to_path_buf(),
                    detail: format!(
                        "missing column '{}' (found: {})",
                        want,
                        names.join(", ")
                    ),
                }
            })
        })
        .collect()
}

fn malformed(path: &Path, err: csv::Error) -> AnalyticsError {
    let line = err.position().map(|p| p.line()).unwrap_or_default();
    AnalyticsError::SchemaMismatch {
        path: path.to_path_buf(),
        detail: format!("malformed record at line {}: {}", line, err),
    }
}

/// Rows read from one source, before conversion to a typed relation
struct RawTable {
    indices: Vec<usize>,
    records: Vec<StringRecord>,
    inference: SchemaInference,
}

fn read_table<R: Read>(path: &Path, reader: R, required: &[&str]) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr.headers().map_err(|e| malformed(path, e))?.clone();
    let indices = column_indices(path, &headers, required)?;
    let mut inference =
        SchemaInference::new(headers.iter().map(|h| h.trim().to_string()).collect());

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| malformed(path, e))?;
        inference.observe(record.iter());
        records.push(record);
    }

    Ok(RawTable {
        indices,
        records,
        inference,
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

/// Reads the listening log. Rows with an empty `user_id` are skipped.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_logs(path: &Path) -> Result<Logs> {
    let started = Instant::now();
    let file = open_source(path)?;
    let raw = read_table(path, file, &constants::LOG_COLUMNS)?;
    let (user_idx, song_idx, ts_idx, dur_idx) =
        (raw.indices[0], raw.indices[1], raw.indices[2], raw.indices[3]);

    let mut rows = Vec::with_capacity(raw.records.len());
    let mut skipped = 0u64;
    for record in &raw.records {
        let cell = |i: usize| record.get(i).unwrap_or("");
        let line = line_of(record);
        if cell(user_idx).trim().is_empty() {
            warn!("Skipping log row at line {}: empty user_id", line);
            skipped += 1;
            continue;
        }
        rows.push(ListenEvent::from_raw(
            cell(user_idx),
            cell(song_idx),
            cell(ts_idx),
            cell(dur_idx),
            line,
        ));
    }

    let schema = raw.inference.finish();
    debug!("Inferred logs schema:\n{}", schema.tree_string());
    info!("Loaded {} log rows ({} skipped)", rows.len(), skipped);
    counter!("music_analytics_rows_loaded_total", "table" => "logs").increment(rows.len() as u64);
    counter!("music_analytics_rows_skipped_total", "table" => "logs").increment(skipped);
    histogram!("music_analytics_load_duration_seconds", "table" => "logs")
        .record(started.elapsed().as_secs_f64());

    Ok(Logs { rows, schema })
}

/// Reads the song catalog. Extra columns are ignored; rows with an empty
/// `song_id` are skipped; duplicated ids are kept.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_songs(path: &Path) -> Result<Songs> {
    let started = Instant::now();
    let file = open_source(path)?;
    let raw = read_table(path, file, &constants::SONG_COLUMNS)?;
    let (song_idx, genre_idx) = (raw.indices[0], raw.indices[1]);

    let mut rows = Vec::with_capacity(raw.records.len());
    let mut seen = HashSet::new();
    let mut skipped = 0u64;
    for record in &raw.records {
        let song_id = record.get(song_idx).unwrap_or("").trim();
        if song_id.is_empty() {
            warn!("Skipping song row at line {}: empty song_id", line_of(record));
            skipped += 1;
            continue;
        }
        if !seen.insert(song_id.to_string()) {
            warn!(
                "Duplicate song_id '{}' at line {}; joined rows will repeat",
                song_id,
                line_of(record)
            );
        }
        rows.push(Song {
            song_id: song_id.to_string(),
            genre: record.get(genre_idx).unwrap_or("").trim().to_string(),
        });
    }

    let schema = raw.inference.finish();
    debug!("Inferred songs schema:\n{}", schema.tree_string());
    info!("Loaded {} songs ({} skipped)", rows.len(), skipped);
    counter!("music_analytics_rows_loaded_total", "table" => "songs").increment(rows.len() as u64);
    counter!("music_analytics_rows_skipped_total", "table" => "songs").increment(skipped);
    histogram!("music_analytics_load_duration_seconds", "table" => "songs")
        .record(started.elapsed().as_secs_f64());

    Ok(Songs { rows, schema })
}

/// Loads both inputs named by the configuration. Either failing aborts the job.
pub fn load_inputs(config: &Config) -> Result<(Logs, Songs)> {
    let logs = load_logs(&config.logs_path)?;
    let songs = load_songs(&config.songs_path)?;
    Ok((logs, songs))
}
