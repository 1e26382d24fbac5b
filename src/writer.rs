use crate::constants;
use crate::error::{AnalyticsError, Result};
use crate::types::Tabular;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Where a result relation landed
#[derive(Debug, Clone, Serialize)]
pub struct WrittenTable {
    pub destination: PathBuf,
    pub part_file: PathBuf,
    pub rows: usize,
}

/// Removes whatever currently sits at `dest` and recreates it as an empty directory.
fn reset_destination(dest: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            debug!("Overwriting existing output {}", dest.display());
            fs::remove_dir_all(dest)?;
        }
        Ok(_) => fs::remove_file(dest)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dest)
}

fn write_part<T: Tabular>(rows: &[T], part_file: &Path) -> io::Result<()> {
    let file = File::create(part_file)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
    wtr.write_record(T::HEADER)?;
    for row in rows {
        wtr.write_record(row.cells())?;
    }
    wtr.flush()
}

/// Writes `rows` under the directory `dest` as a header-prefixed part file
/// followed by a `_SUCCESS` marker, replacing any previous contents.
#[instrument(skip_all, fields(dest = %dest.display(), rows = rows.len()))]
pub fn write_table<T: Tabular>(rows: &[T], dest: &Path) -> Result<WrittenTable> {
    reset_destination(dest).map_err(|e| AnalyticsError::sink(dest, e))?;

    let part_file = dest.join(constants::PART_FILE);
    write_part(rows, &part_file).map_err(|e| AnalyticsError::sink(&part_file, e))?;

    let marker = dest.join(constants::SUCCESS_MARKER);
    File::create(&marker).map_err(|e| AnalyticsError::sink(&marker, e))?;

    info!("Wrote {} rows to {}", rows.len(), dest.display());
    Ok(WrittenTable {
        destination: dest.to_path_buf(),
        part_file,
        rows: rows.len(),
    })
}
