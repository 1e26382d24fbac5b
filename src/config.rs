use crate::constants;
use crate::error::{AnalyticsError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Job configuration. Every field defaults to the behaviour of a plain run
/// against `listening_logs.csv` / `songs_metadata.csv`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logs_path: PathBuf,
    pub songs_path: PathBuf,
    pub output_dir: PathBuf,
    pub top_n: usize,
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    pub preview_rows: usize,
    pub loyalty_preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logs_path: PathBuf::from(constants::DEFAULT_LOGS_PATH),
            songs_path: PathBuf::from(constants::DEFAULT_SONGS_PATH),
            output_dir: PathBuf::from(constants::DEFAULT_OUTPUT_DIR),
            top_n: constants::DEFAULT_TOP_N,
            night_start_hour: constants::DEFAULT_NIGHT_START_HOUR,
            night_end_hour: constants::DEFAULT_NIGHT_END_HOUR,
            preview_rows: constants::DEFAULT_PREVIEW_ROWS,
            loyalty_preview_rows: constants::DEFAULT_LOYALTY_PREVIEW_ROWS,
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH), false)
    }

    /// Loads configuration from `path`. When `required` is false a missing file
    /// yields the defaults; a file that exists but does not parse is always an error.
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(AnalyticsError::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path).map_err(|e| {
            AnalyticsError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(AnalyticsError::Config("top_n must be at least 1".into()));
        }
        if self.night_end_hour > 24 {
            return Err(AnalyticsError::Config(format!(
                "night_end_hour must be at most 24, got {}",
                self.night_end_hour
            )));
        }
        if self.night_start_hour >= self.night_end_hour {
            return Err(AnalyticsError::Config(format!(
                "night window [{}, {}) is empty",
                self.night_start_hour, self.night_end_hour
            )));
        }
        Ok(())
    }

    pub fn destination(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml"), false).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.night_end_hour, 5);
    }

    #[test]
    fn test_missing_required_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml"), true).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(_)));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_n = 3\noutput_dir = \"reports\"").unwrap();

        let config = Config::load_from(file.path(), true).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.logs_path, PathBuf::from("listening_logs.csv"));
        assert_eq!(
            config.destination("genre_loyalty"),
            PathBuf::from("reports/genre_loyalty")
        );
    }

    #[test]
    fn test_rejects_empty_night_window() {
        let config = Config {
            night_start_hour: 5,
            night_end_hour: 5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_top_n() {
        let config = Config {
            top_n: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_n = \"lots\"").unwrap();
        let err = Config::load_from(file.path(), false).unwrap_err();
        assert!(matches!(err, AnalyticsError::Toml(_)));
    }
}
