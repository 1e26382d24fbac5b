//! Column and destination names shared across the loader, queries and writer.

// Input columns
pub const USER_ID: &str = "user_id";
pub const SONG_ID: &str = "song_id";
pub const TIMESTAMP: &str = "timestamp";
pub const DURATION_SEC: &str = "duration_sec";
pub const GENRE: &str = "genre";

pub const LOG_COLUMNS: [&str; 4] = [USER_ID, SONG_ID, TIMESTAMP, DURATION_SEC];
pub const SONG_COLUMNS: [&str; 2] = [SONG_ID, GENRE];

// Default input locations
pub const DEFAULT_LOGS_PATH: &str = "listening_logs.csv";
pub const DEFAULT_SONGS_PATH: &str = "songs_metadata.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

// Output destinations (directories under the output root)
pub const USER_FAV_GENRE: &str = "user_fav_genre";
pub const AVG_LISTEN_TIME: &str = "avg_listen_time";
pub const GENRE_LOYALTY: &str = "genre_loyalty";
pub const MIDNIGHT_LISTENERS: &str = "midnight_listeners";

/// Name of the single data file written into each destination directory
pub const PART_FILE: &str = "part-00000.csv";
/// Empty marker written after the part file completes
pub const SUCCESS_MARKER: &str = "_SUCCESS";

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_NIGHT_START_HOUR: u32 = 0;
pub const DEFAULT_NIGHT_END_HOUR: u32 = 5;
pub const DEFAULT_PREVIEW_ROWS: usize = 10;
pub const DEFAULT_LOYALTY_PREVIEW_ROWS: usize = 20;
