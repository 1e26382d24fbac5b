use metrics::{describe_counter, describe_histogram, Unit};

/// Registers descriptions for every metric the job emits. Values are only
/// collected when the embedding process installs a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "music_analytics_rows_loaded_total",
        Unit::Count,
        "Rows accepted from an input table"
    );
    describe_counter!(
        "music_analytics_rows_skipped_total",
        Unit::Count,
        "Input rows skipped for a null key"
    );
    describe_counter!(
        "music_analytics_task_runs_total",
        Unit::Count,
        "Task runs by outcome"
    );
    describe_counter!(
        "music_analytics_rows_written_total",
        Unit::Count,
        "Rows written to a task's destination"
    );
    describe_histogram!(
        "music_analytics_task_duration_seconds",
        Unit::Seconds,
        "Wall time of query, preview and write for one task"
    );
    describe_histogram!(
        "music_analytics_load_duration_seconds",
        Unit::Seconds,
        "Wall time to read and type one input table"
    );
}
