use crate::config::Config;
use crate::constants;
use crate::error::{AnalyticsError, Result};
use crate::loader;
use crate::preview;
use crate::queries::{self, NightWindow};
use crate::types::{Logs, Songs, Tabular};
use crate::writer::{self, WrittenTable};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, instrument};
use uuid::Uuid;

/// One independent unit of work: a query, its preview and its output write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Task {
    FavoriteGenre,
    AvgListenTime,
    GenreLoyalty,
    NightListeners,
}

impl Task {
    pub const ALL: [Task; 4] = [
        Task::FavoriteGenre,
        Task::AvgListenTime,
        Task::GenreLoyalty,
        Task::NightListeners,
    ];

    /// Destination directory name under the output root
    pub fn name(&self) -> &'static str {
        match self {
            Task::FavoriteGenre => constants::USER_FAV_GENRE,
            Task::AvgListenTime => constants::AVG_LISTEN_TIME,
            Task::GenreLoyalty => constants::GENRE_LOYALTY,
            Task::NightListeners => constants::MIDNIGHT_LISTENERS,
        }
    }

    pub fn number(&self) -> usize {
        match self {
            Task::FavoriteGenre => 1,
            Task::AvgListenTime => 2,
            Task::GenreLoyalty => 3,
            Task::NightListeners => 4,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = AnalyticsError;

    /// Accepts the destination name or the task number.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Task::ALL
            .into_iter()
            .find(|t| t.name() == s || t.number().to_string() == s)
            .ok_or_else(|| {
                AnalyticsError::Config(format!(
                    "Unknown task '{}'. Available: {}",
                    s,
                    Task::ALL.map(|t| t.name()).join(", ")
                ))
            })
    }
}

/// Both loaded relations, shared read-only by every task
#[derive(Debug, Default)]
pub struct Inputs {
    pub logs: Logs,
    pub songs: Songs,
}

impl Inputs {
    pub fn load(config: &Config) -> Result<Self> {
        let (logs, songs) = loader::load_inputs(config)?;
        Ok(Self { logs, songs })
    }

    /// Row counts and inferred schemas of both inputs.
    pub fn describe(&self, config: &Config) -> String {
        format!(
            "{} ({} rows)\n{}\n{} ({} rows)\n{}",
            config.logs_path.display(),
            self.logs.len(),
            self.logs.schema.tree_string(),
            config.songs_path.display(),
            self.songs.len(),
            self.songs.schema.tree_string(),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded {
        rows: usize,
        destination: String,
        part_file: String,
    },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task: Task,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub duration_secs: f64,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }
}

/// Result of a complete job run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub logs_rows: usize,
    pub songs_rows: usize,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }

    pub fn outcome(&self, task: Task) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.task == task)
    }
}

fn clock_hour(hour: u32) -> String {
    match hour % 24 {
        0 => "12 AM".to_string(),
        h @ 1..=11 => format!("{h} AM"),
        12 => "12 PM".to_string(),
        h => format!("{} PM", h - 12),
    }
}

/// Prints the preview block in one write so concurrent tasks do not interleave,
/// then writes the output.
fn emit<T: Tabular>(title: String, rows: &[T], limit: usize, dest: &std::path::Path) -> Result<WrittenTable> {
    print!("{}\n{}\n", title, preview::render(rows, limit));
    writer::write_table(rows, dest)
}

/// Computes one task's relation, previews it and writes it to its destination.
pub fn run_task(task: Task, inputs: &Inputs, config: &Config) -> Result<WrittenTable> {
    let dest = config.destination(task.name());
    let (logs, songs) = (&inputs.logs, &inputs.songs);

    match task {
        Task::FavoriteGenre => {
            let rows = queries::favorite_genres(logs, songs)?;
            let title = format!("Task 1: User Favorite Genres (Top {})", config.preview_rows);
            emit(title, &rows, config.preview_rows, &dest)
        }
        Task::AvgListenTime => {
            let rows = queries::average_listen_time(logs)?;
            let title = format!(
                "Task 2: Average Listen Time per User (Top {})",
                config.preview_rows
            );
            emit(title, &rows, config.preview_rows, &dest)
        }
        Task::GenreLoyalty => {
            let scores = queries::genre_loyalty(logs, songs)?;
            let rows = queries::top_loyal_users(scores, config.top_n);
            let title = format!("Task 3: Top {} Loyal Users per Genre", config.top_n);
            emit(title, &rows, config.loyalty_preview_rows, &dest)
        }
        Task::NightListeners => {
            let window = NightWindow::from_config(config);
            let rows = queries::night_listeners(logs, window)?;
            let title = format!(
                "Task 4: Users who listen between {} and {} (Count: {})",
                clock_hour(window.start_hour),
                clock_hour(window.end_hour),
                rows.len()
            );
            emit(title, &rows, config.preview_rows, &dest)
        }
    }
}

/// Runs `run_task` with timing, logging and metrics, never failing the caller.
fn run_task_recorded(task: Task, inputs: &Inputs, config: &Config) -> TaskOutcome {
    let span = info_span!("task", name = %task);
    let _enter = span.enter();
    let started = Instant::now();

    let result = run_task(task, inputs, config);
    let duration_secs = started.elapsed().as_secs_f64();
    histogram!("music_analytics_task_duration_seconds", "task" => task.name()).record(duration_secs);

    let status = match result {
        Ok(written) => {
            info!("Task finished: {} rows in {:.3}s", written.rows, duration_secs);
            counter!("music_analytics_task_runs_total", "task" => task.name(), "outcome" => "succeeded")
                .increment(1);
            counter!("music_analytics_rows_written_total", "task" => task.name())
                .increment(written.rows as u64);
            TaskStatus::Succeeded {
                rows: written.rows,
                destination: written.destination.display().to_string(),
                part_file: written.part_file.display().to_string(),
            }
        }
        Err(e) => {
            error!("Task failed: {}", e);
            counter!("music_analytics_task_runs_total", "task" => task.name(), "outcome" => "failed")
                .increment(1);
            TaskStatus::Failed {
                error: e.to_string(),
            }
        }
    };

    TaskOutcome {
        task,
        status,
        duration_secs,
    }
}

/// Runs the requested tasks over already-loaded inputs. Tasks run on the
/// blocking pool concurrently unless `sequential` is set; a failing task
/// never prevents the others from writing. Outcomes follow the order of `tasks`.
pub async fn run_tasks(
    inputs: Arc<Inputs>,
    config: Arc<Config>,
    tasks: &[Task],
    sequential: bool,
) -> Vec<TaskOutcome> {
    let spawn = |task: Task| {
        let inputs = inputs.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || run_task_recorded(task, &inputs, &config))
    };

    let mut outcomes = Vec::with_capacity(tasks.len());
    if sequential {
        for &task in tasks {
            outcomes.push(join_outcome(task, spawn(task).await));
        }
    } else {
        let handles: Vec<_> = tasks.iter().map(|&task| (task, spawn(task))).collect();
        for (task, handle) in handles {
            outcomes.push(join_outcome(task, handle.await));
        }
    }
    outcomes
}

fn join_outcome(task: Task, joined: std::result::Result<TaskOutcome, tokio::task::JoinError>) -> TaskOutcome {
    joined.unwrap_or_else(|e| {
        let err = AnalyticsError::Task(format!("{} did not complete: {}", task, e));
        error!("{}", err);
        TaskOutcome {
            task,
            status: TaskStatus::Failed {
                error: err.to_string(),
            },
            duration_secs: 0.0,
        }
    })
}

/// Loads both inputs and runs the requested tasks. Only a load failure is
/// returned as an error; task failures are recorded in the report.
#[instrument(skip_all, fields(tasks = tasks.len()))]
pub async fn run(config: Config, tasks: &[Task], sequential: bool) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, "Loading inputs");

    let inputs = Inputs::load(&config)?;
    let (logs_rows, songs_rows) = (inputs.logs.len(), inputs.songs.len());

    let outcomes = run_tasks(Arc::new(inputs), Arc::new(config), tasks, sequential).await;

    Ok(RunReport {
        run_id,
        started_at,
        logs_rows,
        songs_rows,
        outcomes,
    })
}
