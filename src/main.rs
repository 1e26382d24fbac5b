use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use music_analytics::config::Config;
use music_analytics::pipeline::{self, Inputs, Task, TaskStatus};
use music_analytics::{logging, metrics};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "music_analytics")]
#[command(about = "Listening-log analytics: favorite genres, listen time, genre loyalty, night listeners")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    inputs: InputArgs,
}

#[derive(Args, Clone, Default)]
struct InputArgs {
    /// Config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Listening log CSV
    #[arg(long, global = true)]
    logs: Option<PathBuf>,
    /// Song metadata CSV
    #[arg(long, global = true)]
    songs: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analytics tasks and write their outputs
    Run {
        /// Root directory for the output destinations
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Users kept per genre in the loyalty ranking
        #[arg(long)]
        top_n: Option<usize>,
        /// Tasks to run (comma-separated names or numbers). Default: all
        #[arg(long, value_delimiter = ',')]
        tasks: Vec<Task>,
        /// Run tasks one after another instead of concurrently
        #[arg(long)]
        sequential: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print inferred schemas and row counts of the inputs
    Inspect,
}

fn load_config(args: &InputArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path, true),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    if let Some(logs) = &args.logs {
        config.logs_path = logs.clone();
    }
    if let Some(songs) = &args.songs {
        config.songs_path = songs.clone();
    }
    Ok(config)
}

async fn run(
    mut config: Config,
    output_dir: Option<PathBuf>,
    top_n: Option<usize>,
    tasks: Vec<Task>,
    sequential: bool,
    json: bool,
) -> anyhow::Result<bool> {
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(n) = top_n {
        config.top_n = n;
    }
    config.validate()?;

    let tasks = if tasks.is_empty() { Task::ALL.to_vec() } else { tasks };

    println!("🎧 Running {} task(s)...", tasks.len());
    let report = pipeline::run(config, &tasks, sequential)
        .await
        .context("failed to load inputs")?;

    println!("\n📊 Run Results ({}):", report.run_id);
    println!("   Log rows: {}", report.logs_rows);
    println!("   Songs: {}", report.songs_rows);
    for outcome in &report.outcomes {
        match &outcome.status {
            TaskStatus::Succeeded { rows, part_file, .. } => {
                println!("   ✅ {}: {} rows → {}", outcome.task, rows, part_file);
            }
            TaskStatus::Failed { error } => {
                println!("   ❌ {}: {}", outcome.task, error);
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    let failed = report.failed().count();
    if failed > 0 {
        warn!("{} of {} tasks failed", failed, report.outcomes.len());
    } else {
        info!("All {} tasks completed", report.outcomes.len());
    }
    Ok(report.is_success())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    let _guard = logging::init_logging();
    metrics::describe_metrics();

    let cli = Cli::parse();
    let config = load_config(&cli.inputs)?;

    let command = cli.command.unwrap_or(Commands::Run {
        output_dir: None,
        top_n: None,
        tasks: Vec::new(),
        sequential: false,
        json: false,
    });

    match command {
        Commands::Run {
            output_dir,
            top_n,
            tasks,
            sequential,
            json,
        } => {
            let succeeded = run(config, output_dir, top_n, tasks, sequential, json)
                .await
                .map_err(|e| {
                    error!("Run failed: {:#}", e);
                    e
                })?;
            if !succeeded {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect => {
            let inputs = Inputs::load(&config).context("failed to load inputs")?;
            print!("{}", inputs.describe(&config));
        }
    }

    Ok(ExitCode::SUCCESS)
}
