//! pomotrack - Pomodoro interval tracker for the task API.
//!
//! # Commands
//!
//! - `pomotrack run`: Interactive Pomodoro timer in the terminal
//! - `pomotrack tasks`: List active tasks
//! - `pomotrack today`: Show minutes logged today
//!
//! # Environment Variables
//!
//! See the [`config`](pomotrack_client::config) module for available
//! configuration options.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pomotrack_client::backend::Backend;
use pomotrack_client::client::{ApiClient, ApiClientConfig};
use pomotrack_client::config::Config;
use pomotrack_client::session::TimerStatus;
use pomotrack_client::tracker::IntervalTracker;
use pomotrack_client::types::IntervalKind;

/// pomotrack - Pomodoro timer that logs focus time to the task API.
#[derive(Parser, Debug)]
#[command(name = "pomotrack")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    POMOTRACK_API_URL              Task API base URL (required)
    POMOTRACK_SESSION_TOKEN        Session token for the API
    POMOTRACK_TIMEOUT_SECS         HTTP timeout (default: 30)
    POMOTRACK_FOCUS_MINUTES        Focus length (default: 25)
    POMOTRACK_SHORT_BREAK_MINUTES  Short break length (default: 5)
    POMOTRACK_LONG_BREAK_MINUTES   Long break length (default: 15)

COMMANDS WHILE RUNNING:
    f, focus        Start a focus interval
    s, short        Start a short break
    l, long         Start a long break
    p, toggle       Pause or resume
    r, reset        Reset the current interval (paused)
    t, task <ID>    Select the task for focus intervals
    q, quit         Exit

EXAMPLES:
    export POMOTRACK_API_URL=https://tasks.example.com/api
    pomotrack tasks
    pomotrack run --task task_1a2b3c
")]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive timer.
    Run {
        /// Task to attribute focus intervals to (defaults to the first active task).
        #[arg(short, long)]
        task: Option<String>,
    },

    /// List active tasks.
    Tasks,

    /// Show minutes logged today.
    Today,
}

/// A line typed while the timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Start(IntervalKind),
    Toggle,
    Reset,
    Select(String),
    Quit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_json);

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(api_url = %config.api_url, "Configuration loaded");

    let client = ApiClient::new(ApiClientConfig::from(&config))
        .context("Failed to create task API client")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let mut tracker = IntervalTracker::new(client, config.durations);

    match cli.command {
        Command::Run { task } => runtime.block_on(run_timer(&mut tracker, task)),
        Command::Tasks => runtime.block_on(run_tasks(&mut tracker)),
        Command::Today => runtime.block_on(run_today(&tracker)),
    }
}

/// Prints the active tasks.
async fn run_tasks<B: Backend>(tracker: &mut IntervalTracker<B>) -> Result<()> {
    tracker
        .refresh_tasks()
        .await
        .context("Failed to load tasks")?;

    if tracker.tasks().is_empty() {
        println!("No active tasks.");
        return Ok(());
    }

    for task in tracker.tasks() {
        println!(
            "{}\t{}\t{}",
            task.task_id,
            task.status.as_deref().unwrap_or("-"),
            task.title
        );
    }
    Ok(())
}

/// Prints today's total.
async fn run_today<B: Backend>(tracker: &IntervalTracker<B>) -> Result<()> {
    println!("{}m", tracker.daily_total_minutes().await);
    Ok(())
}

/// Runs the interactive timer until `quit`, EOF, or a shutdown signal.
async fn run_timer<B: Backend>(tracker: &mut IntervalTracker<B>, task: Option<String>) -> Result<()> {
    if let Err(e) = tracker.refresh_tasks().await {
        eprintln!("Could not load tasks: {e}");
    }
    if let Some(id) = task {
        tracker
            .select_task(&id)
            .with_context(|| format!("Cannot use task '{id}'"))?;
    }

    match tracker.selected_task() {
        Some(id) => println!("Task: {id}"),
        None if tracker.tasks().is_empty() => println!("No active tasks; focus time will not be recorded."),
        None => println!("No task selected."),
    }
    println!("Today: {}m", tracker.daily_total_minutes().await);
    println!("Type 'f' to start focusing, 'q' to quit.");

    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }

            _ = ticker.tick() => {
                if !tracker.state().is_running() {
                    continue;
                }
                if let Some(notice) = tracker.tick() {
                    println!();
                    println!("{}", notice.message());
                }
                print_status(tracker)?;
            }

            Some(notice) = tracker.write_outcome() => {
                println!();
                println!("{}", notice.message());
                print_status(tracker)?;
            }

            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let Some(input) = parse_input(&line) else {
                    if !line.trim().is_empty() {
                        println!("Unknown command: {}", line.trim());
                    }
                    continue;
                };
                if input == Input::Quit {
                    break;
                }
                if apply_input(tracker, input) {
                    // Count a full second from the moment the timer (re)starts.
                    ticker.reset();
                }
                print_status(tracker)?;
            }
        }
    }

    println!();
    info!(
        completed_focus_count = tracker.state().completed_focus_count(),
        "Timer stopped"
    );
    Ok(())
}

/// Applies one command. Returns true when it (re)started the countdown.
fn apply_input<B: Backend>(tracker: &mut IntervalTracker<B>, input: Input) -> bool {
    let restarts = matches!(input, Input::Start(_) | Input::Toggle);
    let result = match input {
        Input::Start(kind) => tracker.start(kind, None).map(|_| ()),
        Input::Toggle => tracker.toggle().map(|_| ()),
        Input::Reset => tracker.reset(),
        Input::Select(id) => tracker.select_task(&id),
        Input::Quit => Ok(()),
    };

    match result {
        Ok(()) => restarts && tracker.state().is_running(),
        Err(e) => {
            warn!(error = %e, "Command rejected");
            println!("{e}");
            false
        }
    }
}

fn print_status<B: Backend>(tracker: &IntervalTracker<B>) -> Result<()> {
    let snapshot = tracker.snapshot();
    let status = match snapshot.status {
        TimerStatus::Idle => "idle",
        TimerStatus::Running => "running",
        TimerStatus::Paused => "paused",
    };

    let mut stdout = io::stdout().lock();
    write!(
        stdout,
        "\r[{:<11}] {}  {:>3}%  {:<7}  pomodoros: {}   ",
        snapshot.kind.label(),
        snapshot.format_remaining(),
        snapshot.progress_percent(),
        status,
        snapshot.completed_focus_count
    )?;
    stdout.flush()?;
    Ok(())
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_ascii_lowercase();

    let input = match command.as_str() {
        "f" | "focus" => Input::Start(IntervalKind::Focus),
        "s" | "short" => Input::Start(IntervalKind::ShortBreak),
        "l" | "long" => Input::Start(IntervalKind::LongBreak),
        "p" | "toggle" | "pause" | "resume" => Input::Toggle,
        "r" | "reset" => Input::Reset,
        "t" | "task" => Input::Select(parts.next()?.to_string()),
        "q" | "quit" | "exit" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

/// Initializes the logging subsystem.
///
/// Logs go to stderr so they stay out of piped stdout.
fn init_logging(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
