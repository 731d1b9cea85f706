//! JustDoIt - task manager CLI
//!
//! Entry point for listing, editing and breaking down tasks.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use justdoit::ai::{TextService, create_text_service};
use justdoit::breakdown::{BreakdownOutcome, breakdown};
use justdoit::cli::{Cli, Command};
use justdoit::config::{Config, StorageConfig};
use justdoit::state::{SaveWarning, StoreManager};
use taskstore::{FileKvStore, Filter, MemoryKvStore, Priority, SessionLock, Task, TaskPersistence, TaskStore, short_id};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("justdoit")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("justdoit.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Open the file-backed store, or keep working in memory if the data
/// directory is unusable
///
/// The returned lock keeps other `jd` processes out of the data directory
/// until it is dropped, so each command's load-modify-save is not interleaved
/// with another's.
fn open_store(storage: &StorageConfig) -> (TaskStore, Option<SessionLock>) {
    debug!(data_dir = %storage.data_dir.display(), "open_store: called");
    let opened = FileKvStore::open(&storage.data_dir).and_then(|kv| kv.lock_session().map(|lock| (kv, lock)));
    match opened {
        Ok((kv, lock)) => (TaskStore::open(TaskPersistence::new(kv)), Some(lock)),
        Err(e) => {
            warn!(error = %e, "Cannot open data directory, changes will not be saved");
            eprintln!(
                "{} Cannot use {}: {}. Changes will not be saved.",
                "!".yellow(),
                storage.data_dir.display(),
                e
            );
            (TaskStore::open(TaskPersistence::new(MemoryKvStore::new())), None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    info!(data_dir = %config.storage.data_dir.display(), "justdoit starting");

    let (store, session) = open_store(&config.storage);
    let manager = StoreManager::spawn(store);
    let result = run(cli.command, &config, &manager).await;
    let _ = manager.shutdown().await;
    drop(session);
    result
}

async fn run(command: Command, config: &Config, manager: &StoreManager) -> Result<()> {
    debug!(?command, "run: dispatching command");
    match command {
        Command::List { filter } => cmd_list(manager, filter).await,
        Command::Add { title } => cmd_add(manager, &title.join(" ")).await,
        Command::Toggle { id } => {
            let Some(id) = resolve_task(manager, &id).await? else {
                return Ok(());
            };
            report_save(manager.toggle(&id).await?);
            if let Some(task) = manager.get(&id).await? {
                print_task(&task, false);
            }
            Ok(())
        }
        Command::Delete { id } => {
            let Some(id) = resolve_task(manager, &id).await? else {
                return Ok(());
            };
            report_save(manager.delete(&id).await?);
            println!("{} Deleted task {}", "✓".green(), short_id(&id).yellow());
            Ok(())
        }
        Command::ToggleSubtask { task_id, subtask_id } => cmd_toggle_subtask(manager, &task_id, &subtask_id).await,
        Command::Breakdown { ids } => {
            let service = create_text_service(&config.ai);
            cmd_breakdown(manager, service, &ids).await
        }
        Command::Quote => {
            let service = create_text_service(&config.ai);
            let quote = service.motivational_quote().await;
            println!("{}", format!("\u{201C}{}\u{201D}", quote).italic());
            Ok(())
        }
        Command::Stats => {
            let stats = manager.stats().await?;
            println!("All Tasks: {}", stats.total);
            println!("  Active:    {}", stats.active);
            println!("  Completed: {}", stats.completed);
            Ok(())
        }
    }
}

async fn cmd_list(manager: &StoreManager, filter: Filter) -> Result<()> {
    let tasks = manager.list(filter).await?;
    println!("{}", filter.label().bold());
    if tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }
    for task in &tasks {
        print_task(task, true);
    }
    Ok(())
}

async fn cmd_add(manager: &StoreManager, title: &str) -> Result<()> {
    let (task, warning) = manager.add(title).await?;
    report_save(warning);
    println!("{} Added task {}: {}", "✓".green(), short_id(&task.id).yellow(), task.title);
    Ok(())
}

async fn cmd_toggle_subtask(manager: &StoreManager, task_ref: &str, subtask_ref: &str) -> Result<()> {
    let Some(task_id) = resolve_task(manager, task_ref).await? else {
        return Ok(());
    };
    let Some(task) = manager.get(&task_id).await? else {
        return Ok(());
    };

    let subtask_id = match task.resolve_subtask(subtask_ref) {
        Ok(Some(id)) => id,
        Ok(None) => {
            println!("{} No subtask of {} matches '{}'", "!".yellow(), short_id(&task_id), subtask_ref);
            return Ok(());
        }
        Err(candidates) => return Err(ambiguous(subtask_ref, &candidates)),
    };

    report_save(manager.toggle_subtask(&task_id, &subtask_id).await?);
    if let Some(task) = manager.get(&task_id).await? {
        print_task(&task, true);
    }
    Ok(())
}

async fn cmd_breakdown(manager: &StoreManager, service: Arc<dyn TextService>, refs: &[String]) -> Result<()> {
    let mut ids = Vec::new();
    for reference in refs {
        // A full id and its short id name the same task
        if let Some(id) = resolve_task(manager, reference).await?
            && !ids.contains(&id)
        {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Ok(());
    }

    if service.is_live() {
        println!("{}", "Generating subtasks...".dimmed());
    }

    let outcomes =
        futures::future::join_all(ids.iter().map(|id| breakdown(manager, service.as_ref(), id))).await;

    for (id, outcome) in ids.iter().zip(outcomes) {
        match outcome? {
            BreakdownOutcome::Generated { task, warning } => {
                report_save(warning);
                print_task(&task, true);
            }
            BreakdownOutcome::AlreadyBrokenDown(task) => {
                println!("{}", "Already broken down:".dimmed());
                print_task(&task, true);
            }
            BreakdownOutcome::TaskRemoved | BreakdownOutcome::NotFound => {
                println!("{} Task {} no longer exists", "!".yellow(), short_id(id));
            }
        }
    }
    Ok(())
}

/// Resolve a user-supplied reference; unmatched references are reported, not errors
async fn resolve_task(manager: &StoreManager, reference: &str) -> Result<Option<String>> {
    match manager.resolve(reference).await? {
        Ok(Some(id)) => Ok(Some(id)),
        Ok(None) => {
            println!("{} No task matches '{}'", "!".yellow(), reference);
            Ok(None)
        }
        Err(candidates) => Err(ambiguous(reference, &candidates)),
    }
}

fn ambiguous(reference: &str, candidates: &[String]) -> eyre::Report {
    let shown: Vec<&str> = candidates.iter().map(|c| short_id(c)).collect();
    eyre!("'{}' is ambiguous, matches: {}", reference, shown.join(", "))
}

fn report_save(warning: SaveWarning) {
    if let Some(e) = warning {
        eprintln!("{} Changes not saved: {}", "!".yellow(), e);
    }
}

fn print_task(task: &Task, with_subtasks: bool) {
    let mark = if task.completed { "✓".green() } else { "○".normal() };
    let title = if task.completed {
        task.title.dimmed().strikethrough()
    } else {
        task.title.normal()
    };
    let priority = match task.priority {
        Priority::High => task.priority.to_string().red(),
        Priority::Medium => task.priority.to_string().yellow(),
        Priority::Low => task.priority.to_string().dimmed(),
    };

    let mut line = format!(
        "{} {} {} [{}] {}",
        mark,
        short_id(&task.id).yellow(),
        title,
        priority,
        task.category.cyan()
    );
    let (done, total) = task.subtask_progress();
    if total > 0 {
        line.push_str(&format!(" {}", format!("{}/{} subtasks", done, total).dimmed()));
    }
    println!("{}", line);

    if with_subtasks {
        for sub in &task.subtasks {
            let mark = if sub.completed { "✓".green() } else { "·".dimmed() };
            println!("    {} {} {}", mark, short_id(&sub.id).dimmed(), sub.title);
        }
    }
}
