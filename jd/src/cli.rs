//! CLI argument parsing for jd

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskstore::Filter;

#[derive(Parser, Debug)]
#[command(name = "jd")]
#[command(author, version, about = "Just do it - tasks, subtasks and a daily nudge", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Directory holding the task list (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show tasks
    #[command(alias = "ls")]
    List {
        /// Which tasks to show: all, active, completed
        #[arg(short, long, default_value = "all")]
        filter: Filter,
    },

    /// Add a task
    Add {
        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },

    /// Mark a task done, or not done
    Toggle {
        /// Task ID (full, prefix, or short id)
        #[arg(required = true)]
        id: String,
    },

    /// Delete a task and its subtasks
    #[command(alias = "rm")]
    Delete {
        /// Task ID (full, prefix, or short id)
        #[arg(required = true)]
        id: String,
    },

    /// Mark a subtask done, or not done
    ToggleSubtask {
        /// Task ID (full, prefix, or short id)
        #[arg(required = true)]
        task_id: String,

        /// Subtask ID (full, prefix, or short id)
        #[arg(required = true)]
        subtask_id: String,
    },

    /// Break tasks into subtasks with AI
    Breakdown {
        /// Task IDs (full, prefix, or short id)
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// Print a motivational quote
    Quote,

    /// Show task counts
    Stats,
}
