//! Command-line interface for taskmate
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live in `task`, category commands in `category`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::error::Result;
use crate::id::UuidGenerator;
use crate::ops::{AssumeYes, Confirm, TaskOps};
use crate::output::OutputOptions;
use crate::session::Session;
use crate::storage::FileStore;

mod category;
mod confirm;
mod task;

pub use confirm::TerminalConfirm;

/// taskmate - personal task tracking
///
/// Tasks and categories are kept as JSON documents in a data directory.
#[derive(Parser, Debug)]
#[command(name = "taskmate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data directory)
    #[arg(long, global = true, env = "TASKMATE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data dir>/taskmate.toml)
    #[arg(long, global = true, env = "TASKMATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show tasks grouped by category
    List {
        /// Status filter: all, todo, done
        #[arg(long, default_value = "all")]
        status: String,

        /// Category key to show (exact match), or "all"
        #[arg(long, default_value = "all")]
        category: String,

        /// Priority filter: all, low, medium, high
        #[arg(long, default_value = "all")]
        priority: String,
    },

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Category key (defaults to "Umum")
        #[arg(short, long)]
        category: Option<String>,

        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,

        /// Priority: low, medium, high
        #[arg(short, long)]
        priority: Option<String>,

        /// Progress percentage
        #[arg(long)]
        progress: Option<f64>,
    },

    /// Flip a task between pending and done
    Toggle {
        /// Task id
        id: String,
    },

    /// Delete a task
    Rm {
        /// Task id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every completed task
    ClearDone {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete all tasks
    ClearAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Show done, total and overdue counts
    Summary,
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category key
        key: String,

        /// Display color, e.g. "#38bdf8" (defaults to the next palette color)
        #[arg(long)]
        color: Option<String>,
    },

    /// List categories
    List,
}

/// Loaded state shared by every command
pub(crate) struct Context {
    pub session: Session,
    pub output: OutputOptions,
}

impl Context {
    fn open(data_dir: Option<&Path>, config_path: Option<&Path>, output: OutputOptions) -> Result<Self> {
        let data_dir = config::resolve_data_dir(data_dir);
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::load_or_default(&data_dir),
        };
        tracing::debug!(data_dir = %data_dir.display(), "opening task store");

        let store = FileStore::new(data_dir).with_lock_timeout(config.storage.lock_timeout_ms);
        let ops = TaskOps::from_config(Arc::new(store), &config, Arc::new(UuidGenerator));
        Ok(Self {
            session: Session::open(ops),
            output,
        })
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm::stdin())
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let mut ctx = Context::open(self.data_dir.as_deref(), self.config.as_deref(), output)?;

        match self.command {
            Commands::List { status, category, priority } => task::run_list(
                &mut ctx,
                task::ListOptions {
                    status,
                    category,
                    priority,
                },
            ),
            Commands::Add { title, description, category, deadline, priority, progress } => {
                task::run_add(
                    &mut ctx,
                    task::AddOptions {
                        title,
                        description,
                        category,
                        deadline,
                        priority,
                        progress,
                    },
                )
            }
            Commands::Toggle { id } => task::run_toggle(&mut ctx, &id),
            Commands::Rm { id, yes } => task::run_remove(&mut ctx, &id, &mut *confirmer(yes)),
            Commands::ClearDone { yes } => task::run_clear_done(&mut ctx, &mut *confirmer(yes)),
            Commands::ClearAll { yes } => task::run_clear_all(&mut ctx, &mut *confirmer(yes)),
            Commands::Category(cmd) => match cmd {
                CategoryCommands::Add { key, color } => {
                    category::run_add(&mut ctx, &key, color.as_deref())
                }
                CategoryCommands::List => category::run_list(&ctx),
            },
            Commands::Summary => task::run_summary(&ctx),
        }
    }
}
