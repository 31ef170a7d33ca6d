//! taskmate - personal task tracking library
//!
//! Tasks and categories are persisted as JSON documents in a key-value
//! medium and rendered through a pure filter/sort/group pipeline.
//!
//! # Core Concepts
//!
//! - **Tasks**: titled records with a category, deadline, priority and status
//! - **Categories**: user-defined keys with a display color
//! - **Slots**: one JSON document per collection, repaired on load
//! - **View**: filtered, sorted sections grouped by category, plus counts
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `taskmate.toml`
//! - `error`: Error types and result aliases
//! - `storage`: Key-value slot media (directory and in-memory)
//! - `lock`: File locking and atomic writes
//! - `id`: Task id generation
//! - `task`: Task model, load repair and the task store
//! - `category`: Category model, color palette and the category store
//! - `view`: Filter, sort, group and summary derivation
//! - `ops`: Task lifecycle operations and confirmation
//! - `session`: In-memory snapshot kept in step with the stores
//! - `output`: Human and JSON output for CLI commands

pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod id;
pub mod lock;
pub mod ops;
pub mod output;
pub mod session;
pub mod storage;
pub mod task;
pub mod view;

pub use error::{Error, Result};
