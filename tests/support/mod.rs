#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const TASKS_KEY: &str = "TASKMATE_TASKS";
pub const CATEGORIES_KEY: &str = "TASKMATE_CATEGORIES";

/// Temporary data directory for one test
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(format!("{key}.json"))
    }

    pub fn write_slot(&self, key: &str, contents: &str) -> std::io::Result<()> {
        fs::write(self.slot_path(key), contents)
    }

    pub fn read_slot(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(key)).ok()
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join("taskmate.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `taskmate` bound to this data directory, isolated from the caller's env
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("taskmate").expect("binary");
        cmd.env("TASKMATE_DATA_DIR", self.dir.path())
            .env_remove("TASKMATE_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Parse the JSON envelope printed by a `--json` command
pub fn envelope(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("json envelope")
}
