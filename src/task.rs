//! Task records and the task store.
//!
//! Tasks live in a single slot as a JSON array. Every load runs a repair
//! pass over the raw records before they are typed:
//!
//! - a missing or falsy `id` gets a freshly generated one
//! - a non-string `id` is replaced by its string form
//! - an `id` already used by an earlier record is replaced
//! - the legacy `"todo"` status becomes `"pending"`
//! - a `null` title, description or status is dropped so the default applies
//! - a priority is matched without regard to case; one that matches no
//!   level is moved to `priority_raw` and the task has no priority
//!
//! When anything was repaired the collection is written back, so each
//! malformed record is fixed once.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::storage::{KeyValueStore, SlotGuard};

/// Category of a task that has none
pub const DEFAULT_CATEGORY: &str = "Umum";

/// Calendar format of task deadlines
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

const LEGACY_TODO_STATUS: &str = "todo";

/// Field that keeps a stored priority no level matched
pub const RAW_PRIORITY_FIELD: &str = "priority_raw";

const DEFAULTED_WHEN_NULL: [&str; 3] = ["title", "description", "status"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Sort weight; higher sorts first
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown priority '{trimmed}' (expected Low|Medium|High)"
                ))
            })
    }
}

/// Completion state of a task
///
/// `"todo"` is accepted on read as a legacy spelling of `pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    #[serde(alias = "todo")]
    Pending,
    Done,
}

impl TaskStatus {
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Pending => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored task record
///
/// Optional fields stay optional here; defaults are applied by the view
/// pipeline. Unknown fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Deadline as a calendar date; empty or unparseable deadlines are `None`
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        let raw = self.deadline.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        NaiveDate::parse_from_str(raw, DEADLINE_FORMAT).ok()
    }

    /// Progress clamped to `[0, 100]`
    pub fn progress_percent(&self) -> Option<f64> {
        self.progress
            .filter(|value| !value.is_nan())
            .map(|value| value.clamp(0.0, 100.0))
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub progress: Option<f64>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Build the pending task, filling in the category and priority defaults
    pub fn into_task(self, id: String) -> Result<Task> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::EmptyTitle);
        }
        if let Some(progress) = self.progress {
            if !progress.is_finite() {
                return Err(Error::InvalidArgument(format!(
                    "progress must be a finite number, got {progress}"
                )));
            }
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        Ok(Task {
            id,
            title: title.to_string(),
            description: self.description,
            category: Some(category),
            deadline: self
                .deadline
                .map(|date| date.format(DEADLINE_FORMAT).to_string()),
            priority: Some(self.priority.unwrap_or_default()),
            status: TaskStatus::Pending,
            progress: self.progress,
            extra: Map::new(),
        })
    }
}

/// What the load repair pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Records that had no usable id and got a generated one
    pub assigned: usize,
    /// Records whose id was converted to a string
    pub coerced: usize,
    /// Records whose id collided with an earlier record
    pub deduplicated: usize,
    /// Records whose legacy `"todo"` status became `"pending"`
    pub normalized_status: usize,
    /// Records with a `null` field reset to its default
    pub defaulted: usize,
    /// Records whose priority was respelled or set aside
    pub normalized_priority: usize,
}

impl RepairReport {
    pub fn changed(&self) -> bool {
        self.assigned
            + self.coerced
            + self.deduplicated
            + self.normalized_status
            + self.defaulted
            + self.normalized_priority
            > 0
    }
}

/// Repair raw task records in place
///
/// Non-object entries are left alone; typing them fails afterwards.
pub fn repair_records(records: &mut [Value], ids: &dyn IdGenerator) -> RepairReport {
    let mut report = RepairReport::default();

    let mut taken: HashSet<String> = records
        .iter()
        .filter_map(|record| record.get("id").and_then(Value::as_str))
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());

    for record in records.iter_mut() {
        let Some(fields) = record.as_object_mut() else {
            continue;
        };

        let original = fields.get("id");
        let mut id = match original {
            None => None,
            Some(value) if is_falsy(value) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                report.coerced += 1;
                Some(coerce_id(other))
            }
        };

        match &id {
            None => report.assigned += 1,
            Some(existing) if seen.contains(existing) => {
                report.deduplicated += 1;
                id = None;
            }
            Some(_) => {}
        }

        let id = id.unwrap_or_else(|| fresh_id(ids, &mut taken));
        let unchanged = matches!(original, Some(Value::String(s)) if *s == id);
        if !unchanged {
            tracing::debug!(id = %id, "repaired task id");
            fields.insert("id".to_string(), Value::String(id.clone()));
        }
        taken.insert(id.clone());
        seen.insert(id);

        if fields.get("status").and_then(Value::as_str) == Some(LEGACY_TODO_STATUS) {
            fields.insert(
                "status".to_string(),
                Value::String(TaskStatus::Pending.as_str().to_string()),
            );
            report.normalized_status += 1;
        }

        let before = fields.len();
        fields.retain(|name, value| {
            !(value.is_null() && DEFAULTED_WHEN_NULL.contains(&name.as_str()))
        });
        if fields.len() != before {
            report.defaulted += 1;
        }

        if normalize_priority(fields) {
            report.normalized_priority += 1;
        }
    }

    report
}

/// Respell a stored priority as its level, or move it to `priority_raw`
fn normalize_priority(fields: &mut Map<String, Value>) -> bool {
    let level = match fields.get("priority") {
        None | Some(Value::Null) => return false,
        Some(Value::String(raw)) => raw.parse::<Priority>().ok(),
        Some(_) => None,
    };
    match level {
        Some(level) if fields.get("priority").and_then(Value::as_str) == Some(level.as_str()) => {
            false
        }
        Some(level) => {
            fields.insert("priority".to_string(), Value::String(level.as_str().to_string()));
            true
        }
        None => {
            if let Some(raw) = fields.remove("priority") {
                tracing::debug!(priority = %raw, "unknown task priority set aside");
                fields.insert(RAW_PRIORITY_FIELD.to_string(), raw);
            }
            true
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn coerce_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn fresh_id(ids: &dyn IdGenerator, taken: &mut HashSet<String>) -> String {
    loop {
        let candidate = ids.generate();
        if !candidate.is_empty() && taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// Persisted task collection
///
/// `load`, `save` and `clear` never fail: errors are logged and the call
/// degrades (empty load, dropped write). The `try_*` variants report them.
#[derive(Clone)]
pub struct TaskStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    ids: Arc<dyn IdGenerator>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore").field("key", &self.key).finish()
    }
}

impl TaskStore {
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            kv,
            key: key.into(),
            ids,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Read and repair the collection, writing repairs back
    ///
    /// A failed write-back is logged; the repaired tasks are still returned.
    pub fn try_load(&self) -> Result<Vec<Task>> {
        let Some(raw) = self.kv.get(&self.key)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut records: Vec<Value> = serde_json::from_str(&raw)?;
        let report = repair_records(&mut records, self.ids.as_ref());
        let tasks: Vec<Task> = serde_json::from_value(Value::Array(records))?;

        if report.changed() {
            tracing::debug!(key = %self.key, ?report, "writing back repaired tasks");
            self.save(&tasks);
        }

        Ok(tasks)
    }

    /// Load tasks, or an empty list if the slot cannot be read
    pub fn load(&self) -> Vec<Task> {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!(key = %self.key, error = %err, "failed to load tasks");
            Vec::new()
        })
    }

    pub fn try_save(&self, tasks: &[Task]) -> Result<()> {
        let json = serde_json::to_string_pretty(tasks)?;
        self.kv.set(&self.key, &json)
    }

    /// Replace the persisted collection; failures are logged and dropped
    pub fn save(&self, tasks: &[Task]) {
        if let Err(err) = self.try_save(tasks) {
            tracing::warn!(key = %self.key, count = tasks.len(), error = %err, "failed to save tasks");
        }
    }

    pub fn try_clear(&self) -> Result<()> {
        self.kv.remove(&self.key)
    }

    /// Remove the slot entirely; failures are logged and dropped
    pub fn clear(&self) {
        if let Err(err) = self.try_clear() {
            tracing::warn!(key = %self.key, error = %err, "failed to clear tasks");
        }
    }

    /// Exclusive lock for a read-modify-write cycle on this slot
    pub fn lock(&self) -> Result<SlotGuard<'_>> {
        self.kv.lock(&self.key)
    }
}
