//! Task lifecycle operations.
//!
//! Each operation is a full read-modify-write of one slot. The cycle runs
//! under the slot lock, so two operations cannot interleave their load and
//! save. If the lock cannot be taken the operation logs and runs unlocked.
//!
//! Create and toggle read the slot strictly under the lock. A slot that is
//! present but unreadable aborts them with [`Error::UnreadableSlot`] and
//! nothing is written over it.
//!
//! Destructive operations ask a [`Confirm`] implementation first. The
//! question is asked before the lock is taken and the change is computed
//! against a fresh load afterwards.

use std::sync::Arc;

use serde::Serialize;

use crate::category::{self, Category, CategoryStore, FALLBACK_COLOR};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::id::IdGenerator;
use crate::storage::{KeyValueStore, SlotGuard};
use crate::task::{NewTask, Task, TaskStatus, TaskStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmStyle {
    /// Dismisses the question
    Cancel,
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmOption {
    pub label: String,
    pub style: ConfirmStyle,
}

impl ConfirmOption {
    pub fn new(label: impl Into<String>, style: ConfirmStyle) -> Self {
        Self {
            label: label.into(),
            style,
        }
    }

    fn accepts(&self) -> bool {
        self.style != ConfirmStyle::Cancel
    }
}

/// Asks the user to pick one of `options`
///
/// Returns the chosen index, or `None` when the question was dismissed.
pub trait Confirm {
    fn confirm(&mut self, title: &str, message: &str, options: &[ConfirmOption]) -> Option<usize>;
}

/// Picks the first accepting option without asking
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _title: &str, _message: &str, options: &[ConfirmOption]) -> Option<usize> {
        options.iter().position(ConfirmOption::accepts)
    }
}

/// Dismisses every question
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeNo;

impl Confirm for AssumeNo {
    fn confirm(&mut self, _title: &str, _message: &str, _options: &[ConfirmOption]) -> Option<usize> {
        None
    }
}

/// Result of a lifecycle operation, including the informational no-ops
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { task: Task },
    Toggled { id: String, status: TaskStatus },
    Deleted { count: usize },
    Cleared { count: usize },
    CategoryAdded { category: Category },
    /// No task is done
    NothingToDelete,
    /// The collection was already empty
    AlreadyEmpty,
    NotFound { id: String },
    /// The confirmation was dismissed
    Cancelled,
}

impl Outcome {
    /// Whether persisted state was changed
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Outcome::Created { .. }
                | Outcome::Toggled { .. }
                | Outcome::Deleted { .. }
                | Outcome::Cleared { .. }
                | Outcome::CategoryAdded { .. }
        )
    }

    /// Message for the user
    pub fn message(&self) -> String {
        match self {
            Outcome::Created { task } => format!("Task added: {}", task.title),
            Outcome::Toggled { id, status } => format!("Task {id} is now {status}"),
            Outcome::Deleted { count: 1 } => "Deleted 1 task".to_string(),
            Outcome::Deleted { count } => format!("Deleted {count} tasks"),
            Outcome::Cleared { count } => format!("Cleared all tasks ({count})"),
            Outcome::CategoryAdded { category } => {
                format!("Category added: {} ({})", category.key, category.color)
            }
            Outcome::NothingToDelete => "No completed tasks to delete".to_string(),
            Outcome::AlreadyEmpty => "Task list is empty".to_string(),
            Outcome::NotFound { id } => format!("No task with id {id}"),
            Outcome::Cancelled => "Cancelled".to_string(),
        }
    }
}

/// Lifecycle operations over the task and category stores
#[derive(Debug, Clone)]
pub struct TaskOps {
    tasks: TaskStore,
    categories: CategoryStore,
    palette: Vec<String>,
    fallback_color: String,
}

impl TaskOps {
    pub fn new(tasks: TaskStore, categories: CategoryStore) -> Self {
        Self {
            tasks,
            categories,
            palette: category::COLOR_PALETTE
                .iter()
                .map(|color| color.to_string())
                .collect(),
            fallback_color: FALLBACK_COLOR.to_string(),
        }
    }

    /// Stores on `kv` with slot keys and palette from `config`
    pub fn from_config(
        kv: Arc<dyn KeyValueStore>,
        config: &Config,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let tasks = TaskStore::new(kv.clone(), config.storage.tasks_key.clone(), ids);
        let categories = CategoryStore::new(kv, config.storage.categories_key.clone());
        Self::new(tasks, categories).with_palette(
            config.categories.palette.clone(),
            config.categories.fallback_color.clone(),
        )
    }

    pub fn with_palette(mut self, palette: Vec<String>, fallback_color: String) -> Self {
        self.palette = palette;
        self.fallback_color = fallback_color;
        self
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn categories(&self) -> &CategoryStore {
        &self.categories
    }

    pub fn fallback_color(&self) -> &str {
        &self.fallback_color
    }

    /// Append a new pending task
    pub fn create(&self, input: NewTask) -> Result<Outcome> {
        let task = input.into_task(self.tasks.ids().generate())?;

        let _guard = hold(self.tasks.key(), self.tasks.lock());
        let mut tasks = self.load_locked()?;
        tasks.push(task.clone());
        self.tasks.save(&tasks);

        tracing::debug!(id = %task.id, "task created");
        Ok(Outcome::Created { task })
    }

    /// Flip one task between pending and done
    pub fn toggle(&self, id: &str) -> Result<Outcome> {
        let _guard = hold(self.tasks.key(), self.tasks.lock());
        let mut tasks = self.load_locked()?;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            return Ok(Outcome::NotFound { id: id.to_string() });
        };
        task.status = task.status.toggled();
        let status = task.status;
        self.tasks.save(&tasks);

        Ok(Outcome::Toggled {
            id: id.to_string(),
            status,
        })
    }

    /// Delete one task after confirmation
    pub fn delete(&self, id: &str, confirm: &mut dyn Confirm) -> Outcome {
        if !self.tasks.load().iter().any(|task| task.id == id) {
            return Outcome::NotFound { id: id.to_string() };
        }
        let options = [
            ConfirmOption::new("Cancel", ConfirmStyle::Cancel),
            ConfirmOption::new("Delete", ConfirmStyle::Default),
        ];
        if !accepted(confirm, "Confirm", "Delete this task?", &options) {
            return Outcome::Cancelled;
        }

        let _guard = hold(self.tasks.key(), self.tasks.lock());
        let mut tasks = self.tasks.load();
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Outcome::NotFound { id: id.to_string() };
        }
        self.tasks.save(&tasks);

        Outcome::Deleted {
            count: before - tasks.len(),
        }
    }

    /// Delete every done task after confirmation
    pub fn delete_completed(&self, confirm: &mut dyn Confirm) -> Outcome {
        let done = self.tasks.load().iter().filter(|task| task.is_done()).count();
        if done == 0 {
            return Outcome::NothingToDelete;
        }
        let options = [
            ConfirmOption::new("Cancel", ConfirmStyle::Cancel),
            ConfirmOption::new("Delete", ConfirmStyle::Destructive),
        ];
        let message = format!("Delete {done} completed task(s)?");
        if !accepted(confirm, "Delete completed tasks", &message, &options) {
            return Outcome::Cancelled;
        }

        let _guard = hold(self.tasks.key(), self.tasks.lock());
        let mut tasks = self.tasks.load();
        let before = tasks.len();
        tasks.retain(|task| !task.is_done());
        let removed = before - tasks.len();
        if removed == 0 {
            return Outcome::NothingToDelete;
        }
        self.tasks.save(&tasks);

        Outcome::Deleted { count: removed }
    }

    /// Remove the whole collection after confirmation
    pub fn delete_all(&self, confirm: &mut dyn Confirm) -> Outcome {
        if self.tasks.load().is_empty() {
            return Outcome::AlreadyEmpty;
        }
        let options = [
            ConfirmOption::new("Cancel", ConfirmStyle::Cancel),
            ConfirmOption::new("Yes", ConfirmStyle::Destructive),
        ];
        if !accepted(confirm, "Confirm", "Delete all tasks?", &options) {
            return Outcome::Cancelled;
        }

        let _guard = hold(self.tasks.key(), self.tasks.lock());
        let count = self.tasks.load().len();
        if count == 0 {
            return Outcome::AlreadyEmpty;
        }
        self.tasks.clear();

        Outcome::Cleared { count }
    }

    /// Append a category unless its key exists in any letter case
    ///
    /// Without a color the next palette entry is used, rotating by the
    /// number of existing categories.
    pub fn add_category(&self, key: &str, color: Option<&str>) -> Result<Outcome> {
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::EmptyCategoryKey);
        }

        let _guard = hold(self.categories.key(), self.categories.lock());
        let mut categories = self.categories.load();
        if let Some(existing) = categories.iter().find(|category| category.same_key(key)) {
            return Err(Error::DuplicateCategory(existing.key.clone()));
        }

        let color = color
            .map(str::trim)
            .filter(|color| !color.is_empty())
            .or_else(|| category::pick_color(&self.palette, categories.len()))
            .unwrap_or(self.fallback_color.as_str())
            .to_string();
        let category = Category::new(key, color);
        categories.push(category.clone());
        self.categories.save(&categories);

        Ok(Outcome::CategoryAdded { category })
    }

    /// Strict load for a cycle that saves the whole collection afterwards
    fn load_locked(&self) -> Result<Vec<Task>> {
        self.tasks.try_load().map_err(|err| {
            tracing::warn!(key = %self.tasks.key(), error = %err, "tasks unreadable, not writing");
            Error::UnreadableSlot {
                key: self.tasks.key().to_string(),
                reason: err.to_string(),
            }
        })
    }
}

fn accepted(
    confirm: &mut dyn Confirm,
    title: &str,
    message: &str,
    options: &[ConfirmOption],
) -> bool {
    confirm
        .confirm(title, message, options)
        .and_then(|index| options.get(index))
        .is_some_and(ConfirmOption::accepts)
}

fn hold<'a>(slot: &str, lock: Result<SlotGuard<'a>>) -> Option<SlotGuard<'a>> {
    match lock {
        Ok(guard) => Some(guard),
        Err(err) => {
            tracing::warn!(slot, error = %err, "running without slot lock");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SequentialIds;
    use crate::storage::MemoryStore;

    fn ops() -> (Arc<MemoryStore>, TaskOps) {
        let kv = Arc::new(MemoryStore::new());
        let ops = TaskOps::from_config(
            kv.clone(),
            &Config::default(),
            Arc::new(SequentialIds::new("t")),
        );
        (kv, ops)
    }

    /// Records what it was asked and answers with a fixed index
    struct Scripted {
        answer: Option<usize>,
        asked: Vec<(String, String, usize)>,
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, title: &str, message: &str, options: &[ConfirmOption]) -> Option<usize> {
            self.asked
                .push((title.to_string(), message.to_string(), options.len()));
            self.answer
        }
    }

    #[test]
    fn create_on_empty_store() {
        let (_kv, ops) = ops();
        let outcome = ops.create(NewTask::new("X")).unwrap();
        assert!(outcome.changed());

        let tasks = ops.tasks().load();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "t-1");
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[0].category.as_deref(), Some("Umum"));
        assert_eq!(tasks[0].priority, Some(crate::task::Priority::Low));
    }

    #[test]
    fn create_rejects_empty_title_without_writing() {
        let (kv, ops) = ops();
        let err = ops.create(NewTask::new("  ")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(kv.raw("TASKMATE_TASKS"), None);
    }

    #[test]
    fn toggle_flips_only_matching_task() {
        let (_kv, ops) = ops();
        ops.create(NewTask::new("a")).unwrap();
        ops.create(NewTask::new("b")).unwrap();

        assert_eq!(
            ops.toggle("t-2").unwrap(),
            Outcome::Toggled {
                id: "t-2".to_string(),
                status: TaskStatus::Done
            }
        );
        let tasks = ops.tasks().load();
        assert_eq!(tasks[0].status, TaskStatus::Pending);
        assert_eq!(tasks[1].status, TaskStatus::Done);

        ops.toggle("t-2").unwrap();
        assert_eq!(ops.tasks().load()[1].status, TaskStatus::Pending);
        assert_eq!(
            ops.toggle("nope").unwrap(),
            Outcome::NotFound {
                id: "nope".to_string()
            }
        );
    }

    #[test]
    fn delete_asks_then_removes() {
        let (_kv, ops) = ops();
        ops.create(NewTask::new("a")).unwrap();
        ops.create(NewTask::new("b")).unwrap();

        let mut decline = Scripted { answer: Some(0), asked: Vec::new() };
        assert_eq!(ops.delete("t-1", &mut decline), Outcome::Cancelled);
        assert_eq!(decline.asked.len(), 1);
        assert_eq!(ops.tasks().load().len(), 2);

        assert_eq!(ops.delete("t-1", &mut AssumeYes), Outcome::Deleted { count: 1 });
        let remaining = ops.tasks().load();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "t-2");
    }

    #[test]
    fn delete_unknown_id_does_not_ask() {
        let (_kv, ops) = ops();
        let mut script = Scripted { answer: Some(1), asked: Vec::new() };
        assert!(matches!(ops.delete("ghost", &mut script), Outcome::NotFound { .. }));
        assert!(script.asked.is_empty());
    }

    #[test]
    fn delete_completed_without_done_tasks_is_noop() {
        let (kv, ops) = ops();
        ops.create(NewTask::new("a")).unwrap();
        let before = kv.raw("TASKMATE_TASKS");

        let mut script = Scripted { answer: Some(1), asked: Vec::new() };
        assert_eq!(ops.delete_completed(&mut script), Outcome::NothingToDelete);
        assert!(script.asked.is_empty());
        assert_eq!(kv.raw("TASKMATE_TASKS"), before);
    }

    #[test]
    fn delete_completed_removes_done_tasks() {
        let (_kv, ops) = ops();
        for title in ["a", "b", "c"] {
            ops.create(NewTask::new(title)).unwrap();
        }
        ops.toggle("t-1").unwrap();
        ops.toggle("t-3").unwrap();

        let mut script = Scripted { answer: Some(1), asked: Vec::new() };
        assert_eq!(ops.delete_completed(&mut script), Outcome::Deleted { count: 2 });
        assert_eq!(script.asked[0].1, "Delete 2 completed task(s)?");
        let ids: Vec<String> = ops.tasks().load().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t-2"]);
    }

    #[test]
    fn delete_all_clears_slot() {
        let (kv, ops) = ops();
        assert_eq!(ops.delete_all(&mut AssumeYes), Outcome::AlreadyEmpty);

        ops.create(NewTask::new("a")).unwrap();
        assert_eq!(ops.delete_all(&mut AssumeNo), Outcome::Cancelled);
        assert_eq!(ops.delete_all(&mut AssumeYes), Outcome::Cleared { count: 1 });
        assert_eq!(kv.raw("TASKMATE_TASKS"), None);
        assert!(ops.tasks().load().is_empty());
    }

    #[test]
    fn out_of_range_answer_counts_as_dismissed() {
        let (_kv, ops) = ops();
        ops.create(NewTask::new("a")).unwrap();
        let mut script = Scripted { answer: Some(9), asked: Vec::new() };
        assert_eq!(ops.delete_all(&mut script), Outcome::Cancelled);
    }

    #[test]
    fn add_category_rotates_palette() {
        let (_kv, ops) = ops();
        ops.add_category("Mobile", None).unwrap();
        ops.add_category("RPL", Some("#4ade80")).unwrap();
        let outcome = ops.add_category("IoT", None).unwrap();

        assert_eq!(
            outcome,
            Outcome::CategoryAdded {
                category: Category::new("IoT", "#f59e0b")
            }
        );
        let categories = ops.categories().load();
        assert_eq!(categories[0], Category::new("Mobile", "#2563eb"));
        assert_eq!(categories[1], Category::new("RPL", "#4ade80"));
    }

    #[test]
    fn add_category_rejects_case_insensitive_duplicate() {
        let (_kv, ops) = ops();
        ops.categories().save(&[Category::new("Mobile", "#38bdf8")]);

        let err = ops.add_category("mobile", None).unwrap_err();
        assert!(matches!(err, Error::DuplicateCategory(ref key) if key == "Mobile"));
        assert!(err.is_validation());
        assert_eq!(ops.categories().load(), vec![Category::new("Mobile", "#38bdf8")]);
    }

    #[test]
    fn add_category_rejects_blank_key() {
        let (_kv, ops) = ops();
        assert!(matches!(ops.add_category("  ", None), Err(Error::EmptyCategoryKey)));
    }

    #[test]
    fn failed_save_is_silent() {
        let (kv, ops) = ops();
        kv.fail_writes(true);

        // The operation reports success although nothing was persisted
        let outcome = ops.create(NewTask::new("lost")).unwrap();
        assert!(matches!(outcome, Outcome::Created { .. }));
        kv.fail_writes(false);
        assert!(ops.tasks().load().is_empty());
    }

    #[test]
    fn create_keeps_loosely_typed_records() {
        let seeds = [
            r#"[{"id":"a","title":"keep me","description":null,"status":"pending"}]"#,
            r#"[{"id":"a","title":"keep me","priority":"low","status":"pending"}]"#,
            r#"[{"id":"a","title":"keep me","status":null}]"#,
        ];
        for seed in seeds {
            let (kv, ops) = ops();
            kv.set("TASKMATE_TASKS", seed).unwrap();

            ops.create(NewTask::new("new")).unwrap();
            let titles: Vec<String> = ops.tasks().load().into_iter().map(|t| t.title).collect();
            assert_eq!(titles, vec!["keep me", "new"], "{seed}");
        }
    }

    #[test]
    fn unreadable_slot_blocks_create_and_toggle() {
        let (kv, ops) = ops();
        let seed = r#"[{"id":"a","title":"keep me","progress":"half"}]"#;
        kv.set("TASKMATE_TASKS", seed).unwrap();

        let err = ops.create(NewTask::new("new")).unwrap_err();
        assert!(matches!(err, Error::UnreadableSlot { ref key, .. } if key == "TASKMATE_TASKS"));
        assert!(!err.is_validation());
        assert!(matches!(ops.toggle("a"), Err(Error::UnreadableSlot { .. })));
        assert_eq!(kv.raw("TASKMATE_TASKS").as_deref(), Some(seed));
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(Outcome::NothingToDelete.message(), "No completed tasks to delete");
        assert_eq!(Outcome::AlreadyEmpty.message(), "Task list is empty");
        assert_eq!(Outcome::Deleted { count: 1 }.message(), "Deleted 1 task");
        assert_eq!(Outcome::Deleted { count: 3 }.message(), "Deleted 3 tasks");
        assert!(!Outcome::Cancelled.changed());
    }
}
