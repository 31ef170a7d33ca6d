//! In-memory session snapshot.
//!
//! A `Session` owns the loaded tasks, categories and the current filter
//! selections. After every lifecycle operation it reloads from the stores,
//! so its snapshot tracks what is persisted.

use chrono::NaiveDate;

use crate::category::Category;
use crate::error::Result;
use crate::ops::{Confirm, Outcome, TaskOps};
use crate::task::{NewTask, Task};
use crate::view::{self, CategoryFilter, Filters, PriorityFilter, StatusFilter, TaskView};

#[derive(Debug)]
pub struct Session {
    ops: TaskOps,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    filters: Filters,
}

impl Session {
    /// Load tasks and categories; filters start at `all`
    pub fn open(ops: TaskOps) -> Self {
        let tasks = ops.tasks().load();
        let categories = ops.categories().load();
        tracing::debug!(tasks = tasks.len(), categories = categories.len(), "session opened");
        Self {
            ops,
            tasks,
            categories,
            filters: Filters::default(),
        }
    }

    pub fn ops(&self) -> &TaskOps {
        &self.ops
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filters.status = status;
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.filters.category = category;
    }

    pub fn set_priority_filter(&mut self, priority: PriorityFilter) {
        self.filters.priority = priority;
    }

    /// Derive the grouped view of the snapshot as of `today`
    pub fn view(&self, today: NaiveDate) -> TaskView<'_> {
        view::derive(&self.tasks, &self.categories, &self.filters, today)
    }

    /// Display color of a category key, with the configured fallback
    pub fn color_of(&self, key: &str) -> &str {
        crate::category::color_of(key, &self.categories).unwrap_or(self.ops.fallback_color())
    }

    pub fn reload(&mut self) {
        self.tasks = self.ops.tasks().load();
        self.categories = self.ops.categories().load();
    }

    pub fn create(&mut self, input: NewTask) -> Result<Outcome> {
        let outcome = self.ops.create(input)?;
        self.reload();
        Ok(outcome)
    }

    pub fn toggle(&mut self, id: &str) -> Result<Outcome> {
        let outcome = self.ops.toggle(id)?;
        if outcome.changed() {
            self.reload();
        }
        Ok(outcome)
    }

    pub fn delete(&mut self, id: &str, confirm: &mut dyn Confirm) -> Outcome {
        self.after(|ops| ops.delete(id, confirm))
    }

    pub fn delete_completed(&mut self, confirm: &mut dyn Confirm) -> Outcome {
        self.after(|ops| ops.delete_completed(confirm))
    }

    pub fn delete_all(&mut self, confirm: &mut dyn Confirm) -> Outcome {
        self.after(|ops| ops.delete_all(confirm))
    }

    /// Add a category and select it as the category filter
    pub fn add_category(&mut self, key: &str, color: Option<&str>) -> Result<Outcome> {
        let outcome = self.ops.add_category(key, color)?;
        if let Outcome::CategoryAdded { category } = &outcome {
            self.filters.category = CategoryFilter::Only(category.key.clone());
        }
        self.reload();
        Ok(outcome)
    }

    fn after(&mut self, op: impl FnOnce(&TaskOps) -> Outcome) -> Outcome {
        let outcome = op(&self.ops);
        if outcome.changed() {
            self.reload();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::id::SequentialIds;
    use crate::ops::AssumeYes;
    use crate::storage::MemoryStore;
    use crate::task::{Priority, TaskStatus};
    use std::sync::Arc;

    fn session() -> Session {
        let kv = Arc::new(MemoryStore::new());
        let ops = TaskOps::from_config(kv, &Config::default(), Arc::new(SequentialIds::new("t")));
        Session::open(ops)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_store_opens_empty() {
        let session = session();
        assert!(session.tasks().is_empty());
        assert!(session.categories().is_empty());
        let view = session.view(date("2025-06-10"));
        assert!(view.sections.is_empty());
        assert_eq!(view.summary.total_count, 0);
    }

    #[test]
    fn snapshot_follows_operations() {
        let mut session = session();
        let mut input = NewTask::new("Ship");
        input.priority = Some(Priority::High);
        session.create(input).unwrap();
        session.create(NewTask::new("Read")).unwrap();
        assert_eq!(session.tasks().len(), 2);

        session.toggle("t-1").unwrap();
        assert_eq!(session.tasks()[0].status, TaskStatus::Done);

        session.set_status_filter(StatusFilter::Todo);
        let view = session.view(date("2025-06-10"));
        assert_eq!(view.shown_count(), 1);
        assert_eq!(view.summary.done_count, 1);

        assert_eq!(session.delete_completed(&mut AssumeYes), Outcome::Deleted { count: 1 });
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn adding_category_selects_it() {
        let mut session = session();
        session.add_category("Mobile", None).unwrap();
        assert_eq!(
            session.filters().category,
            CategoryFilter::Only("Mobile".to_string())
        );
        assert_eq!(session.categories().len(), 1);
        assert_eq!(session.color_of("Mobile"), "#2563eb");
        assert_eq!(session.color_of("Nope"), "#64748b");
    }

    #[test]
    fn rejected_category_keeps_filter() {
        let mut session = session();
        session.add_category("Mobile", None).unwrap();
        session.set_category_filter(CategoryFilter::All);
        assert!(session.add_category("MOBILE", None).is_err());
        assert_eq!(session.filters().category, CategoryFilter::All);
    }
}
