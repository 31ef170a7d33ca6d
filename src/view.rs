//! View pipeline: filter, sort and group tasks for display.
//!
//! Everything here is pure. Defaults for optional task fields are applied
//! once, in [`resolve`], and every later stage reads the resolved values.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::category::{self, Category};
use crate::error::{Error, Result};
use crate::task::{Priority, Task, DEFAULT_CATEGORY};

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Anything not done
    Todo,
    Done,
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "todo" => Ok(StatusFilter::Todo),
            "done" => Ok(StatusFilter::Done),
            other => Err(Error::InvalidArgument(format!(
                "unknown status filter '{other}' (expected all|todo|done)"
            ))),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusFilter::All => "all",
            StatusFilter::Todo => "todo",
            StatusFilter::Done => "done",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-sensitive category key
    Only(String),
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            ALL => Ok(CategoryFilter::All),
            "" => Err(Error::InvalidArgument(
                "category filter cannot be empty".to_string(),
            )),
            key => Ok(CategoryFilter::Only(key.to_string())),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL),
            CategoryFilter::Only(key) => f.write_str(key),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl FromStr for PriorityFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case(ALL) {
            return Ok(PriorityFilter::All);
        }
        Ok(PriorityFilter::Only(s.parse()?))
    }
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => f.write_str(ALL),
            PriorityFilter::Only(priority) => write!(f, "{priority}"),
        }
    }
}

/// The three independent filter selections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub priority: PriorityFilter,
}

impl Filters {
    pub fn matches(&self, task: &ResolvedTask<'_>) -> bool {
        let by_status = match self.status {
            StatusFilter::All => true,
            StatusFilter::Todo => !task.task.is_done(),
            StatusFilter::Done => task.task.is_done(),
        };
        let by_category = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(key) => task.category == key.as_str(),
        };
        let by_priority = match self.priority {
            PriorityFilter::All => true,
            PriorityFilter::Only(priority) => task.priority == priority,
        };
        by_status && by_category && by_priority
    }
}

/// A task with its optional fields resolved to display values
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTask<'a> {
    pub task: &'a Task,
    pub category: &'a str,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
}

/// Apply defaults: blank category is `"Umum"`, missing priority is `Low`
pub fn resolve(task: &Task) -> ResolvedTask<'_> {
    let category = task
        .category
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .unwrap_or(DEFAULT_CATEGORY);
    ResolvedTask {
        task,
        category,
        priority: task.priority.unwrap_or_default(),
        deadline: task.deadline_date(),
    }
}

pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &Filters) -> Vec<ResolvedTask<'a>> {
    tasks
        .iter()
        .map(resolve)
        .filter(|task| filters.matches(task))
        .collect()
}

/// Priority weight descending, then deadline ascending with undated last
///
/// The sort is stable, so undated tasks of equal priority keep input order.
pub fn sort_tasks(tasks: &mut [ResolvedTask<'_>]) {
    tasks.sort_by(compare_tasks);
}

fn compare_tasks(left: &ResolvedTask<'_>, right: &ResolvedTask<'_>) -> Ordering {
    right
        .priority
        .weight()
        .cmp(&left.priority.weight())
        .then_with(|| match (left.deadline, right.deadline) {
            (Some(l), Some(r)) => l.cmp(&r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Partition by category, keeping first-seen group order and in-group order
pub fn group_tasks<'a>(sorted: &[ResolvedTask<'a>]) -> IndexMap<&'a str, Vec<&'a Task>> {
    let mut groups: IndexMap<&'a str, Vec<&'a Task>> = IndexMap::new();
    for task in sorted {
        groups.entry(task.category).or_default().push(task.task);
    }
    groups
}

/// One display section
#[derive(Debug, Clone, Serialize)]
pub struct Section<'a> {
    pub category: &'a str,
    /// Color of the matching category definition, if there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    pub tasks: Vec<&'a Task>,
}

/// Aggregates over the whole, unfiltered collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub done_count: usize,
    pub total_count: usize,
    pub overdue_count: usize,
}

pub fn summarize(tasks: &[Task], today: NaiveDate) -> Summary {
    Summary {
        done_count: tasks.iter().filter(|task| task.is_done()).count(),
        total_count: tasks.len(),
        overdue_count: tasks.iter().filter(|task| is_overdue(task, today)).count(),
    }
}

/// Deadline strictly before `today` and not done
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    !task.is_done() && task.deadline_date().is_some_and(|deadline| deadline < today)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "days", rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// Days past the deadline
    Overdue(i64),
    /// Days until the deadline; 0 means due today
    DaysLeft(i64),
}

/// Countdown shown next to a task; `None` when it has no usable deadline
pub fn deadline_status(task: &Task, today: NaiveDate) -> Option<DeadlineStatus> {
    let days = (task.deadline_date()? - today).num_days();
    if days < 0 {
        Some(DeadlineStatus::Overdue(-days))
    } else {
        Some(DeadlineStatus::DaysLeft(days))
    }
}

/// The derived, display-ready structure
#[derive(Debug, Clone, Serialize)]
pub struct TaskView<'a> {
    pub sections: Vec<Section<'a>>,
    #[serde(flatten)]
    pub summary: Summary,
}

impl TaskView<'_> {
    /// Number of tasks that passed the filters
    pub fn shown_count(&self) -> usize {
        self.sections.iter().map(|section| section.tasks.len()).sum()
    }

    /// Sections flattened back into display order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.sections
            .iter()
            .flat_map(|section| section.tasks.iter().copied())
    }
}

/// Filter, sort and group `tasks`, plus summary counts as of `today`
pub fn derive<'a>(
    tasks: &'a [Task],
    categories: &'a [Category],
    filters: &Filters,
    today: NaiveDate,
) -> TaskView<'a> {
    let mut shown = filter_tasks(tasks, filters);
    sort_tasks(&mut shown);

    let sections = group_tasks(&shown)
        .into_iter()
        .map(|(key, tasks)| Section {
            category: key,
            color: category::color_of(key, categories),
            tasks,
        })
        .collect();

    TaskView {
        sections,
        summary: summarize(tasks, today),
    }
}

/// Local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
