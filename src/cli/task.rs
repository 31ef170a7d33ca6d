//! taskmate task commands: list, add, toggle, rm, clear-done, clear-all, summary

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::ops::{Confirm, Outcome};
use crate::output::{emit_success, HumanOutput};
use crate::task::{NewTask, Task, DEADLINE_FORMAT};
use crate::view::{self, DeadlineStatus, Filters, Summary};

/// Options for `taskmate list`
pub struct ListOptions {
    pub status: String,
    pub category: String,
    pub priority: String,
}

/// Options for `taskmate add`
pub struct AddOptions {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<f64>,
}

#[derive(Serialize)]
struct FilterReport {
    status: String,
    category: String,
    priority: String,
}

#[derive(Serialize)]
struct TaskLine<'a> {
    #[serde(flatten)]
    task: &'a Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline_status: Option<DeadlineStatus>,
    overdue: bool,
}

#[derive(Serialize)]
struct SectionReport<'a> {
    category: &'a str,
    color: &'a str,
    tasks: Vec<TaskLine<'a>>,
}

#[derive(Serialize)]
struct ListReport<'a> {
    filters: FilterReport,
    shown: usize,
    #[serde(flatten)]
    summary: Summary,
    sections: Vec<SectionReport<'a>>,
}

pub fn run_list(ctx: &mut Context, options: ListOptions) -> Result<()> {
    let filters = Filters {
        status: options.status.parse()?,
        category: options.category.parse()?,
        priority: options.priority.parse()?,
    };
    ctx.session.set_filters(filters);

    let session = &ctx.session;
    let today = view::today();
    let derived = session.view(today);
    let shown = derived.shown_count();

    let sections: Vec<SectionReport<'_>> = derived
        .sections
        .iter()
        .map(|section| SectionReport {
            category: section.category,
            color: section.color.unwrap_or(session.ops().fallback_color()),
            tasks: section
                .tasks
                .iter()
                .map(|&task| TaskLine {
                    task,
                    deadline_status: view::deadline_status(task, today),
                    overdue: view::is_overdue(task, today),
                })
                .collect(),
        })
        .collect();

    let mut human = HumanOutput::new(match shown {
        0 => "taskmate list: no tasks".to_string(),
        1 => "taskmate list: 1 task".to_string(),
        n => format!("taskmate list: {n} tasks"),
    });
    push_counts(&mut human, &derived.summary);
    let filters = session.filters();
    if *filters != Filters::default() {
        human.push_summary(
            "filters",
            format!(
                "status={} category={} priority={}",
                filters.status, filters.category, filters.priority
            ),
        );
    }
    for section in &sections {
        human.push_detail(format!("{} ({})", section.category, section.color));
        for line in &section.tasks {
            human.push_detail(format!("  {}", describe(line.task, line.deadline_status)));
        }
    }
    if derived.summary.total_count == 0 {
        human.push_next_step("taskmate add \"<title>\"");
    } else if shown == 0 {
        human.push_warning("no tasks match the filters");
    }

    let report = ListReport {
        filters: FilterReport {
            status: filters.status.to_string(),
            category: filters.category.to_string(),
            priority: filters.priority.to_string(),
        },
        shown,
        summary: derived.summary,
        sections,
    };
    emit_success(ctx.output, "list", &report, &human)
}

pub fn run_add(ctx: &mut Context, options: AddOptions) -> Result<()> {
    let input = NewTask {
        title: options.title,
        description: options.description,
        category: options.category,
        deadline: options
            .deadline
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(parse_deadline)
            .transpose()?,
        priority: options.priority.as_deref().map(str::parse).transpose()?,
        progress: options.progress,
    };

    let outcome = ctx.session.create(input)?;
    let mut human = HumanOutput::new(format!("taskmate add: {}", outcome.message()));
    if let Outcome::Created { task } = &outcome {
        human.push_summary("id", task.id.clone());
        human.push_summary("category", task.category.clone().unwrap_or_default());
        if let Some(priority) = task.priority {
            human.push_summary("priority", priority.to_string());
        }
        if let Some(deadline) = &task.deadline {
            human.push_summary("deadline", deadline.clone());
        }
        human.push_next_step(format!("taskmate toggle {}", task.id));
    }
    emit_success(ctx.output, "add", &outcome, &human)
}

pub fn run_toggle(ctx: &mut Context, id: &str) -> Result<()> {
    let outcome = found(ctx.session.toggle(id)?)?;
    emit_outcome(ctx, "toggle", &outcome)
}

pub fn run_remove(ctx: &mut Context, id: &str, confirm: &mut dyn Confirm) -> Result<()> {
    let outcome = found(ctx.session.delete(id, confirm))?;
    emit_outcome(ctx, "rm", &outcome)
}

pub fn run_clear_done(ctx: &mut Context, confirm: &mut dyn Confirm) -> Result<()> {
    let outcome = ctx.session.delete_completed(confirm);
    emit_outcome(ctx, "clear-done", &outcome)
}

pub fn run_clear_all(ctx: &mut Context, confirm: &mut dyn Confirm) -> Result<()> {
    let outcome = ctx.session.delete_all(confirm);
    emit_outcome(ctx, "clear-all", &outcome)
}

pub fn run_summary(ctx: &Context) -> Result<()> {
    let summary = view::summarize(ctx.session.tasks(), view::today());
    let mut human = HumanOutput::new(format!(
        "taskmate summary: {}/{} done",
        summary.done_count, summary.total_count
    ));
    push_counts(&mut human, &summary);
    if summary.overdue_count > 0 {
        human.push_next_step("taskmate list --status todo");
    }
    emit_success(ctx.output, "summary", &summary, &human)
}

fn emit_outcome(ctx: &Context, command: &str, outcome: &Outcome) -> Result<()> {
    let human = HumanOutput::new(format!("taskmate {command}: {}", outcome.message()));
    emit_success(ctx.output, command, outcome, &human)
}

/// Unknown ids are a user error on the command line
fn found(outcome: Outcome) -> Result<Outcome> {
    match outcome {
        Outcome::NotFound { id } => Err(Error::TaskNotFound(id)),
        other => Ok(other),
    }
}

fn parse_deadline(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DEADLINE_FORMAT).map_err(|_| {
        Error::InvalidArgument(format!("invalid deadline '{raw}' (expected YYYY-MM-DD)"))
    })
}

fn push_counts(human: &mut HumanOutput, summary: &Summary) {
    human.push_summary(
        "done",
        format!("{}/{}", summary.done_count, summary.total_count),
    );
    human.push_summary("overdue", summary.overdue_count.to_string());
}

fn describe(task: &Task, deadline: Option<DeadlineStatus>) -> String {
    let mut parts = vec![format!(
        "[{}] {}",
        if task.is_done() { "x" } else { " " },
        task.title
    )];
    parts.push(task.priority.unwrap_or_default().to_string());
    if let Some(status) = deadline {
        parts.push(match status {
            DeadlineStatus::Overdue(days) => format!("overdue by {}", days_label(days)),
            DeadlineStatus::DaysLeft(0) => "due today".to_string(),
            DeadlineStatus::DaysLeft(days) => format!("{} left", days_label(days)),
        });
    }
    if let Some(progress) = task.progress_percent() {
        parts.push(format!("{progress:.0}%"));
    }
    parts.push(task.id.clone());
    parts.join(" · ")
}

fn days_label(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Priority, TaskStatus};
    use serde_json::Map;

    fn task() -> Task {
        Task {
            id: "t-1".to_string(),
            title: "Ship".to_string(),
            description: String::new(),
            category: None,
            deadline: Some("2025-06-12".to_string()),
            priority: Some(Priority::High),
            status: TaskStatus::Pending,
            progress: Some(140.0),
            extra: Map::new(),
        }
    }

    #[test]
    fn describe_task_line() {
        let task = task();
        assert_eq!(
            describe(&task, Some(DeadlineStatus::DaysLeft(2))),
            "[ ] Ship · High · 2 days left · 100% · t-1"
        );
        assert_eq!(
            describe(&task, Some(DeadlineStatus::Overdue(1))),
            "[ ] Ship · High · overdue by 1 day · 100% · t-1"
        );
    }

    #[test]
    fn parse_deadline_rejects_other_formats() {
        assert!(parse_deadline("2025-06-12").is_ok());
        assert!(matches!(
            parse_deadline("12/06/2025"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn not_found_becomes_error() {
        let err = found(Outcome::NotFound { id: "x".to_string() }).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(ref id) if id == "x"));
        assert!(found(Outcome::Cancelled).is_ok());
    }
}
