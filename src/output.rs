//! Output for taskmate commands: a JSON envelope or a short text report.
//!
//! Every `--json` response has the same top level:
//! `schema_version`, `command`, `status` (`success` or `error`), then
//! either `data` or `error`, then optional `warnings` and `next_steps`.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "taskmate.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text report of one command
///
/// Renders as the header followed by the non-empty sections
/// `Summary`, `Details`, `Warnings` and `Next steps`, one `- ` line per item.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<String>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// A `key: value` line under Summary
    pub fn push_summary(&mut self, key: &str, value: impl AsRef<str>) {
        self.summary.push(format!("{key}: {}", value.as_ref()));
    }

    pub fn push_detail(&mut self, line: impl Into<String>) {
        self.details.push(line.into());
    }

    pub fn push_warning(&mut self, line: impl Into<String>) {
        self.warnings.push(line.into());
    }

    /// A follow-up command; also reported as `next_steps` in JSON
    pub fn push_next_step(&mut self, command: impl Into<String>) {
        self.next_steps.push(command.into());
    }
}

pub fn format_human(output: &HumanOutput) -> String {
    let sections = [
        ("Summary", &output.summary),
        ("Details", &output.details),
        ("Warnings", &output.warnings),
        ("Next steps", &output.next_steps),
    ];

    let mut text = output.header.clone();
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        text.push_str("\n\n");
        text.push_str(title);
        text.push(':');
        for item in items {
            text.push_str("\n- ");
            text.push_str(item);
        }
    }
    text
}

#[derive(Serialize)]
struct Envelope<'a, B: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(flatten)]
    body: B,
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    next_steps: &'a [String],
}

#[derive(Serialize)]
struct Success<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Serialize)]
struct Failure {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn is_empty(items: &&[String]) -> bool {
    items.is_empty()
}

/// Print `data` as a success envelope, or `human` as text unless quiet
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: &HumanOutput,
) -> Result<()> {
    if options.json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            body: Success { data },
            warnings: &human.warnings,
            next_steps: &human.next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else if !options.quiet {
        println!("{}", format_human(human));
    }
    Ok(())
}

/// Report a failed command on stdout (JSON) or stderr (text)
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            body: Failure {
                error: ErrorBody {
                    message: err.to_string(),
                    code: err.exit_code(),
                    kind: error_kind(err),
                    details: err.details(),
                },
            },
            warnings: &[],
            next_steps: &next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Command name for error envelopes, read before clap parses
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

/// First positional argument, plus the subcommand for `category`
fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut positional = Vec::with_capacity(2);
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if matches!(arg.as_str(), "--data-dir" | "--config") {
            args.next();
        } else if !arg.starts_with('-') {
            positional.push(arg);
            if positional.len() == 2 || positional[0] != "category" {
                break;
            }
        }
    }

    match positional.as_slice() {
        [] => "taskmate".to_string(),
        [command] => command.clone(),
        [command, sub, ..] => format!("{command} {sub}"),
    }
}

fn error_kind(err: &Error) -> &'static str {
    if err.is_validation() {
        "validation"
    } else if err.exit_code() == crate::error::exit_codes::USER_ERROR {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    let step = match err {
        Error::EmptyTitle => "taskmate add \"<title>\"".to_string(),
        Error::EmptyCategoryKey => "taskmate category add <key>".to_string(),
        Error::DuplicateCategory(_) => "taskmate category list".to_string(),
        Error::TaskNotFound(_) => "taskmate list".to_string(),
        Error::InvalidConfig(_) => "fix taskmate.toml then retry".to_string(),
        Error::UnreadableSlot { key, .. } => {
            format!("repair or move {key}.json in the data directory, then retry")
        }
        Error::LockFailed(_) => "retry once the other taskmate process exits".to_string(),
        _ => return Vec::new(),
    };
    vec![step]
}
