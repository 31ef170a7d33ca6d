//! Interactive confirmation on the terminal.

use std::io::{self, BufRead, Write};

use crate::ops::{Confirm, ConfirmOption, ConfirmStyle};

/// Asks on stderr and reads the answer from a line of input
///
/// `y`/`yes` picks the first accepting option; an option label picks that
/// option. Anything else, end of input, or a read failure dismisses.
pub struct TerminalConfirm {
    input: Box<dyn BufRead>,
    prompt: Box<dyn Write>,
}

impl TerminalConfirm {
    pub fn stdin() -> Self {
        Self::new(Box::new(io::BufReader::new(io::stdin())), Box::new(io::stderr()))
    }

    pub fn new(input: Box<dyn BufRead>, prompt: Box<dyn Write>) -> Self {
        Self { input, prompt }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, title: &str, message: &str, options: &[ConfirmOption]) -> Option<usize> {
        let labels: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        let _ = write!(
            self.prompt,
            "{title}: {message} [{}] (y/N) ",
            labels.join("/")
        );
        let _ = self.prompt.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Failed to read user input");
                return None;
            }
        }
        pick(answer.trim(), options)
    }
}

fn pick(answer: &str, options: &[ConfirmOption]) -> Option<usize> {
    if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
        return options
            .iter()
            .position(|option| option.style != ConfirmStyle::Cancel);
    }
    options
        .iter()
        .position(|option| !answer.is_empty() && option.label.eq_ignore_ascii_case(answer))
}
