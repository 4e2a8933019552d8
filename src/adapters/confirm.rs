//! Operator Confirmation Adapters
//!
//! Implements the `Confirm` port for the prompt disposition.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use parking_lot::Mutex;

use crate::domain::ports::Confirm;

/// True if an answer counts as "yes".
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim_start().starts_with(|c: char| c == 'y' || c == 'Y')
}

/// Write `prompt` to `output` and read one answer line from `input`. A write
/// failure, read failure or closed input declines.
pub fn ask<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> bool {
    if write!(output, "{} > ", prompt).and_then(|_| output.flush()).is_err() {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => is_affirmative(&answer),
        Err(_) => false,
    }
}

/// Asks on stderr and reads the answer from stdin. Blocks with no timeout.
/// Stdout is left to the run report.
#[derive(Debug, Default)]
pub struct ConsoleConfirm;

impl Confirm for ConsoleConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        ask(prompt, &mut io::stdin().lock(), &mut io::stderr().lock())
    }
}

/// Replays a fixed list of answers and remembers every prompt. When the
/// answers run out every further prompt is declined.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every prompt shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().push(prompt.to_string());
        self.answers
            .lock()
            .pop_front()
            .map(|a| is_affirmative(&a))
            .unwrap_or(false)
    }
}
