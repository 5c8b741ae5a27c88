//! Line-oriented input providers for human players.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of answers to prompts. `None` means the input is closed.
pub trait MoveInput {
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Feedback after an answer was refused.
    fn notify(&mut self, _message: &str) {}
}

/// Prompts on stdout and reads stdin.
#[derive(Debug, Default)]
pub struct StdinInput;

impl MoveInput for StdinInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "{prompt}");
        let _ = stdout.flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Replays canned answers and records what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub notices: Vec<String>,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl MoveInput for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front()
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

/// Parse `"x,y"` with optional whitespace around either number.
pub fn parse_coords(line: &str) -> Option<(i32, i32)> {
    let (x, y) = line.trim().split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}
