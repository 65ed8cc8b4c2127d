// Prompt layer: where field values and confirmations come from.
// `TerminalPrompter` asks the user through `dialoguer`; `ScriptedPrompter`
// replays a fixed list of answers so flows can run without a terminal.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use std::collections::VecDeque;

/// Source of user answers.
pub trait Prompter {
    /// Ask for one field. `default` is what an empty answer stands for.
    fn ask(&mut self, field: &str, default: Option<&str>) -> Result<String>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Tell the user something went wrong with their last answer.
    fn notify(&mut self, message: &str);
}

/// Answers that count as "yes" when typed.
const YES_WORDS: [&str; 8] = ["y", "yes", "yep", "yeah", "yup", "sure", "ok", "okay"];

pub fn is_yes(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    YES_WORDS.contains(&answer.as_str())
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, field: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new();
        input.with_prompt(field).allow_empty(true);
        if let Some(d) = default {
            input.default(d.to_string());
        }
        input
            .interact_text()
            .with_context(|| format!("Failed to read {}", field))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }

    fn notify(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Replays canned answers in order. Every notice is kept for inspection.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
            notices: Vec::new(),
        }
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, what: &str) -> Result<String> {
        self.answers
            .pop_front()
            .with_context(|| format!("no scripted answer left for {}", what))
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, field: &str, _default: Option<&str>) -> Result<String> {
        self.next_answer(field)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.next_answer(prompt).map(|a| is_yes(&a))
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
