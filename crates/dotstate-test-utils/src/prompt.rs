//! [`ScriptedPrompter`]: a [`Prompter`] that replays recorded answers.

use std::collections::VecDeque;

use dotstate_core::{Error, Prompter, Result};

/// Replays answers in order and records every message it was asked.
///
/// Running out of answers is a prompt error, which makes an unexpected
/// extra prompt fail the test loudly.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<char>,
    /// Messages in the order they were asked
    pub messages: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = char>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            messages: Vec::new(),
        }
    }

    /// Answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, message: &str, choices: &str) -> Result<char> {
        self.messages.push(message.to_string());
        let answer = self.answers.pop_front().ok_or_else(|| Error::Prompt {
            message: format!("no scripted answer for {message:?}"),
        })?;
        assert!(
            choices.contains(answer),
            "scripted answer {answer:?} not in {choices:?}"
        );
        Ok(answer)
    }
}
