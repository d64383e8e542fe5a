//! Terminal prompt for the capture workflow

use dialoguer::Input;
use dotstate_core::{Error, Prompter};

/// Reads one allowed character from the terminal, asking again on anything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, message: &str, choices: &str) -> dotstate_core::Result<char> {
        let listed: Vec<String> = choices.chars().map(String::from).collect();
        let answer: String = Input::<String>::new()
            .with_prompt(format!("{message} [{}]", listed.join(",")))
            .validate_with(|input: &String| -> Result<(), String> {
                match single_choice(input, choices) {
                    Some(_) => Ok(()),
                    None => Err(format!("enter one of {}", listed.join(", "))),
                }
            })
            .interact_text()
            .map_err(|e| Error::Prompt {
                message: e.to_string(),
            })?;
        single_choice(&answer, choices).ok_or_else(|| Error::Prompt {
            message: format!("unexpected answer {answer:?}"),
        })
    }
}

fn single_choice(input: &str, choices: &str) -> Option<char> {
    let mut chars = input.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if choices.contains(c) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_one_allowed_char() {
        assert_eq!(single_choice("y", "ynqa"), Some('y'));
        assert_eq!(single_choice(" q\n", "ynqa"), Some('q'));
        assert_eq!(single_choice("yes", "ynqa"), None);
        assert_eq!(single_choice("x", "ynqa"), None);
        assert_eq!(single_choice("", "ynqa"), None);
    }
}
