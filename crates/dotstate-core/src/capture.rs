//! Capture workflow
//!
//! Turns existing destination paths into source state, one input at a time,
//! with ignore filtering, optional per-path prompting and cooperative
//! cancellation. Recursive inputs are walked in pre-order through
//! [`walk_with`], so a `q` answer is an ordinary [`WalkAction::Abort`] and
//! never leaves the walk it was given in.

use std::path::{Path, PathBuf};

use dotstate_fs::{FileSystem, Mutator, WalkAction, WalkEntry, WalkOutcome, walk_with};

use crate::ignore::IGNORE_FILE;
use crate::state::{AddOptions, TargetState};
use crate::{Error, Result};

/// Blocking single-character prompt.
pub trait Prompter {
    /// Ask `message` and return one of the characters in `choices`.
    fn prompt(&mut self, message: &str, choices: &str) -> Result<char>;
}

/// An answer to the capture prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Add this path
    Yes,
    /// Skip this path
    No,
    /// Stop capturing
    Quit,
    /// Add this path and stop asking
    All,
}

impl Choice {
    /// The characters offered by the capture prompt, in display order.
    pub const CHOICES: &'static str = "ynqa";

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'y' => Some(Self::Yes),
            'n' => Some(Self::No),
            'q' => Some(Self::Quit),
            'a' => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Yes => 'y',
            Self::No => 'n',
            Self::Quit => 'q',
            Self::All => 'a',
        }
    }
}

/// Capture settings for one invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capture {
    pub recursive: bool,
    pub prompt: bool,
    /// Capture what symlinks point to rather than the links themselves
    pub follow: bool,
    pub options: AddOptions,
}

/// A capture input that failed.
#[derive(Debug)]
pub struct AddFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// What a capture run did.
#[derive(Debug, Default)]
pub struct AddReport {
    /// Paths passed to the add primitive, in processing order
    pub added: Vec<PathBuf>,
    /// Paths declined at the prompt
    pub skipped: Vec<PathBuf>,
    /// Paths excluded by the ignore file
    pub ignored: Vec<PathBuf>,
    /// One warning per ignored path
    pub warnings: Vec<String>,
    pub failures: Vec<AddFailure>,
    /// A `q` answer ended some or all of the run early
    pub cancelled: bool,
}

impl AddReport {
    /// Cancellation is not a failure.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Decision {
    Add,
    /// Declined at the prompt; children are still offered
    Skip,
    /// Matched `.dotstateignore`; the whole subtree is left out
    Ignore,
    Quit,
}

impl Capture {
    /// Capture `paths` in order.
    ///
    /// Failures are recorded per input and do not stop later inputs. A `q`
    /// answer on a single path stops all remaining inputs; inside a
    /// recursive walk it ends that walk only.
    pub fn run(
        &self,
        state: &mut TargetState,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        prompter: &mut dyn Prompter,
        paths: &[PathBuf],
    ) -> AddReport {
        let mut session = Session {
            capture: self,
            prompt: self.prompt,
            report: AddReport::default(),
        };

        for path in paths {
            let path = match std::path::absolute(path) {
                Ok(path) => path,
                Err(source) => {
                    let error = dotstate_fs::Error::io(path, source).into();
                    session.report.failures.push(AddFailure {
                        path: path.clone(),
                        error,
                    });
                    continue;
                }
            };

            let result = if self.recursive {
                session.capture_tree(state, fs, mutator, prompter, &path)
            } else {
                session.capture_one(state, fs, mutator, prompter, &path)
            };
            match result {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(path = %path.display(), "capture cancelled");
                    session.report.cancelled = true;
                    break;
                }
                Err(error) => {
                    tracing::debug!(path = %path.display(), %error, "capture failed");
                    session.report.failures.push(AddFailure { path, error });
                }
            }
        }
        session.report
    }
}

struct Session<'a> {
    capture: &'a Capture,
    /// Cleared by an `a` answer for the rest of the run
    prompt: bool,
    report: AddReport,
}

impl Session<'_> {
    /// Returns false when the user quit.
    fn capture_one(
        &mut self,
        state: &mut TargetState,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        prompter: &mut dyn Prompter,
        path: &Path,
    ) -> Result<bool> {
        match self.decide(state, prompter, path)? {
            Decision::Skip | Decision::Ignore => Ok(true),
            Decision::Quit => Ok(false),
            Decision::Add => {
                self.add(state, fs, mutator, path, None)?;
                Ok(true)
            }
        }
    }

    /// Always returns true: quitting ends this walk, not the run.
    fn capture_tree(
        &mut self,
        state: &mut TargetState,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        prompter: &mut dyn Prompter,
        root: &Path,
    ) -> Result<bool> {
        let outcome = walk_with(fs, root, |node: &WalkEntry| -> Result<WalkAction> {
            if state.is_dest_dir(&node.path) {
                return Ok(WalkAction::Continue);
            }
            match self.decide(state, prompter, &node.path)? {
                Decision::Skip => Ok(WalkAction::Continue),
                Decision::Ignore => Ok(WalkAction::SkipSubtree),
                Decision::Quit => Ok(WalkAction::Abort),
                Decision::Add => {
                    self.add(state, fs, mutator, &node.path, Some(node.info))?;
                    Ok(WalkAction::Continue)
                }
            }
        })?;
        if outcome == WalkOutcome::Aborted {
            tracing::debug!(root = %root.display(), "walk cancelled");
            self.report.cancelled = true;
        }
        Ok(true)
    }

    /// Ignore check, then the prompt.
    fn decide(
        &mut self,
        state: &TargetState,
        prompter: &mut dyn Prompter,
        path: &Path,
    ) -> Result<Decision> {
        if state.is_ignored(path) {
            let warning = format!("skipping file ignored by {IGNORE_FILE}: {}", path.display());
            tracing::debug!("{warning}");
            self.report.warnings.push(warning);
            self.report.ignored.push(path.to_path_buf());
            return Ok(Decision::Ignore);
        }
        if !self.prompt {
            return Ok(Decision::Add);
        }

        let answer = prompter.prompt(&format!("add {}", path.display()), Choice::CHOICES)?;
        match Choice::from_char(answer) {
            Some(Choice::Yes) => Ok(Decision::Add),
            Some(Choice::No) => {
                tracing::debug!(path = %path.display(), "declined");
                self.report.skipped.push(path.to_path_buf());
                Ok(Decision::Skip)
            }
            Some(Choice::Quit) => Ok(Decision::Quit),
            Some(Choice::All) => {
                self.prompt = false;
                Ok(Decision::Add)
            }
            None => Err(Error::Prompt {
                message: format!("unexpected answer {answer:?}"),
            }),
        }
    }

    fn add(
        &mut self,
        state: &mut TargetState,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        path: &Path,
        info: Option<dotstate_fs::FileInfo>,
    ) -> Result<()> {
        let capture = self.capture;
        state.add(fs, &capture.options, path, info, capture.follow, mutator)?;
        self.report.added.push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choices_round_trip() {
        for c in Choice::CHOICES.chars() {
            let choice = Choice::from_char(c).unwrap();
            assert_eq!(choice.as_char(), c);
        }
        assert_eq!(Choice::from_char('x'), None);
    }

    #[test]
    fn cancelled_report_is_still_success() {
        let report = AddReport {
            cancelled: true,
            ..AddReport::default()
        };
        assert!(report.is_success());
    }
}
