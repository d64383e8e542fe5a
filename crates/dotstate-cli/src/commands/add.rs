//! Add command implementation

use std::path::PathBuf;

use colored::Colorize;

use dotstate_core::Capture;
use dotstate_fs::{FsMutator, RealFs};

use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::prompt::TerminalPrompter;

/// Run the add command
///
/// Captures `paths` into the source directory. Ignored paths produce a
/// warning; per-path failures are printed and turn into a non-zero exit.
pub fn run_add(settings: &Settings, capture: Capture, paths: &[PathBuf]) -> Result<()> {
    let mut state = settings.load_state()?;
    state.ensure_source_dir(&RealFs, &FsMutator)?;

    let report = capture.run(&mut state, &RealFs, &FsMutator, &mut TerminalPrompter, paths);

    for warning in &report.warnings {
        eprintln!("{}: {}", "warning".yellow().bold(), warning);
    }
    for failure in &report.failures {
        eprintln!(
            "{}: {}: {}",
            "error".red().bold(),
            failure.path.display(),
            failure.error
        );
    }
    if report.cancelled {
        tracing::debug!("add cancelled by user");
    }
    tracing::debug!(
        added = report.added.len(),
        skipped = report.skipped.len(),
        ignored = report.ignored.len(),
        "add finished"
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} of {} paths could not be added",
            report.failures.len(),
            paths.len()
        )))
    }
}
