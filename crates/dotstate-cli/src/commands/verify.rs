//! Verify command implementation

use std::path::PathBuf;

use colored::Colorize;

use dotstate_fs::{DryRunMutator, RealFs};

use super::target_names;
use crate::config::Settings;
use crate::error::{CliError, Result};

/// Run the verify command
///
/// Evaluates every entry, then computes the changes apply would make.
/// Any pending change is drift.
pub fn run_verify(settings: &Settings, targets: &[PathBuf]) -> Result<()> {
    let state = settings.load_state()?;
    state.evaluate_all()?;

    let mutator = DryRunMutator::new();
    if targets.is_empty() {
        state.apply_all(&RealFs, &mutator)?;
    } else {
        let names = target_names(&state, targets)?;
        state.apply_targets(&RealFs, &mutator, &names)?;
    }

    let ops = mutator.ops();
    if ops.is_empty() {
        println!("{} Destination matches the source state.", "OK".green().bold());
        return Ok(());
    }

    println!("{} Destination has drifted:", "DRIFTED".red().bold());
    for op in &ops {
        println!("   {} {}", "!".red(), op);
    }
    Err(CliError::user(format!("{} pending changes", ops.len())))
}
