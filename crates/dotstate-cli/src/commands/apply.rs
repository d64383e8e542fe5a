//! Apply command implementation

use std::path::PathBuf;

use dotstate_fs::{DryRunMutator, FsMutator, Mutator, RealFs, VerboseMutator};

use super::target_names;
use crate::config::Settings;
use crate::error::Result;

/// Run the apply command
///
/// With `dry_run`, every change is printed and nothing is touched. With
/// `verbose`, changes are printed as they are made.
pub fn run_apply(settings: &Settings, targets: &[PathBuf], dry_run: bool, verbose: bool) -> Result<()> {
    let state = settings.load_state()?;
    let mutator: Box<dyn Mutator> = match (dry_run, verbose) {
        (true, _) => Box::new(VerboseMutator::new(DryRunMutator::new())),
        (false, true) => Box::new(VerboseMutator::new(FsMutator)),
        (false, false) => Box::new(FsMutator),
    };

    if targets.is_empty() {
        state.apply_all(&RealFs, mutator.as_ref())?;
    } else {
        let names = target_names(&state, targets)?;
        state.apply_targets(&RealFs, mutator.as_ref(), &names)?;
    }
    Ok(())
}
