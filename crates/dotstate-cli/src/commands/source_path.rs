//! Source-path command implementation

use std::path::PathBuf;

use dotstate_core::Error;

use super::target_names;
use crate::config::Settings;
use crate::error::Result;

/// Run the source-path command
///
/// Without targets, prints the source directory.
pub fn run_source_path(settings: &Settings, targets: &[PathBuf]) -> Result<()> {
    if targets.is_empty() {
        println!("{}", settings.source_dir.display());
        return Ok(());
    }

    let state = settings.load_state()?;
    for name in target_names(&state, targets)? {
        let path = state
            .source_path(&name)
            .ok_or(Error::NotManaged { target_name: name })?;
        println!("{}", path.display());
    }
    Ok(())
}
