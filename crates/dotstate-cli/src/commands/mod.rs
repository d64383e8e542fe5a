//! Command implementations for dotstate-cli

pub mod add;
pub mod apply;
pub mod archive;
pub mod dump;
pub mod source_path;
pub mod verify;

pub use add::run_add;
pub use apply::run_apply;
pub use archive::run_archive;
pub use dump::run_dump;
pub use source_path::run_source_path;
pub use verify::run_verify;

use std::path::PathBuf;

use dotstate_core::TargetState;

use crate::error::Result;

/// Resolve destination paths given on the command line to target names.
pub(crate) fn target_names(state: &TargetState, targets: &[PathBuf]) -> Result<Vec<String>> {
    targets
        .iter()
        .map(|target| {
            let path = std::path::absolute(target)?;
            Ok(state.target_name_for(&path)?)
        })
        .collect()
}
