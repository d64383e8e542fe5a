//! Dump command implementation

use std::path::PathBuf;

use dotstate_core::ConcreteValue;

use super::target_names;
use crate::cli::Format;
use crate::config::Settings;
use crate::error::Result;

/// Run the dump command
///
/// Prints the concrete values of `targets`, or of every entry.
pub fn run_dump(settings: &Settings, targets: &[PathBuf], format: Format, recursive: bool) -> Result<()> {
    let state = settings.load_state()?;
    let values: Vec<ConcreteValue> = if targets.is_empty() {
        state.concrete_values(recursive)?
    } else {
        target_names(&state, targets)?
            .iter()
            .map(|name| state.concrete_value(name, recursive))
            .collect::<dotstate_core::Result<_>>()?
    };

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&values)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(&values)?),
    }
    Ok(())
}
