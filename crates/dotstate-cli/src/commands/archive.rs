//! Archive command implementation

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::Settings;
use crate::error::Result;

/// Run the archive command
///
/// Writes a tar stream of the target state to `output`, or to stdout.
pub fn run_archive(settings: &Settings, output: Option<&Path>) -> Result<()> {
    let state = settings.load_state()?;
    let mut writer = match output {
        Some(path) => {
            let file = File::create(path)?;
            state.archive(BufWriter::new(Box::new(file) as Box<dyn Write>))?
        }
        None => state.archive(BufWriter::new(
            Box::new(std::io::stdout().lock()) as Box<dyn Write>
        ))?,
    };
    writer.flush()?;
    Ok(())
}
