use std::io::Write;
use std::path::Path;

use dotstate_fs::{FileSystem, Mutator};

use super::Names;
use crate::concrete::{ConcreteValue, ScriptValue};
use crate::lazy::Lazy;
use crate::Result;

/// A script run against the destination directory on apply.
///
/// Scripts have no destination object, so apply always runs a script
/// with non-blank contents. `once` is recorded but not persisted across runs.
#[derive(Debug)]
pub struct Script {
    names: Names,
    pub once: bool,
    pub template: bool,
    contents: Lazy<Vec<u8>>,
}

impl Script {
    pub fn deferred(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        once: bool,
        template: bool,
        evaluate_contents: impl FnOnce() -> Result<Vec<u8>> + 'static,
    ) -> Result<Self> {
        Ok(Self {
            names: Names::new(source_name, target_name)?,
            once,
            template,
            contents: Lazy::deferred(evaluate_contents),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.names.source_name
    }

    pub fn target_name(&self) -> &str {
        &self.names.target_name
    }

    pub fn contents(&self) -> Result<&[u8]> {
        self.contents.get().map(Vec::as_slice)
    }

    pub fn apply(
        &self,
        _fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dest_dir: &Path,
        _umask: u32,
    ) -> Result<()> {
        let contents = self.contents()?;
        if contents.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(script = self.target_name(), "skipping blank script");
            return Ok(());
        }
        mutator.run_script(self.target_name(), contents, dest_dir)?;
        Ok(())
    }

    pub fn evaluate(&self) -> Result<()> {
        self.contents().map(|_| ())
    }

    pub fn concrete_value(
        &self,
        dest_dir: &Path,
        source_dir: &Path,
        _recursive: bool,
    ) -> Result<ConcreteValue> {
        let contents = self.contents()?;
        Ok(ConcreteValue::Script(ScriptValue {
            source_path: source_dir.join(self.source_name()),
            target_path: dest_dir.join(self.target_name()),
            once: self.once,
            template: self.template,
            contents: String::from_utf8_lossy(contents).into_owned(),
        }))
    }

    /// Scripts are not part of archives.
    pub fn archive<W: Write>(
        &self,
        _builder: &mut tar::Builder<W>,
        _header_template: &tar::Header,
        _umask: u32,
    ) -> Result<()> {
        Ok(())
    }
}
