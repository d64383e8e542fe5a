//! [`RecordingMutator`]: applies operations and remembers them.

use std::path::Path;

use dotstate_fs::{DryRunMutator, FsMutator, Mutator, MutatorOp, Result};

/// A [`Mutator`] that records each operation, then performs it with
/// [`FsMutator`].
#[derive(Debug, Default)]
pub struct RecordingMutator {
    log: DryRunMutator,
    inner: FsMutator,
}

impl RecordingMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations performed so far.
    pub fn ops(&self) -> Vec<MutatorOp> {
        self.log.ops()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}

impl Mutator for RecordingMutator {
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()> {
        self.log.write_file(path, contents, perm)?;
        self.inner.write_file(path, contents, perm)
    }

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        self.log.mkdir(path, perm)?;
        self.inner.mkdir(path, perm)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        self.log.remove_all(path)?;
        self.inner.remove_all(path)
    }

    fn chmod(&self, path: &Path, perm: u32) -> Result<()> {
        self.log.chmod(path, perm)?;
        self.inner.chmod(path, perm)
    }

    fn write_symlink(&self, target: &str, path: &Path) -> Result<()> {
        self.log.write_symlink(target, path)?;
        self.inner.write_symlink(target, path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.log.rename(from, to)?;
        self.inner.rename(from, to)
    }

    fn run_script(&self, name: &str, contents: &[u8], dir: &Path) -> Result<()> {
        self.log.run_script(name, contents, dir)?;
        self.inner.run_script(name, contents, dir)
    }
}
