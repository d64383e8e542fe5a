use std::io::Write;
use std::path::Path;

use dotstate_fs::{FileKind, FileSystem, Mutator};

use super::Names;
use crate::concrete::{ConcreteValue, SymlinkValue};
use crate::lazy::Lazy;
use crate::{Error, Result};

/// The desired state of a symlink.
#[derive(Debug)]
pub struct Symlink {
    names: Names,
    /// Whether the link target comes from a template
    pub template: bool,
    link_name: Lazy<String>,
}

impl Symlink {
    /// A symlink whose target is already known.
    pub fn new(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        template: bool,
        link_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            names: Names::new(source_name, target_name)?,
            template,
            link_name: Lazy::resolved(link_name.into()),
        })
    }

    /// A symlink whose target is computed on first use.
    pub fn deferred(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        template: bool,
        evaluate_link_name: impl FnOnce() -> Result<String> + 'static,
    ) -> Result<Self> {
        Ok(Self {
            names: Names::new(source_name, target_name)?,
            template,
            link_name: Lazy::deferred(evaluate_link_name),
        })
    }

    pub fn source_name(&self) -> &str {
        &self.names.source_name
    }

    pub fn target_name(&self) -> &str {
        &self.names.target_name
    }

    /// The link target, evaluating it on first call.
    pub fn link_name(&self) -> Result<&str> {
        self.link_name.get().map(String::as_str)
    }

    /// Ensure the destination is a symlink to [`Self::link_name`].
    ///
    /// Missing paths, other symlinks and regular files are replaced through
    /// [`Mutator::write_symlink`]. A directory is never replaced.
    pub fn apply(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dest_dir: &Path,
        _umask: u32,
    ) -> Result<()> {
        let target = self.link_name()?;
        let target_path = dest_dir.join(self.target_name());
        match fs.lstat(&target_path) {
            Ok(info) if info.is_symlink() => {
                if fs.read_link(&target_path)? == target {
                    tracing::debug!(target_name = self.target_name(), "symlink up to date");
                    return Ok(());
                }
            }
            Ok(info) if info.is_dir() => {
                return Err(Error::StateMismatch {
                    path: target_path,
                    expected: FileKind::Symlink,
                    found: info.kind,
                });
            }
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }
        mutator.write_symlink(target, &target_path)?;
        Ok(())
    }

    pub fn evaluate(&self) -> Result<()> {
        self.link_name().map(|_| ())
    }

    pub fn concrete_value(
        &self,
        dest_dir: &Path,
        source_dir: &Path,
        _recursive: bool,
    ) -> Result<ConcreteValue> {
        let link_name = self.link_name()?;
        Ok(ConcreteValue::Symlink(SymlinkValue {
            source_path: source_dir.join(self.source_name()),
            target_path: dest_dir.join(self.target_name()),
            template: self.template,
            link_name: link_name.to_string(),
        }))
    }

    pub fn archive<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        header_template: &tar::Header,
        _umask: u32,
    ) -> Result<()> {
        let link_name = self.link_name()?;
        let mut header = header_template.clone();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        builder
            .append_link(&mut header, self.target_name(), link_name)
            .map_err(|e| Error::archive(self.target_name(), e))
    }
}
