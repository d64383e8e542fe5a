use std::io::Write;
use std::path::Path;

use dotstate_fs::{FileKind, FileSystem, Mutator};

use super::{Names, perm_differs};
use crate::concrete::{ConcreteValue, DirectoryValue};
use crate::{Error, Result};

/// The desired state of a directory.
///
/// Children are separate entries; [`Directory::exact`] asks the caller to
/// remove unmanaged children.
#[derive(Debug)]
pub struct Directory {
    names: Names,
    pub exact: bool,
    /// Permission bits before the umask
    pub perm: u32,
}

impl Directory {
    pub fn new(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        exact: bool,
        perm: u32,
    ) -> Result<Self> {
        Ok(Self {
            names: Names::new(source_name, target_name)?,
            exact,
            perm,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.names.source_name
    }

    pub fn target_name(&self) -> &str {
        &self.names.target_name
    }

    pub fn apply(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dest_dir: &Path,
        umask: u32,
    ) -> Result<()> {
        let target_path = dest_dir.join(self.target_name());
        let perm = self.perm & !umask;
        match fs.lstat(&target_path) {
            Ok(info) if info.is_dir() => {
                if perm_differs(info.perm(), perm) {
                    mutator.chmod(&target_path, perm)?;
                }
                Ok(())
            }
            Ok(info) => Err(Error::StateMismatch {
                path: target_path,
                expected: FileKind::Dir,
                found: info.kind,
            }),
            Err(err) if err.is_not_found() => {
                mutator.mkdir(&target_path, perm)?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Directories have nothing lazy.
    pub fn evaluate(&self) -> Result<()> {
        Ok(())
    }

    /// With `recursive`, `entries` is present and empty for the caller to fill.
    pub fn concrete_value(
        &self,
        dest_dir: &Path,
        source_dir: &Path,
        recursive: bool,
    ) -> Result<ConcreteValue> {
        Ok(ConcreteValue::Directory(DirectoryValue {
            source_path: source_dir.join(self.source_name()),
            target_path: dest_dir.join(self.target_name()),
            exact: self.exact,
            perm: self.perm,
            entries: recursive.then(Vec::new),
        }))
    }

    pub fn archive<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        header_template: &tar::Header,
        umask: u32,
    ) -> Result<()> {
        let mut header = header_template.clone();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_size(0);
        header.set_mode(self.perm & !umask);
        builder
            .append_data(
                &mut header,
                format!("{}/", self.target_name()),
                std::io::empty(),
            )
            .map_err(|e| Error::archive(self.target_name(), e))
    }
}
