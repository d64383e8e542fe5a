use std::io::Write;
use std::path::Path;

use dotstate_fs::{FileKind, FileSystem, Mutator};

use super::{Names, perm_differs};
use crate::concrete::{ConcreteValue, FileValue};
use crate::lazy::Lazy;
use crate::{Error, Result};

/// The desired state of a regular file.
#[derive(Debug)]
pub struct File {
    names: Names,
    /// Keep the file even when its contents are empty
    pub empty: bool,
    pub encrypted: bool,
    /// Permission bits before the umask
    pub perm: u32,
    pub template: bool,
    contents: Lazy<Vec<u8>>,
}

/// Flags describing a [`File`], grouped to keep constructors short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFlags {
    pub empty: bool,
    pub encrypted: bool,
    pub perm: u32,
    pub template: bool,
}

impl Default for FileFlags {
    fn default() -> Self {
        Self {
            empty: false,
            encrypted: false,
            perm: 0o666,
            template: false,
        }
    }
}

impl File {
    pub fn new(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        flags: FileFlags,
        contents: Vec<u8>,
    ) -> Result<Self> {
        Self::with_contents(source_name, target_name, flags, Lazy::resolved(contents))
    }

    pub fn deferred(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        flags: FileFlags,
        evaluate_contents: impl FnOnce() -> Result<Vec<u8>> + 'static,
    ) -> Result<Self> {
        Self::with_contents(
            source_name,
            target_name,
            flags,
            Lazy::deferred(evaluate_contents),
        )
    }

    fn with_contents(
        source_name: impl Into<String>,
        target_name: impl Into<String>,
        flags: FileFlags,
        contents: Lazy<Vec<u8>>,
    ) -> Result<Self> {
        Ok(Self {
            names: Names::new(source_name, target_name)?,
            empty: flags.empty,
            encrypted: flags.encrypted,
            perm: flags.perm,
            template: flags.template,
            contents,
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

    /// Ensure the destination file has the desired contents and mode.
    ///
    /// Empty contents without the `empty` flag mean the file should not
    /// exist. Symlinks in the way are replaced; directories are not.
    pub fn apply(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dest_dir: &Path,
        umask: u32,
    ) -> Result<()> {
        let contents = self.contents()?;
        let target_path = dest_dir.join(self.target_name());
        let perm = self.perm & !umask;

        let existing = match fs.lstat(&target_path) {
            Ok(info) => Some(info),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err.into()),
        };
        if let Some(info) = existing
            && info.is_dir()
        {
            return Err(Error::StateMismatch {
                path: target_path,
                expected: FileKind::File,
                found: info.kind,
            });
        }

        if contents.is_empty() && !self.empty {
            if existing.is_some() {
                mutator.remove_all(&target_path)?;
            }
            return Ok(());
        }

        if let Some(info) = existing
            && info.is_file()
            && fs.read_file(&target_path)? == contents
        {
            if perm_differs(info.perm(), perm) {
                mutator.chmod(&target_path, perm)?;
            }
            return Ok(());
        }

        mutator.write_file(&target_path, contents, perm)?;
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
        Ok(ConcreteValue::File(FileValue {
            source_path: source_dir.join(self.source_name()),
            target_path: dest_dir.join(self.target_name()),
            empty: self.empty,
            encrypted: self.encrypted,
            perm: self.perm,
            template: self.template,
            contents: String::from_utf8_lossy(contents).into_owned(),
        }))
    }

    pub fn archive<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        header_template: &tar::Header,
        umask: u32,
    ) -> Result<()> {
        let contents = self.contents()?;
        if contents.is_empty() && !self.empty {
            return Ok(());
        }
        let mut header = header_template.clone();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(self.perm & !umask);
        builder
            .append_data(&mut header, self.target_name(), contents)
            .map_err(|e| Error::archive(self.target_name(), e))
    }
}
