//! The entry contract
//!
//! An [`Entry`] is the desired state of one destination object. The set of
//! kinds is closed, so every capability below dispatches exhaustively.

mod directory;
mod file;
mod script;
mod symlink;

pub use directory::Directory;
pub use file::{File, FileFlags};
pub use script::Script;
pub use symlink::Symlink;

use std::io::Write;
use std::path::Path;

use dotstate_fs::{FileSystem, Mutator, validate_relative_path};

use crate::{ConcreteValue, Result};

/// Desired state of one destination object.
#[derive(Debug)]
pub enum Entry {
    File(File),
    Directory(Directory),
    Symlink(Symlink),
    Script(Script),
}

impl Entry {
    /// Relative path of this entry in the source directory.
    pub fn source_name(&self) -> &str {
        match self {
            Self::File(file) => file.source_name(),
            Self::Directory(dir) => dir.source_name(),
            Self::Symlink(symlink) => symlink.source_name(),
            Self::Script(script) => script.source_name(),
        }
    }

    /// Relative path of this entry under the destination directory.
    pub fn target_name(&self) -> &str {
        match self {
            Self::File(file) => file.target_name(),
            Self::Directory(dir) => dir.target_name(),
            Self::Symlink(symlink) => symlink.target_name(),
            Self::Script(script) => script.target_name(),
        }
    }

    /// Bring the destination object into conformance with this entry.
    ///
    /// Idempotent: when the destination already matches, no mutator method
    /// is called. A destination object of a conflicting kind is reported as
    /// [`crate::Error::StateMismatch`] unless the variant replaces it.
    pub fn apply(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dest_dir: &Path,
        umask: u32,
    ) -> Result<()> {
        match self {
            Self::File(file) => file.apply(fs, mutator, dest_dir, umask),
            Self::Directory(dir) => dir.apply(fs, mutator, dest_dir, umask),
            Self::Symlink(symlink) => symlink.apply(fs, mutator, dest_dir, umask),
            Self::Script(script) => script.apply(fs, mutator, dest_dir, umask),
        }
    }

    /// Force every lazy attribute and report the first failure.
    pub fn evaluate(&self) -> Result<()> {
        match self {
            Self::File(file) => file.evaluate(),
            Self::Directory(dir) => dir.evaluate(),
            Self::Symlink(symlink) => symlink.evaluate(),
            Self::Script(script) => script.evaluate(),
        }
    }

    pub fn concrete_value(
        &self,
        dest_dir: &Path,
        source_dir: &Path,
        recursive: bool,
    ) -> Result<ConcreteValue> {
        match self {
            Self::File(file) => file.concrete_value(dest_dir, source_dir, recursive),
            Self::Directory(dir) => dir.concrete_value(dest_dir, source_dir, recursive),
            Self::Symlink(symlink) => symlink.concrete_value(dest_dir, source_dir, recursive),
            Self::Script(script) => script.concrete_value(dest_dir, source_dir, recursive),
        }
    }

    /// Append this entry to a tar stream, specializing `header_template`.
    pub fn archive<W: Write>(
        &self,
        builder: &mut tar::Builder<W>,
        header_template: &tar::Header,
        umask: u32,
    ) -> Result<()> {
        match self {
            Self::File(file) => file.archive(builder, header_template, umask),
            Self::Directory(dir) => dir.archive(builder, header_template, umask),
            Self::Symlink(symlink) => symlink.archive(builder, header_template, umask),
            Self::Script(script) => script.archive(builder, header_template, umask),
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Self::Directory(dir) => Some(dir),
            _ => None,
        }
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}

impl From<Directory> for Entry {
    fn from(dir: Directory) -> Self {
        Self::Directory(dir)
    }
}

impl From<Symlink> for Entry {
    fn from(symlink: Symlink) -> Self {
        Self::Symlink(symlink)
    }
}

impl From<Script> for Entry {
    fn from(script: Script) -> Self {
        Self::Script(script)
    }
}

/// Source and target names shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Names {
    pub(crate) source_name: String,
    pub(crate) target_name: String,
}

impl Names {
    pub(crate) fn new(source_name: impl Into<String>, target_name: impl Into<String>) -> Result<Self> {
        let source_name = source_name.into();
        let target_name = target_name.into();
        validate_relative_path(&source_name)?;
        validate_relative_path(&target_name)?;
        Ok(Self {
            source_name,
            target_name,
        })
    }
}

/// Mode bits are only compared on Unix.
pub(crate) fn perm_differs(actual: u32, desired: u32) -> bool {
    cfg!(unix) && actual != desired
}
