//! Read-only filesystem access and the walk primitive
//!
//! Everything the engine learns about a filesystem goes through
//! [`FileSystem`], so tests and alternative backends can substitute their
//! own view. Writes never go through here; see [`crate::Mutator`].

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, FileInfo, Result};

/// Read-only queries over a (possibly virtual) filesystem.
pub trait FileSystem {
    /// Metadata without following a final symlink.
    fn lstat(&self, path: &Path) -> Result<FileInfo>;

    /// Metadata following symlinks.
    fn stat(&self, path: &Path) -> Result<FileInfo>;

    /// The raw value stored in a symlink.
    fn read_link(&self, path: &Path) -> Result<String>;

    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;

    /// Names of the children of a directory, sorted.
    fn read_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// Pre-order traversal rooted at `root`, including `root` itself.
    ///
    /// Symlinks are reported, never followed. Siblings are visited in
    /// file name order.
    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Walk + 'a>;
}

/// One node yielded by a [`Walk`].
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub info: FileInfo,
    /// Zero for the walk root
    pub depth: usize,
}

/// An in-progress traversal.
pub trait Walk: Iterator<Item = Result<WalkEntry>> {
    /// Do not descend into the directory yielded last.
    fn skip_subtree(&mut self);
}

/// What a visitor wants the walk to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    Continue,
    /// Skip the children of the visited directory (no-op for non-directories)
    SkipSubtree,
    /// Stop the whole walk without an error
    Abort,
}

/// How a walk driven by [`walk_with`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    Completed,
    Aborted,
}

/// Drive a walk with a visitor returning a three-way [`WalkAction`].
///
/// Traversal errors and visitor errors stop the walk and are returned.
/// [`WalkAction::Abort`] stops it and reports [`WalkOutcome::Aborted`].
pub fn walk_with<E, F>(
    fs: &dyn FileSystem,
    root: &Path,
    mut visit: F,
) -> std::result::Result<WalkOutcome, E>
where
    E: From<Error>,
    F: FnMut(&WalkEntry) -> std::result::Result<WalkAction, E>,
{
    let mut walk = fs.walk(root);
    while let Some(entry) = walk.next() {
        let entry = entry?;
        match visit(&entry)? {
            WalkAction::Continue => {}
            WalkAction::SkipSubtree => {
                if entry.info.is_dir() {
                    walk.skip_subtree();
                }
            }
            WalkAction::Abort => {
                tracing::debug!(path = %entry.path.display(), "walk aborted");
                return Ok(WalkOutcome::Aborted);
            }
        }
    }
    Ok(WalkOutcome::Completed)
}

/// [`FileSystem`] backed by the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn lstat(&self, path: &Path) -> Result<FileInfo> {
        fs::symlink_metadata(path)
            .map(|metadata| FileInfo::from_metadata(&metadata))
            .map_err(|e| Error::io(path, e))
    }

    fn stat(&self, path: &Path) -> Result<FileInfo> {
        fs::metadata(path)
            .map(|metadata| FileInfo::from_metadata(&metadata))
            .map_err(|e| Error::io(path, e))
    }

    fn read_link(&self, path: &Path) -> Result<String> {
        fs::read_link(path)
            .map(|target| target.to_string_lossy().into_owned())
            .map_err(|e| Error::io(path, e))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| Error::io(path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
            let entry = entry.map_err(|e| Error::io(path, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn walk<'a>(&'a self, root: &Path) -> Box<dyn Walk + 'a> {
        let inner = WalkDir::new(root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter();
        Box::new(RealWalk { inner })
    }
}

struct RealWalk {
    inner: walkdir::IntoIter,
}

impl Iterator for RealWalk {
    type Item = Result<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                return Some(Err(Error::io(path, err.into())));
            }
        };
        let info = match entry.metadata() {
            Ok(metadata) => FileInfo::from_metadata(&metadata),
            Err(err) => return Some(Err(Error::io(entry.path(), err.into()))),
        };
        let depth = entry.depth();
        Some(Ok(WalkEntry {
            path: entry.into_path(),
            info,
            depth,
        }))
    }
}

impl Walk for RealWalk {
    fn skip_subtree(&mut self) {
        self.inner.skip_current_dir();
    }
}
