//! The side-effect capability
//!
//! Every destination and source mutation goes through a [`Mutator`]. The
//! engine takes one by reference, so dry-run and verbose behavior is a
//! matter of passing a different implementation.

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{Error, Result, io};

/// Performs filesystem side effects on behalf of the engine.
pub trait Mutator {
    /// Atomically replace `path` with a regular file.
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()>;

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()>;

    /// Remove a file, symlink or directory tree. A missing path is not an error.
    fn remove_all(&self, path: &Path) -> Result<()>;

    fn chmod(&self, path: &Path, perm: u32) -> Result<()>;

    /// Make `path` a symlink to `target`, replacing a file or link already there.
    fn write_symlink(&self, target: &str, path: &Path) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Execute `contents` as a program with `dir` as working directory.
    fn run_script(&self, name: &str, contents: &[u8], dir: &Path) -> Result<()>;
}

/// One mutation, as recorded by [`DryRunMutator`] and printed by
/// [`VerboseMutator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutatorOp {
    WriteFile { path: PathBuf, len: usize, perm: u32 },
    Mkdir { path: PathBuf, perm: u32 },
    RemoveAll { path: PathBuf },
    Chmod { path: PathBuf, perm: u32 },
    WriteSymlink { target: String, path: PathBuf },
    Rename { from: PathBuf, to: PathBuf },
    RunScript { name: String, dir: PathBuf },
}

impl MutatorOp {
    /// The path the operation changes.
    pub fn path(&self) -> &Path {
        match self {
            Self::WriteFile { path, .. }
            | Self::Mkdir { path, .. }
            | Self::RemoveAll { path }
            | Self::Chmod { path, .. }
            | Self::WriteSymlink { path, .. } => path,
            Self::Rename { to, .. } => to,
            Self::RunScript { dir, .. } => dir,
        }
    }
}

/// Shell-like rendering, one command per operation.
impl std::fmt::Display for MutatorOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteFile { path, len, perm } => {
                write!(f, "install -m {:o} /dev/null {} # {} bytes", perm, path.display(), len)
            }
            Self::Mkdir { path, perm } => write!(f, "mkdir -m {:o} {}", perm, path.display()),
            Self::RemoveAll { path } => write!(f, "rm -rf {}", path.display()),
            Self::Chmod { path, perm } => write!(f, "chmod {:o} {}", perm, path.display()),
            Self::WriteSymlink { target, path } => {
                write!(f, "ln -sf {} {}", target, path.display())
            }
            Self::Rename { from, to } => write!(f, "mv {} {}", from.display(), to.display()),
            Self::RunScript { name, dir } => write!(f, "( cd {} && {} )", dir.display(), name),
        }
    }
}

/// [`Mutator`] that changes the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsMutator;

impl FsMutator {
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for FsMutator {
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()> {
        io::write_atomic(path, contents, perm)
    }

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(perm);
        }
        builder.create(path).map_err(|e| Error::io(path, e))?;
        // The process umask may have masked bits off
        io::set_permissions(path, perm)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::io(path, e)),
        };
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| Error::io(path, e))
    }

    fn chmod(&self, path: &Path, perm: u32) -> Result<()> {
        io::set_permissions(path, perm)
    }

    fn write_symlink(&self, target: &str, path: &Path) -> Result<()> {
        let temp_name = format!(
            ".{}.{}.link",
            path.file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = path.with_file_name(temp_name);
        // Clear a leftover from an interrupted run
        match fs::remove_file(&temp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&temp_path, e)),
        }

        create_symlink(target, &temp_path).map_err(|e| Error::io(&temp_path, e))?;
        // rename(2) replaces files and links but refuses to clobber a directory
        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::io(path, e)
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| Error::io(to, e))
    }

    fn run_script(&self, name: &str, contents: &[u8], dir: &Path) -> Result<()> {
        let prefix = format!(
            "{}.",
            Path::new(name)
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default()
        );
        let mut script = tempfile::Builder::new()
            .prefix(&prefix)
            .tempfile()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        script
            .write_all(contents)
            .map_err(|e| Error::io(script.path(), e))?;
        // Close the handle before exec to avoid ETXTBSY
        let script_path = script.into_temp_path();
        io::set_permissions(&script_path, 0o700)?;

        let status = Command::new(&script_path)
            .current_dir(dir)
            .status()
            .map_err(|e| Error::io(&script_path, e))?;
        if !status.success() {
            return Err(Error::ScriptFailed {
                name: name.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &str, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &str, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

/// [`Mutator`] that records operations instead of performing them.
#[derive(Debug, Default)]
pub struct DryRunMutator {
    ops: RefCell<Vec<MutatorOp>>,
}

impl DryRunMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations recorded so far, in call order.
    pub fn ops(&self) -> Vec<MutatorOp> {
        self.ops.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    fn record(&self, op: MutatorOp) -> Result<()> {
        self.ops.borrow_mut().push(op);
        Ok(())
    }
}

impl Mutator for DryRunMutator {
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()> {
        self.record(MutatorOp::WriteFile {
            path: path.to_path_buf(),
            len: contents.len(),
            perm,
        })
    }

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        self.record(MutatorOp::Mkdir {
            path: path.to_path_buf(),
            perm,
        })
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        self.record(MutatorOp::RemoveAll {
            path: path.to_path_buf(),
        })
    }

    fn chmod(&self, path: &Path, perm: u32) -> Result<()> {
        self.record(MutatorOp::Chmod {
            path: path.to_path_buf(),
            perm,
        })
    }

    fn write_symlink(&self, target: &str, path: &Path) -> Result<()> {
        self.record(MutatorOp::WriteSymlink {
            target: target.to_string(),
            path: path.to_path_buf(),
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.record(MutatorOp::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
    }

    fn run_script(&self, name: &str, _contents: &[u8], dir: &Path) -> Result<()> {
        self.record(MutatorOp::RunScript {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

/// [`Mutator`] that prints each operation before delegating to `inner`.
pub struct VerboseMutator<M, W = std::io::Stdout> {
    inner: M,
    out: RefCell<W>,
}

impl<M: Mutator> VerboseMutator<M> {
    pub fn new(inner: M) -> Self {
        Self::with_writer(inner, std::io::stdout())
    }
}

impl<M: Mutator, W: Write> VerboseMutator<M, W> {
    pub fn with_writer(inner: M, out: W) -> Self {
        Self {
            inner,
            out: RefCell::new(out),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_parts(self) -> (M, W) {
        (self.inner, self.out.into_inner())
    }

    fn announce(&self, op: MutatorOp) -> Result<()> {
        tracing::info!(op = %op, "mutate");
        writeln!(self.out.borrow_mut(), "{op}").map_err(|e| Error::io(op.path(), e))
    }
}

impl<M: Mutator, W: Write> Mutator for VerboseMutator<M, W> {
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()> {
        self.announce(MutatorOp::WriteFile {
            path: path.to_path_buf(),
            len: contents.len(),
            perm,
        })?;
        self.inner.write_file(path, contents, perm)
    }

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        self.announce(MutatorOp::Mkdir {
            path: path.to_path_buf(),
            perm,
        })?;
        self.inner.mkdir(path, perm)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        self.announce(MutatorOp::RemoveAll {
            path: path.to_path_buf(),
        })?;
        self.inner.remove_all(path)
    }

    fn chmod(&self, path: &Path, perm: u32) -> Result<()> {
        self.announce(MutatorOp::Chmod {
            path: path.to_path_buf(),
            perm,
        })?;
        self.inner.chmod(path, perm)
    }

    fn write_symlink(&self, target: &str, path: &Path) -> Result<()> {
        self.announce(MutatorOp::WriteSymlink {
            target: target.to_string(),
            path: path.to_path_buf(),
        })?;
        self.inner.write_symlink(target, path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.announce(MutatorOp::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })?;
        self.inner.rename(from, to)
    }

    fn run_script(&self, name: &str, contents: &[u8], dir: &Path) -> Result<()> {
        self.announce(MutatorOp::RunScript {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        })?;
        self.inner.run_script(name, contents, dir)
    }
}

impl<M: Mutator + ?Sized> Mutator for &M {
    fn write_file(&self, path: &Path, contents: &[u8], perm: u32) -> Result<()> {
        (**self).write_file(path, contents, perm)
    }

    fn mkdir(&self, path: &Path, perm: u32) -> Result<()> {
        (**self).mkdir(path, perm)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        (**self).remove_all(path)
    }

    fn chmod(&self, path: &Path, perm: u32) -> Result<()> {
        (**self).chmod(path, perm)
    }

    fn write_symlink(&self, target: &str, path: &Path) -> Result<()> {
        (**self).write_symlink(target, path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        (**self).rename(from, to)
    }

    fn run_script(&self, name: &str, contents: &[u8], dir: &Path) -> Result<()> {
        (**self).run_script(name, contents, dir)
    }
}
