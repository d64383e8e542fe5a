//! Filesystem metadata projection

use std::fs::Metadata;

/// The type of a filesystem object, as seen without following links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    /// Sockets, devices, FIFOs and anything else
    Other,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Dir => "directory",
            Self::Symlink => "symlink",
            Self::Other => "special file",
        };
        f.write_str(name)
    }
}

/// Metadata subset the engine needs.
///
/// Kept independent of [`std::fs::Metadata`] so a virtual filesystem can
/// produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: FileKind,
    /// Permission bits (`0o7777` range)
    pub mode: u32,
    pub len: u64,
}

impl FileInfo {
    pub fn new(kind: FileKind, mode: u32, len: u64) -> Self {
        Self { kind, mode, len }
    }

    pub fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            FileKind::Symlink
        } else if file_type.is_dir() {
            FileKind::Dir
        } else if file_type.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        };
        Self {
            kind,
            mode: mode_bits(metadata, kind),
            len: metadata.len(),
        }
    }

    /// Permission bits without setuid/setgid/sticky.
    pub fn perm(&self) -> u32 {
        self.mode & 0o777
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

#[cfg(unix)]
fn mode_bits(metadata: &Metadata, _kind: FileKind) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(metadata: &Metadata, kind: FileKind) -> u32 {
    let base = if kind == FileKind::Dir { 0o777 } else { 0o666 };
    if metadata.permissions().readonly() {
        base & !0o222
    } else {
        base
    }
}
