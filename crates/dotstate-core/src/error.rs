//! Error types for dotstate-core

use std::path::PathBuf;
use std::sync::Arc;

use dotstate_fs::FileKind;

/// Result type for dotstate-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dotstate-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cached failure of a lazily computed attribute.
    ///
    /// Every read of the same attribute returns a clone of the same `Arc`.
    #[error(transparent)]
    Evaluation(Arc<Error>),

    /// A lazy computation panicked on an earlier read
    #[error("Lazy value was poisoned by an earlier panic")]
    Poisoned,

    /// Template rendering failed
    #[error("Template {name}: {message}")]
    Template { name: String, message: String },

    /// Encryption or decryption failed, or no encryptor is configured
    #[error("Encryption error for {name}: {message}")]
    Encryption { name: String, message: String },

    /// The destination holds a different kind of object than the entry describes
    #[error("{path}: expected {expected}, found {found}")]
    StateMismatch {
        path: PathBuf,
        expected: FileKind,
        found: FileKind,
    },

    /// A path given for capture is not under the destination directory
    #[error("{path} is not in destination directory {dest_dir}")]
    NotInDestDir { path: PathBuf, dest_dir: PathBuf },

    /// Sockets, devices and the like cannot be managed
    #[error("{path}: cannot manage {kind}")]
    UnsupportedFileType { path: PathBuf, kind: FileKind },

    /// Two source names decode to the same target name
    #[error("Duplicate target {target_name}: {first} and {second}")]
    DuplicateTarget {
        target_name: String,
        first: String,
        second: String,
    },

    /// The target is not managed by the source state
    #[error("{target_name} is not managed")]
    NotManaged { target_name: String },

    /// Invalid ignore pattern
    #[error("Invalid ignore pattern {pattern:?}: {message}")]
    IgnorePattern { pattern: String, message: String },

    /// Prompt failed or returned an unexpected answer
    #[error("Prompt error: {message}")]
    Prompt { message: String },

    /// Writing to an archive failed
    #[error("Archive error at {name}: {source}")]
    Archive {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from dotstate-fs
    #[error(transparent)]
    Fs(#[from] dotstate_fs::Error),
}

impl Error {
    /// Returns true when the root cause is a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Fs(err) => err.is_not_found(),
            Self::Evaluation(err) => err.is_not_found(),
            _ => false,
        }
    }

    pub fn archive(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Archive {
            name: name.into(),
            source,
        }
    }
}
