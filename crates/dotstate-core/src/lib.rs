//! Core engine for dotstate
//!
//! This crate provides:
//! - The [`Entry`] model: files, directories, symlinks and scripts with lazily
//!   evaluated attributes
//! - Idempotent apply through a [`dotstate_fs::Mutator`]
//! - Concrete value snapshots and tar archive output
//! - [`TargetState`]: loading the source directory and the add primitive
//! - The [`Capture`] workflow with prompting and cancellation

pub mod attr;
pub mod capture;
pub mod concrete;
pub mod encrypt;
pub mod entry;
pub mod error;
pub mod ignore;
pub mod lazy;
pub mod state;
pub mod template;

pub use attr::{DirAttributes, FileAttributes, SourceFileKind};
pub use capture::{AddFailure, AddReport, Capture, Choice, Prompter};
pub use concrete::{ConcreteValue, DirectoryValue, FileValue, ScriptValue, SymlinkValue};
pub use encrypt::Encryptor;
pub use entry::{Directory, Entry, File, FileFlags, Script, Symlink};
pub use error::{Error, Result};
pub use ignore::{IGNORE_FILE, IgnoreMatcher, PatternIgnore};
pub use lazy::Lazy;
pub use state::{AddOptions, DEFAULT_UMASK, TargetState};
pub use template::{DataTemplates, Templates, auto_template};
