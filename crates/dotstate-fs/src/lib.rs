//! Filesystem layer for dotstate
//!
//! Provides normalized paths, a read-only filesystem accessor, the walk
//! primitive, and the [`Mutator`] capability through which every destination
//! side effect flows.

pub mod config;
pub mod error;
pub mod info;
pub mod io;
pub mod mutator;
pub mod path;
pub mod system;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use info::{FileInfo, FileKind};
pub use mutator::{DryRunMutator, FsMutator, Mutator, MutatorOp, VerboseMutator};
pub use path::{NormalizedPath, validate_relative_path};
pub use system::{FileSystem, RealFs, Walk, WalkAction, WalkEntry, WalkOutcome, walk_with};
