//! Shared test utilities for the dotstate workspace.
//!
//! Dev-dependency only, never published. Because `dotstate-core` itself
//! dev-depends on this crate, use it from `tests/` directories rather than
//! from `#[cfg(test)]` modules inside the library.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`], a temporary source and destination directory pair
//! - [`prompt`]: [`ScriptedPrompter`] replaying recorded answers
//! - [`mutator`]: [`RecordingMutator`] that logs operations while applying them

pub mod mutator;
pub mod prompt;
pub mod tree;

pub use mutator::RecordingMutator;
pub use prompt::ScriptedPrompter;
pub use tree::TestTree;
