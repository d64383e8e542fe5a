//! Serializable snapshots of resolved entries
//!
//! Field names are part of the external format: `type`, `sourcePath`,
//! `targetPath`, `template`, `linkName` and friends.

use std::path::PathBuf;

use serde::Serialize;

/// Read-only projection of one entry, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConcreteValue {
    File(FileValue),
    Directory(DirectoryValue),
    Symlink(SymlinkValue),
    Script(ScriptValue),
}

impl ConcreteValue {
    pub fn target_path(&self) -> &PathBuf {
        match self {
            Self::File(value) => &value.target_path,
            Self::Directory(value) => &value.target_path,
            Self::Symlink(value) => &value.target_path,
            Self::Script(value) => &value.target_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValue {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub empty: bool,
    pub encrypted: bool,
    pub perm: u32,
    pub template: bool,
    pub contents: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryValue {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub exact: bool,
    pub perm: u32,
    /// Present only for recursive projections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<ConcreteValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymlinkValue {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub template: bool,
    pub link_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptValue {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
    pub once: bool,
    pub template: bool,
    pub contents: String,
}
