//! Configuration file loading
//!
//! Settings come from `dotstate.toml` (or `.json`/`.yaml`) in the user's
//! config directory, overridden by command-line flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use dotstate_core::{DEFAULT_UMASK, TargetState};
use dotstate_fs::{ConfigStore, NormalizedPath, RealFs};

use crate::error::{CliError, Result};

/// Default config file name inside `<config dir>/dotstate/`.
pub const CONFIG_FILE: &str = "dotstate.toml";

/// Contents of the config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_dir: Option<PathBuf>,
    pub dest_dir: Option<PathBuf>,
    pub umask: Option<u32>,
    pub follow: bool,
    /// Template data
    pub data: BTreeMap<String, String>,
}

impl Config {
    /// Load `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("dotstate").join(CONFIG_FILE),
                None => return Ok(Self::default()),
            },
        };
        match ConfigStore::new().load(&NormalizedPath::new(&path)) {
            Ok(config) => Ok(config),
            Err(err) if err.is_not_found() => {
                tracing::debug!(path = %path.display(), "no config file");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub umask: u32,
    pub follow: bool,
    pub data: BTreeMap<String, String>,
}

impl Settings {
    /// Merge the config file with flag overrides.
    pub fn resolve(
        config: Config,
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
    ) -> Result<Self> {
        let home = dirs::home_dir();
        let source_dir = match source.or(config.source_dir) {
            Some(dir) => dir,
            None => home
                .as_ref()
                .map(|home| home.join(".local").join("share").join("dotstate"))
                .ok_or_else(|| CliError::user("Cannot determine the source directory; pass --source"))?,
        };
        let dest_dir = match destination.or(config.dest_dir) {
            Some(dir) => dir,
            None => home.ok_or_else(|| {
                CliError::user("Cannot determine the home directory; pass --destination")
            })?,
        };

        Ok(Self {
            source_dir: std::path::absolute(source_dir)?,
            dest_dir: std::path::absolute(dest_dir)?,
            umask: config.umask.unwrap_or(DEFAULT_UMASK),
            follow: config.follow,
            data: config.data,
        })
    }

    /// An empty target state configured from these settings.
    pub fn target_state(&self) -> TargetState {
        TargetState::new(&self.source_dir, &self.dest_dir)
            .with_umask(self.umask)
            .with_data(self.data.clone())
    }

    /// The target state read from the source directory.
    pub fn load_state(&self) -> Result<TargetState> {
        let mut state = self.target_state();
        state.read(&RealFs)?;
        Ok(state)
    }
}
