//! Simulator state and parameter files

use anyhow::{Context, Result};
use liquidity::{Bank, MemKeeper, Params};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// State file used when `--state` is not given
pub const DEFAULT_STATE_FILE: &str = "liquidity-state.json";

pub struct SimConfig {
    pub state_path: PathBuf,
    pub params_path: Option<PathBuf>,
}

impl SimConfig {
    pub fn new(state_path: PathBuf, params_path: Option<PathBuf>) -> Self {
        Self {
            state_path,
            params_path,
        }
    }

    /// Load the persisted keeper, or start an empty one from the params file
    ///
    /// Params are fixed once the state file exists; a later `--params` is
    /// ignored with a warning.
    pub fn load_keeper(&self) -> Result<MemKeeper> {
        if self.state_path.exists() {
            if let Some(params_path) = &self.params_path {
                warn!(
                    "ignoring {}: params are already stored in {}",
                    params_path.display(),
                    self.state_path.display()
                );
            }
            return load_state(&self.state_path);
        }

        let params = match &self.params_path {
            Some(path) => load_params(path)?,
            None => Params::default(),
        };
        debug!("starting new state at {}", self.state_path.display());
        Ok(MemKeeper::new(params, Bank::new()))
    }

    pub fn save_keeper(&self, keeper: &MemKeeper) -> Result<()> {
        save_state(&self.state_path, keeper)
    }
}

/// Load module params from a TOML file
pub fn load_params(path: &Path) -> Result<Params> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file: {}", path.display()))?;

    toml::from_str(&data)
        .with_context(|| format!("Failed to parse params TOML: {}", path.display()))
}

/// Load a keeper snapshot and check its store invariants
pub fn load_state(path: &Path) -> Result<MemKeeper> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;

    let keeper: MemKeeper = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse state JSON: {}", path.display()))?;

    keeper
        .validate()
        .with_context(|| format!("Corrupted state in: {}", path.display()))?;
    Ok(keeper)
}

/// Write a keeper snapshot, replacing the old file only once the new one is complete
pub fn save_state(path: &Path, keeper: &MemKeeper) -> Result<()> {
    let data = serde_json::to_string_pretty(keeper).context("Failed to serialize state")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace state file: {}", path.display()))
}
