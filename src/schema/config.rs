/// Engine configuration.

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Construction-time settings for a `SigilEngine`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ceiling on nested template re-resolutions per `generate` call.
    pub max_depth: usize,
    /// Emit `tracing` diagnostics for each resolution step.
    pub debug: bool,
    /// Pins the random source when set.
    pub seed: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            debug: false,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file, e.g. `(max_depth: 6, seed: Some("tavern"))`.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// The numeric RNG seed derived from the string seed, if any.
    pub fn rng_seed(&self) -> Option<u64> {
        self.seed.as_deref().map(seed_from_str)
    }
}

/// Hash a string seed into a `u64`. `FxHasher` carries no per-process
/// random state, so the same string always yields the same seed.
pub fn seed_from_str(seed: &str) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    hasher.finish()
}
