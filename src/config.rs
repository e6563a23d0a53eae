//! Engine, storage and retrieval configuration.

use crate::error::{Error, Result};
use crate::memory::chunk::{Tier, MAX_HEAT};
use crate::storage::compression::CompressionAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the decay engine, fixed for the life of one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Tier assigned to freshly stored chunks
    pub tier: Tier,
    /// Heat assigned to freshly stored chunks (0-100)
    pub start_heat: u8,
    /// Heat removed from every chunk per decay sweep
    pub cooling: u32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            tier: Tier::Temper,
            start_heat: 50,
            cooling: 5,
        }
    }
}

impl DecayConfig {
    /// Rejects settings that would store chunks violating the heat/tier invariants.
    pub fn validate(&self) -> Result<()> {
        if self.start_heat > MAX_HEAT {
            return Err(Error::InvalidConfiguration(format!(
                "start_heat must be within 0..={}, got {}",
                MAX_HEAT, self.start_heat
            )));
        }
        let expected = Tier::for_heat(self.start_heat);
        if self.tier != expected {
            return Err(Error::InvalidConfiguration(format!(
                "tier {} does not match start_heat {} (which is {})",
                self.tier, self.start_heat, expected
            )));
        }
        Ok(())
    }
}

/// Which backing store holds the chunk table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    /// Session-scoped map, lost when the process exits
    Memory,
    /// Snapshot file under `path`, survives restarts
    Durable {
        path: PathBuf,
        #[serde(default)]
        compression: CompressionAlgorithm,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
        }
    }
}

impl StorageConfig {
    pub fn durable(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Durable {
                path: path.into(),
                compression: CompressionAlgorithm::default(),
            },
        }
    }
}

/// Filters for ranked retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub top_k: usize,
    pub min_heat: u8,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_heat: 20,
        }
    }
}
