//! Heat-based decay engine over a [`ChunkStore`].

use super::chunk::{Chunk, ChunkFields, Tier};
use crate::config::{DecayConfig, SearchOptions, StorageConfig};
use crate::error::Result;
use crate::storage::{open_store, ChunkStore, DynChunkStore, InMemoryStore, Mutation};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// Heat added by a boost when the caller has no opinion.
pub const DEFAULT_BOOST: u32 = 10;

/// Stores chunks and drives their heat: reset on store, raise on boost,
/// lower on each decay sweep.
///
/// Decay sweeps are not rate limited. Callers decide how often to run
/// [`DecayEngine::nightly_decay`] (once per session, once per day); calling it
/// twice decays twice.
#[derive(Debug)]
pub struct DecayEngine<S = InMemoryStore> {
    config: DecayConfig,
    store: S,
}

/// Outcome of one decay sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayReport {
    /// Chunks that lost heat and remain stored
    pub cooled: usize,
    /// Chunks that reached zero heat and were removed
    pub evicted: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub vow: usize,
    pub temper: usize,
    pub quench: usize,
}

/// Aggregate view of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub avg_heat: f64,
    pub hottest: Option<Chunk>,
    pub by_tier: TierCounts,
}

impl DecayEngine<InMemoryStore> {
    /// Creates an engine whose chunks live only as long as the process.
    pub fn in_memory(config: DecayConfig) -> Result<Self> {
        Self::new(config, InMemoryStore::new())
    }
}

impl DecayEngine<DynChunkStore> {
    /// Creates an engine on the backend named by `storage`.
    pub fn open(config: DecayConfig, storage: &StorageConfig) -> Result<Self> {
        config.validate()?;
        let store = open_store(storage)?;
        Self::new(config, store)
    }
}

impl<S: ChunkStore> DecayEngine<S> {
    pub fn new(config: DecayConfig, store: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    /// Inserts or overwrites the chunk at `key`, resetting it to the
    /// configured starting heat and tier.
    pub fn store(&mut self, key: impl Into<String>, fields: ChunkFields) -> Result<Chunk> {
        let chunk = Chunk::create(key.into(), fields, self.config.start_heat, self.config.tier);
        self.store.put(chunk.clone())?;
        debug!(key = chunk.key(), heat = chunk.heat(), "stored chunk");
        Ok(chunk)
    }

    pub fn get(&self, key: &str) -> Result<Option<Chunk>> {
        Ok(self.store.get(key)?)
    }

    /// Raises a chunk's heat by `amount` (capped at 100). Missing keys are ignored.
    pub fn boost(&mut self, key: &str, amount: u32) -> Result<Option<Chunk>> {
        let Some(mut chunk) = self.store.get(key)? else {
            return Ok(None);
        };

        chunk.warm(amount);
        self.store.put(chunk.clone())?;
        debug!(key, heat = chunk.heat(), tier = %chunk.tier(), "boosted chunk");
        Ok(Some(chunk))
    }

    /// Cools every chunk by the configured amount and evicts the ones that
    /// reach zero. The sweep is committed to the store as a single batch.
    pub fn nightly_decay(&mut self) -> Result<DecayReport> {
        let mut report = DecayReport::default();
        let mut batch = Vec::new();

        for mut chunk in self.store.chunks()? {
            chunk.cool(self.config.cooling);
            if chunk.is_cold() {
                report.evicted += 1;
                batch.push(Mutation::Remove(chunk.key().to_string()));
            } else {
                report.cooled += 1;
                batch.push(Mutation::Put(chunk));
            }
        }

        if !batch.is_empty() {
            self.store.apply(batch)?;
        }
        info!(cooled = report.cooled, evicted = report.evicted, "decay sweep finished");
        Ok(report)
    }

    /// Hottest chunks with at least `min_heat`, newest first among equals.
    pub fn search(&self, options: SearchOptions) -> Result<Vec<Chunk>> {
        let mut candidates: Vec<Chunk> = self
            .store
            .chunks()?
            .into_iter()
            .filter(|chunk| chunk.heat() >= options.min_heat)
            .collect();

        candidates.sort_by(rank);
        candidates.truncate(options.top_k);
        Ok(candidates)
    }

    pub fn stats(&self) -> Result<Stats> {
        let chunks = self.store.chunks()?;

        let mut by_tier = TierCounts::default();
        for chunk in &chunks {
            match chunk.tier() {
                Tier::Vow => by_tier.vow += 1,
                Tier::Temper => by_tier.temper += 1,
                Tier::Quench => by_tier.quench += 1,
            }
        }

        let avg_heat = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.heat() as f64).sum::<f64>() / chunks.len() as f64
        };

        Ok(Stats {
            total: chunks.len(),
            avg_heat,
            hottest: chunks.iter().min_by(|a, b| rank(a, b)).cloned(),
            by_tier,
        })
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        info!("cleared chunk store");
        Ok(())
    }

    pub fn size(&self) -> Result<usize> {
        Ok(self.store.len()?)
    }
}

/// Retrieval order: heat descending, then newest first, then key.
fn rank(a: &Chunk, b: &Chunk) -> Ordering {
    b.heat()
        .cmp(&a.heat())
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| a.key().cmp(b.key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::memory::chunk::{Role, Sentiment};

    fn fields(text: &str, created_at: i64) -> ChunkFields {
        ChunkFields::new(text, Role::User, Sentiment::Neutral, created_at)
    }

    fn engine() -> DecayEngine {
        DecayEngine::in_memory(DecayConfig::default()).unwrap()
    }

    #[test]
    fn test_store_resets_heat() {
        let mut engine = engine();
        let stored = engine.store("k", fields("hello", 1)).unwrap();
        engine.boost("k", 30).unwrap();

        let restored = engine.store("k", fields("hello", 1)).unwrap();
        assert_eq!(restored, stored);
        assert_eq!(engine.get("k").unwrap().unwrap().heat(), 50);
        assert_eq!(engine.size().unwrap(), 1);
    }

    #[test]
    fn test_boost_missing_key_is_noop() {
        let mut engine = engine();
        assert_eq!(engine.boost("missing", DEFAULT_BOOST).unwrap(), None);
        assert_eq!(engine.size().unwrap(), 0);
    }

    #[test]
    fn test_boost_clamps_at_max() {
        let mut engine = engine();
        engine.store("k", fields("hello", 1)).unwrap();
        let boosted = engine.boost("k", 500).unwrap().unwrap();
        assert_eq!(boosted.heat(), 100);
        assert_eq!(boosted.tier(), Tier::Vow);
    }

    #[test]
    fn test_decay_crosses_tiers() {
        let mut engine = engine();
        engine.store("k", fields("hello", 1)).unwrap();
        engine.boost("k", 32).unwrap(); // 82, vow

        engine.nightly_decay().unwrap();
        let chunk = engine.get("k").unwrap().unwrap();
        assert_eq!(chunk.heat(), 77);
        assert_eq!(chunk.tier(), Tier::Temper);
    }

    #[test]
    fn test_decay_report_counts() {
        let config = DecayConfig {
            cooling: 30,
            ..DecayConfig::default()
        };
        let mut engine = DecayEngine::in_memory(config).unwrap();
        engine.store("a", fields("a", 1)).unwrap();
        engine.store("b", fields("b", 2)).unwrap();
        engine.boost("b", 20).unwrap();

        let report = engine.nightly_decay().unwrap();
        assert_eq!(report, DecayReport { cooled: 2, evicted: 0 });

        let report = engine.nightly_decay().unwrap();
        assert_eq!(report, DecayReport { cooled: 1, evicted: 1 });
        assert_eq!(engine.get("b").unwrap().unwrap().heat(), 10);
    }

    #[test]
    fn test_zero_cooling_keeps_heat() {
        let config = DecayConfig {
            cooling: 0,
            ..DecayConfig::default()
        };
        let mut engine = DecayEngine::in_memory(config).unwrap();
        engine.store("k", fields("hello", 1)).unwrap();
        engine.nightly_decay().unwrap();
        assert_eq!(engine.get("k").unwrap().unwrap().heat(), 50);
    }

    #[test]
    fn test_search_tie_breaks() {
        let mut engine = engine();
        engine.store("b", fields("same", 5)).unwrap();
        engine.store("a", fields("same", 5)).unwrap();
        engine.store("c", fields("newer", 9)).unwrap();

        let keys: Vec<String> = engine
            .search(SearchOptions::default())
            .unwrap()
            .iter()
            .map(|c| c.key().to_string())
            .collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_search_truncates() {
        let mut engine = engine();
        for i in 0..10 {
            engine.store(format!("k{}", i), fields("x", i)).unwrap();
        }
        let top = engine.search(SearchOptions { top_k: 3, min_heat: 0 }).unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].created_at(), 9);

        assert!(engine.search(SearchOptions { top_k: 0, min_heat: 0 }).unwrap().is_empty());
    }

    #[test]
    fn test_stats_hottest() {
        let mut engine = engine();
        engine.store("a", fields("a", 1)).unwrap();
        engine.store("b", fields("b", 2)).unwrap();
        engine.boost("a", 40).unwrap();

        let stats = engine.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.avg_heat, 70.0);
        assert_eq!(stats.hottest.unwrap().key(), "a");
        assert_eq!(stats.by_tier, TierCounts { vow: 1, temper: 1, quench: 0 });
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = DecayConfig {
            tier: Tier::Temper,
            start_heat: 200,
            cooling: 5,
        };
        assert!(matches!(
            DecayEngine::in_memory(config),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_clear() {
        let mut engine = engine();
        engine.store("a", fields("a", 1)).unwrap();
        engine.clear().unwrap();
        assert_eq!(engine.size().unwrap(), 0);
        assert_eq!(engine.get("a").unwrap(), None);
    }
}
