use super::chunk::{Chunk, ChunkFields};
use super::engine::{DecayEngine, DecayReport, Stats};
use crate::config::SearchOptions;
use crate::error::Result;
use crate::storage::{ChunkStore, InMemoryStore};
use parking_lot::Mutex;
use std::sync::Arc;

/// Thread-safe handle to a decay engine.
///
/// Every operation, reads included, holds one lock for its whole duration, so
/// a search never observes a half-applied sweep.
pub struct SharedEngine<S = InMemoryStore> {
    inner: Arc<Mutex<DecayEngine<S>>>,
}

impl<S> Clone for SharedEngine<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ChunkStore> SharedEngine<S> {
    pub fn new(engine: DecayEngine<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    pub fn store(&self, key: impl Into<String>, fields: ChunkFields) -> Result<Chunk> {
        self.inner.lock().store(key, fields)
    }

    pub fn get(&self, key: &str) -> Result<Option<Chunk>> {
        self.inner.lock().get(key)
    }

    pub fn boost(&self, key: &str, amount: u32) -> Result<Option<Chunk>> {
        self.inner.lock().boost(key, amount)
    }

    pub fn nightly_decay(&self) -> Result<DecayReport> {
        self.inner.lock().nightly_decay()
    }

    pub fn search(&self, options: SearchOptions) -> Result<Vec<Chunk>> {
        self.inner.lock().search(options)
    }

    pub fn stats(&self) -> Result<Stats> {
        self.inner.lock().stats()
    }

    pub fn clear(&self) -> Result<()> {
        self.inner.lock().clear()
    }

    pub fn size(&self) -> Result<usize> {
        self.inner.lock().size()
    }

    /// Runs `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut DecayEngine<S>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
