use super::{apply_to, ChunkStore, Mutation};
use crate::error::StorageError;
use crate::memory::chunk::Chunk;
use std::collections::BTreeMap;

/// Session-scoped chunk table keyed by fingerprint.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    chunks: BTreeMap<String, Chunk>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChunkStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Chunk>, StorageError> {
        Ok(self.chunks.get(key).cloned())
    }

    fn put(&mut self, chunk: Chunk) -> Result<(), StorageError> {
        self.chunks.insert(chunk.key().to_string(), chunk);
        Ok(())
    }

    fn apply(&mut self, batch: Vec<Mutation>) -> Result<(), StorageError> {
        apply_to(&mut self.chunks, batch);
        Ok(())
    }

    fn chunks(&self) -> Result<Vec<Chunk>, StorageError> {
        Ok(self.chunks.values().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.chunks.clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.chunks.len())
    }
}
