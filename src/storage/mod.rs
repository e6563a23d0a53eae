//! Backing stores for the chunk table.
//!
//! The decay engine is written once against [`ChunkStore`]; the backing is
//! either a session-scoped map ([`InMemoryStore`]) or a snapshot file that
//! survives restarts ([`DurableStore`]).

pub mod compression;
pub mod file;
pub mod memory;

pub use file::DurableStore;
pub use memory::InMemoryStore;

use crate::config::{Backend, StorageConfig};
use crate::error::StorageError;
use crate::memory::chunk::Chunk;
use std::collections::BTreeMap;

/// One change inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put(Chunk),
    Remove(String),
}

/// Keyed storage for chunks.
///
/// Implementations must apply a batch passed to [`ChunkStore::apply`] all at
/// once: after an error, readers see exactly the state from before the call.
pub trait ChunkStore {
    fn get(&self, key: &str) -> Result<Option<Chunk>, StorageError>;

    /// Inserts or overwrites the chunk at its key.
    fn put(&mut self, chunk: Chunk) -> Result<(), StorageError> {
        self.apply(vec![Mutation::Put(chunk)])
    }

    fn apply(&mut self, batch: Vec<Mutation>) -> Result<(), StorageError>;

    /// Every stored chunk, in key order.
    fn chunks(&self) -> Result<Vec<Chunk>, StorageError>;

    fn clear(&mut self) -> Result<(), StorageError>;

    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl<S: ChunkStore + ?Sized> ChunkStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Chunk>, StorageError> {
        (**self).get(key)
    }

    fn put(&mut self, chunk: Chunk) -> Result<(), StorageError> {
        (**self).put(chunk)
    }

    fn apply(&mut self, batch: Vec<Mutation>) -> Result<(), StorageError> {
        (**self).apply(batch)
    }

    fn chunks(&self) -> Result<Vec<Chunk>, StorageError> {
        (**self).chunks()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }

    fn len(&self) -> Result<usize, StorageError> {
        (**self).len()
    }
}

/// Backing store chosen at runtime from configuration.
pub type DynChunkStore = Box<dyn ChunkStore + Send>;

/// Opens the backing store described by `config`.
pub fn open_store(config: &StorageConfig) -> Result<DynChunkStore, StorageError> {
    match &config.backend {
        Backend::Memory => Ok(Box::new(InMemoryStore::new())),
        Backend::Durable { path, compression } => {
            Ok(Box::new(DurableStore::open(path, *compression)?))
        }
    }
}

pub(crate) fn apply_to(table: &mut BTreeMap<String, Chunk>, batch: Vec<Mutation>) {
    for mutation in batch {
        match mutation {
            Mutation::Put(chunk) => {
                table.insert(chunk.key().to_string(), chunk);
            }
            Mutation::Remove(key) => {
                table.remove(&key);
            }
        }
    }
}
