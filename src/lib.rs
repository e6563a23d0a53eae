//! Content-addressed store of conversation chunks whose heat decays over
//! time, rises on access, and decides how chunks are tiered and ranked.

pub mod config;
pub mod error;
pub mod memory;
pub mod storage;

pub use config::{Backend, DecayConfig, SearchOptions, StorageConfig};
pub use error::{Error, Result, StorageError};
pub use memory::{
    Chunk, ChunkFields, Conversation, DecayEngine, DecayReport, ExportBundle, MemoryChunker, Role,
    Sentiment, SharedEngine, Stats, Tier, TierCounts,
};
pub use storage::{ChunkStore, DurableStore, InMemoryStore};
