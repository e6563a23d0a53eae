//! Turns extracted conversation text into scored chunks.

use super::chunk::{Chunk, ChunkFields, Role};
use super::engine::{DecayEngine, DecayReport, Stats};
use super::fingerprint::fingerprint;
use super::sentiment;
use crate::config::{DecayConfig, SearchOptions};
use crate::error::Result;
use crate::storage::{ChunkStore, InMemoryStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum heat for a chunk to count as recent context.
pub const CONTEXT_MIN_HEAT: u8 = 20;
/// Upper bound on chunks attached to an export.
pub const EXPORT_LIMIT: usize = 1000;
/// Minimum heat for a chunk to be attached to an export.
pub const EXPORT_MIN_HEAT: u8 = 1;

/// A conversation as produced by the page extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub platform: String,
    #[serde(default)]
    pub messages: Vec<ExtractedMessage>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMessage {
    pub role: String,
    pub content: String,
    /// Epoch milliseconds, when the page exposes one
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Conversation {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Chunks and aggregate stats, ready to embed in an exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub chunks: Vec<Chunk>,
    pub stats: Stats,
}

pub struct MemoryChunker<S = InMemoryStore> {
    engine: DecayEngine<S>,
}

impl MemoryChunker<InMemoryStore> {
    /// Session-scoped chunker with the default decay settings.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(DecayEngine::in_memory(DecayConfig::default())?))
    }
}

impl<S: ChunkStore> MemoryChunker<S> {
    pub fn new(engine: DecayEngine<S>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &DecayEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DecayEngine<S> {
        &mut self.engine
    }

    /// Scores `text` and stores it under its content fingerprint.
    pub fn chunk(&mut self, text: &str, role: Role, timestamp_ms: i64) -> Result<Chunk> {
        let key = fingerprint(text, timestamp_ms);
        self.chunk_with_key(key, text, role, timestamp_ms)
    }

    /// Like [`MemoryChunker::chunk`], but under a key chosen by the caller.
    pub fn chunk_with_key(
        &mut self,
        key: impl Into<String>,
        text: &str,
        role: Role,
        timestamp_ms: i64,
    ) -> Result<Chunk> {
        let fields = ChunkFields::new(text, role, sentiment::score(text), timestamp_ms);
        self.engine.store(key, fields)
    }

    /// Stores one chunk per non-blank message.
    ///
    /// Messages without their own timestamp are stamped `base + index` so two
    /// identical messages in one conversation still get distinct keys.
    pub fn ingest(&mut self, conversation: &Conversation, base_timestamp_ms: i64) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::with_capacity(conversation.messages.len());

        for (index, message) in conversation.messages.iter().enumerate() {
            if message.content.trim().is_empty() {
                continue;
            }
            let timestamp = message
                .timestamp
                .unwrap_or_else(|| base_timestamp_ms.saturating_add(index as i64));
            chunks.push(self.chunk(&message.content, Role::parse(&message.role), timestamp)?);
        }

        debug!(
            platform = %conversation.platform,
            messages = conversation.messages.len(),
            chunks = chunks.len(),
            "ingested conversation"
        );
        Ok(chunks)
    }

    /// Hottest chunks worth carrying forward as context.
    pub fn recent_context(&self, top_k: usize) -> Result<Vec<Chunk>> {
        self.engine.search(SearchOptions {
            top_k,
            min_heat: CONTEXT_MIN_HEAT,
        })
    }

    /// Every chunk that still has heat, hottest first.
    pub fn export_chunks(&self) -> Result<Vec<Chunk>> {
        self.engine.search(SearchOptions {
            top_k: EXPORT_LIMIT,
            min_heat: EXPORT_MIN_HEAT,
        })
    }

    pub fn export_bundle(&self) -> Result<ExportBundle> {
        Ok(ExportBundle {
            chunks: self.export_chunks()?,
            stats: self.engine.stats()?,
        })
    }

    pub fn decay(&mut self) -> Result<DecayReport> {
        self.engine.nightly_decay()
    }

    pub fn stats(&self) -> Result<Stats> {
        self.engine.stats()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.engine.clear()
    }
}
