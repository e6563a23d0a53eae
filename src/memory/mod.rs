//! Heat-scored conversation chunks: the model, the decay engine, and the
//! glue that turns extracted messages into chunks.

pub mod chunk;
pub mod chunker;
pub mod engine;
pub mod fingerprint;
pub mod sentiment;
pub mod shared;

pub use chunk::{Chunk, ChunkFields, Role, Sentiment, Tier};
pub use chunker::{Conversation, ExportBundle, ExtractedMessage, MemoryChunker};
pub use engine::{DecayEngine, DecayReport, Stats, TierCounts, DEFAULT_BOOST};
pub use fingerprint::fingerprint;
pub use shared::SharedEngine;
