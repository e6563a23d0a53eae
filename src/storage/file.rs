use super::compression::{CompressionAlgorithm, Compressor};
use super::{apply_to, ChunkStore, Mutation};
use crate::error::StorageError;
use crate::memory::chunk::Chunk;
use bincode::{deserialize, serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// File name of the chunk table inside the store directory.
pub const TABLE_FILE: &str = "chunks.bin";

const MAGIC: &[u8; 4] = b"HMCT";
const FORMAT_VERSION: u16 = 1;
// magic + version + compression tag + crc32
const HEADER_LEN: usize = 4 + 2 + 1 + 4;

/// Chunk table persisted as one checksummed snapshot file.
///
/// Every mutation writes a complete new snapshot next to the table and renames
/// it into place, so a crash or I/O failure leaves the previous table intact.
/// The cached copy is only replaced once the rename has succeeded.
///
/// Two stores opened on the same directory overwrite each other's snapshots
/// (last write wins); only one of them should run decay sweeps.
pub struct DurableStore {
    path: PathBuf,
    compression: CompressionAlgorithm,
    chunks: BTreeMap<String, Chunk>,
}

impl DurableStore {
    /// Opens the table under `dir`, creating an empty one if absent.
    pub fn open(dir: impl AsRef<Path>, compression: CompressionAlgorithm) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut store = Self {
            path: dir.join(TABLE_FILE),
            compression,
            chunks: BTreeMap::new(),
        };

        if store.path.exists() {
            store.chunks = store.load()?;
            info!(path = %store.path.display(), chunks = store.chunks.len(), "opened chunk table");
        } else {
            store.write_snapshot(&store.chunks)?;
            info!(path = %store.path.display(), "created chunk table");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Chunk>, StorageError> {
        let bytes = fs::read(&self.path)?;
        let chunks = decode_table(&bytes).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "chunk table failed verification");
            e
        })?;

        Ok(chunks
            .into_iter()
            .map(|chunk| (chunk.key().to_string(), chunk))
            .collect())
    }

    fn write_snapshot(&self, chunks: &BTreeMap<String, Chunk>) -> Result<(), StorageError> {
        let records: Vec<&Chunk> = chunks.values().collect();
        let encoded = serialize(&records)?;
        let checksum = crc32fast::hash(&encoded);
        let (payload, metrics) = Compressor::new(self.compression).compress(&encoded);

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(MAGIC)?;
        file.write_all(&FORMAT_VERSION.to_le_bytes())?;
        file.write_all(&[self.compression.tag()])?;
        file.write_all(&checksum.to_le_bytes())?;
        file.write_all(&payload)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;

        debug!(
            chunks = records.len(),
            bytes = metrics.compressed_size,
            ratio = metrics.compression_ratio(),
            "wrote chunk table"
        );
        Ok(())
    }

    fn commit(&mut self, next: BTreeMap<String, Chunk>) -> Result<(), StorageError> {
        self.write_snapshot(&next)?;
        self.chunks = next;
        Ok(())
    }
}

fn decode_table(bytes: &[u8]) -> Result<Vec<Chunk>, StorageError> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(StorageError::BadMagic);
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != FORMAT_VERSION {
        return Err(StorageError::UnsupportedFormat(version));
    }

    let compression = CompressionAlgorithm::from_tag(bytes[6])?;
    let expected = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]);

    let encoded = Compressor::new(compression).decompress(&bytes[HEADER_LEN..])?;
    let actual = crc32fast::hash(&encoded);
    if actual != expected {
        return Err(StorageError::ChecksumMismatch { expected, actual });
    }

    let chunks: Vec<Chunk> = deserialize(&encoded)?;
    if let Some(bad) = chunks.iter().find(|chunk| !chunk.is_consistent()) {
        return Err(StorageError::InvalidRecord {
            key: bad.key().to_string(),
        });
    }
    Ok(chunks)
}

impl ChunkStore for DurableStore {
    fn get(&self, key: &str) -> Result<Option<Chunk>, StorageError> {
        Ok(self.chunks.get(key).cloned())
    }

    fn apply(&mut self, batch: Vec<Mutation>) -> Result<(), StorageError> {
        let mut next = self.chunks.clone();
        apply_to(&mut next, batch);
        self.commit(next)
    }

    fn chunks(&self) -> Result<Vec<Chunk>, StorageError> {
        Ok(self.chunks.values().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.commit(BTreeMap::new())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.chunks.len())
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::chunk::{ChunkFields, Role, Sentiment, Tier};
    use tempfile::tempdir;

    fn chunk(key: &str, heat: u8) -> Chunk {
        let fields = ChunkFields::new(format!("text of {}", key), Role::User, Sentiment::Positive, 42);
        Chunk::create(key.to_string(), fields, heat, Tier::for_heat(heat))
    }

    #[test]
    fn test_creates_table_if_absent() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        let store = DurableStore::open(temp_dir.path().join("nested"), CompressionAlgorithm::LZ4)?;

        assert!(store.path().exists());
        assert!(store.is_empty()?);
        Ok(())
    }

    #[test]
    fn test_survives_reopen() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        {
            let mut store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4)?;
            store.put(chunk("a", 50))?;
            store.put(chunk("b", 90))?;
            store.apply(vec![Mutation::Remove("a".into())])?;
        }

        let store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::None)?;
        assert_eq!(store.len()?, 1);
        assert_eq!(store.get("b")?, Some(chunk("b", 90)));
        assert_eq!(store.get("a")?, None);
        Ok(())
    }

    #[test]
    fn test_detects_corruption() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        let path = {
            let mut store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::None)?;
            store.put(chunk("a", 50))?;
            store.path().to_path_buf()
        };

        let mut bytes = fs::read(&path)?;
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes)?;

        let result = DurableStore::open(temp_dir.path(), CompressionAlgorithm::None);
        assert!(matches!(result, Err(StorageError::ChecksumMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_records() -> Result<(), StorageError> {
        let cases = [
            r#"{"key":"x","text":"t","role":"user","sentiment":0,"heat":200,"tier":"quench","created_at":1}"#,
            r#"{"key":"x","text":"t","role":"user","sentiment":0,"heat":0,"tier":"vow","created_at":1}"#,
            r#"{"key":"x","text":"t","role":"user","sentiment":0,"heat":50,"tier":"vow","created_at":1}"#,
        ];

        for record in cases {
            let temp_dir = tempdir().unwrap();
            let store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4)?;
            let bad: Chunk = serde_json::from_str(record).unwrap();
            let mut table = BTreeMap::new();
            table.insert("a".to_string(), chunk("a", 50));
            table.insert("x".to_string(), bad);
            store.write_snapshot(&table)?;

            let result = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4);
            assert!(matches!(result, Err(StorageError::InvalidRecord { key }) if key == "x"));
        }
        Ok(())
    }

    #[test]
    fn test_loads_consistent_zero_heat_record() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        {
            let mut store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4)?;
            store.put(chunk("z", 0))?;
        }

        let store = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4)?;
        assert_eq!(store.get("z")?.map(|c| c.tier()), Some(Tier::Quench));
        Ok(())
    }

    #[test]
    fn test_rejects_foreign_file() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join(TABLE_FILE), b"not a chunk table at all")?;

        let result = DurableStore::open(temp_dir.path(), CompressionAlgorithm::LZ4);
        assert!(matches!(result, Err(StorageError::BadMagic)));
        Ok(())
    }

    #[test]
    fn test_failed_write_keeps_previous_state() -> Result<(), StorageError> {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("table");
        let mut store = DurableStore::open(&dir, CompressionAlgorithm::LZ4)?;
        store.put(chunk("a", 50))?;

        fs::remove_dir_all(&dir)?;

        let result = store.apply(vec![Mutation::Remove("a".into()), Mutation::Put(chunk("b", 10))]);
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(store.get("a")?, Some(chunk("a", 50)));
        assert_eq!(store.get("b")?, None);

        assert!(store.clear().is_err());
        assert_eq!(store.len()?, 1);
        Ok(())
    }
}
