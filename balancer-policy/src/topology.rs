use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, ShardId, ShardInfo};

/// A point-in-time view of one namespace: per-shard facts plus the chunks
/// each shard owns.
///
/// The snapshot is read-only once built. Both mappings are keyed in shard id
/// order and every chunk list is sorted by range, which is what makes the
/// policy's tie-breaks independent of how the caller assembled the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSnapshot")]
pub struct TopologySnapshot {
    namespace: String,
    shards: BTreeMap<ShardId, ShardInfo>,
    chunks: BTreeMap<ShardId, Vec<Chunk>>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    namespace: String,
    #[serde(default)]
    shards: BTreeMap<ShardId, ShardInfo>,
    #[serde(default)]
    chunks: BTreeMap<ShardId, Vec<Chunk>>,
}

impl From<RawSnapshot> for TopologySnapshot {
    fn from(raw: RawSnapshot) -> Self {
        TopologySnapshot::new(raw.namespace, raw.shards, raw.chunks)
    }
}

impl TopologySnapshot {
    pub fn new(
        namespace: impl Into<String>,
        shards: BTreeMap<ShardId, ShardInfo>,
        mut chunks: BTreeMap<ShardId, Vec<Chunk>>,
    ) -> Self {
        for list in chunks.values_mut() {
            list.sort();
        }
        Self {
            namespace: namespace.into(),
            shards,
            chunks,
        }
    }

    pub fn builder(namespace: impl Into<String>) -> TopologyBuilder {
        TopologyBuilder {
            namespace: namespace.into(),
            shards: BTreeMap::new(),
            chunks: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every shard named by either mapping, ascending.
    pub fn shard_ids(&self) -> impl Iterator<Item = &str> {
        self.shards
            .keys()
            .chain(self.chunks.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
    }

    /// Facts for `shard`. A shard that only appears in the chunk mapping has
    /// no recorded limits and gets the defaults: unlimited, not draining,
    /// nothing pending.
    pub fn info(&self, shard: &str) -> ShardInfo {
        self.shards.get(shard).copied().unwrap_or_default()
    }

    /// Chunks owned by `shard`, in ascending key order. Empty when the shard
    /// is missing from the chunk mapping.
    pub fn chunks(&self, shard: &str) -> &[Chunk] {
        self.chunks.get(shard).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn chunk_count(&self, shard: &str) -> usize {
        self.chunks(shard).len()
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }
}

pub struct TopologyBuilder {
    namespace: String,
    shards: BTreeMap<ShardId, ShardInfo>,
    chunks: BTreeMap<ShardId, Vec<Chunk>>,
}

impl TopologyBuilder {
    pub fn shard(mut self, id: impl Into<ShardId>, info: ShardInfo) -> Self {
        self.shards.insert(id.into(), info);
        self
    }

    pub fn chunks(mut self, id: impl Into<ShardId>, chunks: Vec<Chunk>) -> Self {
        self.chunks.entry(id.into()).or_default().extend(chunks);
        self
    }

    pub fn build(self) -> TopologySnapshot {
        TopologySnapshot::new(self.namespace, self.shards, self.chunks)
    }
}

/// Supplies the snapshot the policy decides against.
///
/// Implementations must return a consistent point-in-time view: the shard
/// facts and the chunk ownership are assumed to describe the same moment.
pub trait TopologySource: Send + Sync {
    fn snapshot(&self) -> Result<TopologySnapshot>;
}

/// Reads a JSON snapshot document from disk on every call.
pub struct FileTopologySource {
    path: PathBuf,
}

impl FileTopologySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TopologySource for FileTopologySource {
    fn snapshot(&self) -> Result<TopologySnapshot> {
        let file = std::fs::File::open(&self.path).map_err(|source| Error::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        TopologySnapshot::from_reader(std::io::BufReader::new(file))
    }
}
