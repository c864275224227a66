use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of a shard, as it appears in the topology snapshot.
pub type ShardId = String;

/// One bound of a chunk's key range.
///
/// Bounds are totally ordered: `MinKey` sorts before every value and `MaxKey`
/// after every value. Integers sort before strings, so a namespace mixing both
/// key types still has a single well-defined ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardKey {
    MinKey,
    Int(i64),
    Str(String),
    MaxKey,
}

impl fmt::Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardKey::MinKey => f.write_str("$minKey"),
            ShardKey::Int(v) => write!(f, "{v}"),
            ShardKey::Str(v) => write!(f, "{v:?}"),
            ShardKey::MaxKey => f.write_str("$maxKey"),
        }
    }
}

/// A half-open key range `[min, max)` owned by exactly one shard.
///
/// Chunks are immutable once built. The constructor (and deserialization,
/// which goes through it) rejects empty or inverted ranges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "ChunkBounds")]
pub struct Chunk {
    min: ShardKey,
    max: ShardKey,
}

#[derive(Deserialize)]
struct ChunkBounds {
    min: ShardKey,
    max: ShardKey,
}

impl TryFrom<ChunkBounds> for Chunk {
    type Error = Error;

    fn try_from(bounds: ChunkBounds) -> Result<Self> {
        Chunk::new(bounds.min, bounds.max)
    }
}

impl Chunk {
    pub fn new(min: ShardKey, max: ShardKey) -> Result<Self> {
        if min >= max {
            return Err(Error::InvalidChunkRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> &ShardKey {
        &self.min
    }

    pub fn max(&self) -> &ShardKey {
        &self.max
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.min, self.max)
    }
}

/// How close to its configured ceiling a shard may get before it stops
/// accepting chunks.
///
/// The headroom is a percentage of `max_size_bytes` kept in reserve. The
/// default of zero means a shard is exhausted only once it reaches its
/// configured maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacityLimit {
    headroom_percent: u8,
}

impl CapacityLimit {
    pub const AT_MAX: CapacityLimit = CapacityLimit {
        headroom_percent: 0,
    };

    pub fn new(headroom_percent: u8) -> Result<Self> {
        if headroom_percent >= 100 {
            return Err(Error::InvalidCapacityHeadroom(headroom_percent));
        }
        Ok(Self { headroom_percent })
    }

    pub fn headroom_percent(&self) -> u8 {
        self.headroom_percent
    }

    /// Usable bytes out of `max_size_bytes` once the headroom is reserved.
    fn ceiling(&self, max_size_bytes: u64) -> u64 {
        let pct = u64::from(self.headroom_percent);
        // floor(max * pct / 100) without overflowing on large maxima
        let reserved = max_size_bytes / 100 * pct + max_size_bytes % 100 * pct / 100;
        max_size_bytes - reserved
    }
}

/// Operational facts about one shard, rebuilt from every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardInfo {
    /// Configured capacity ceiling; `0` means unlimited.
    pub max_size_bytes: u64,
    pub current_size_bytes: u64,
    /// Shard is being decommissioned and must shed all of its chunks.
    pub draining: bool,
    /// Shard has queued write-back operations and must be left alone.
    pub ops_pending: bool,
}

impl ShardInfo {
    pub fn new(
        max_size_bytes: u64,
        current_size_bytes: u64,
        draining: bool,
        ops_pending: bool,
    ) -> Self {
        Self {
            max_size_bytes,
            current_size_bytes,
            draining,
            ops_pending,
        }
    }

    /// True once the shard has reached its configured maximum. Unlimited
    /// shards are never exhausted.
    pub fn is_capacity_exhausted(&self) -> bool {
        self.is_capacity_exhausted_with(CapacityLimit::AT_MAX)
    }

    pub fn is_capacity_exhausted_with(&self, limit: CapacityLimit) -> bool {
        if self.max_size_bytes == 0 {
            return false;
        }
        self.current_size_bytes >= limit.ceiling(self.max_size_bytes)
    }

    /// Whether this shard may be handed a chunk under `limit`.
    pub fn is_receiver_with(&self, limit: CapacityLimit) -> bool {
        !self.draining && !self.ops_pending && !self.is_capacity_exhausted_with(limit)
    }
}

impl fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "maxSize: {} currSize: {} draining: {} opsPending: {}",
            self.max_size_bytes, self.current_size_bytes, self.draining, self.ops_pending
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrateReason {
    /// The source shard is draining and must be evacuated.
    Draining,
    /// The chunk-count gap between donor and receiver met the threshold.
    Imbalance,
}

impl MigrateReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrateReason::Draining => "draining",
            MigrateReason::Imbalance => "imbalance",
        }
    }
}

impl fmt::Display for MigrateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recommended single-chunk move. Nothing changes ownership until an
/// external executor performs and commits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrateDecision {
    pub namespace: String,
    pub from_shard: ShardId,
    pub to_shard: ShardId,
    pub chunk: Chunk,
    pub reason: MigrateReason,
}

impl fmt::Display for MigrateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] -> [{}] ({})",
            self.namespace, self.chunk, self.from_shard, self.to_shard, self.reason
        )
    }
}
