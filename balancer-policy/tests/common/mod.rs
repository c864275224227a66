#![allow(dead_code)]

use balancer_policy::{Chunk, ShardInfo, ShardKey, TopologySnapshot};

pub const NAMESPACE: &str = "test.users";

pub fn normal() -> ShardInfo {
    ShardInfo::new(0, 0, false, false)
}

pub fn draining() -> ShardInfo {
    ShardInfo::new(0, 0, true, false)
}

pub fn ops_pending() -> ShardInfo {
    ShardInfo::new(0, 0, false, true)
}

pub fn exhausted() -> ShardInfo {
    ShardInfo::new(1, 1, false, false)
}

/// `count` consecutive chunks starting at key `start`, each 10 keys wide.
pub fn chunks(start: i64, count: i64) -> Vec<Chunk> {
    (0..count)
        .map(|i| {
            let min = start + i * 10;
            Chunk::new(ShardKey::Int(min), ShardKey::Int(min + 10)).unwrap()
        })
        .collect()
}

/// The two chunks `[$minKey, 49)` and `[49, $maxKey)` covering the whole key space.
pub fn split_at_49() -> (Chunk, Chunk) {
    (
        Chunk::new(ShardKey::MinKey, ShardKey::Int(49)).unwrap(),
        Chunk::new(ShardKey::Int(49), ShardKey::MaxKey).unwrap(),
    )
}

pub fn topology(shards: Vec<(&str, ShardInfo, Vec<Chunk>)>) -> TopologySnapshot {
    shards
        .into_iter()
        .fold(TopologySnapshot::builder(NAMESPACE), |b, (id, info, owned)| {
            b.shard(id, info).chunks(id, owned)
        })
        .build()
}
