//! Chunk migration policy for a range-partitioned store.
//!
//! Given a [`TopologySnapshot`] of which chunks live on which shards, plus each
//! shard's capacity and draining state, [`decide`] proposes at most one chunk
//! move. The crate does no I/O of its own apart from [`FileTopologySource`];
//! executing a move is left to the caller.

pub mod config;
pub mod error;
pub mod metrics_consts;
pub mod policy;
pub mod threshold;
pub mod topology;
pub mod types;

pub use error::{Error, Result};
pub use policy::{decide, decide_with, pick_chunk, BalancerPolicy};
pub use threshold::ImbalanceThreshold;
pub use topology::{FileTopologySource, TopologyBuilder, TopologySnapshot, TopologySource};
pub use types::{
    CapacityLimit, Chunk, MigrateDecision, MigrateReason, ShardId, ShardInfo, ShardKey,
};
