use tracing::{debug, info};

use crate::metrics_consts::{DECISIONS, RECEIVER_SKIPPED};
use crate::threshold::ImbalanceThreshold;
use crate::topology::TopologySnapshot;
use crate::types::{CapacityLimit, Chunk, MigrateDecision, MigrateReason, ShardInfo};

/// Decide whether one chunk should move, with shards considered exhausted
/// once they reach their configured maximum.
///
/// Draining shards are evacuated first, regardless of `threshold`. Only when
/// nothing is draining does the chunk-count gap between the most- and
/// least-loaded eligible shards matter. `None` means the namespace is either
/// balanced or has no safe move right now; callers treat both the same.
pub fn decide(snapshot: &TopologySnapshot, threshold: u32) -> Option<MigrateDecision> {
    decide_with(snapshot, threshold, CapacityLimit::AT_MAX)
}

/// Same as [`decide`], with an explicit capacity limit for receivers.
pub fn decide_with(
    snapshot: &TopologySnapshot,
    threshold: u32,
    capacity: CapacityLimit,
) -> Option<MigrateDecision> {
    let loads = shard_loads(snapshot, capacity);
    let outcome = evaluate(snapshot, &loads, threshold);

    metrics::counter!(DECISIONS, "outcome" => outcome.label()).increment(1);

    match outcome {
        Outcome::Migrate(decision) => {
            info!(
                namespace = %decision.namespace,
                from = %decision.from_shard,
                to = %decision.to_shard,
                chunk = %decision.chunk,
                reason = %decision.reason,
                "chose chunk migration"
            );
            Some(decision)
        }
        Outcome::Balanced | Outcome::Impasse => None,
    }
}

/// Pick which of the donor's chunks to hand to the receiver.
///
/// Both lists are in ascending key order. A chunk that borders the receiver's
/// ranges is preferred so each shard keeps owning contiguous key space;
/// otherwise the donor's lowest chunk goes.
pub fn pick_chunk<'a>(from: &'a [Chunk], to: &[Chunk]) -> Option<&'a Chunk> {
    let (lowest, highest) = (from.first()?, from.last()?);

    let (Some(to_lowest), Some(to_highest)) = (to.first(), to.last()) else {
        return Some(lowest);
    };

    if lowest.min() == to_highest.max() {
        return Some(lowest);
    }
    if highest.max() == to_lowest.min() {
        return Some(highest);
    }
    Some(lowest)
}

/// The decision function bundled with its operator-tunable knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalancerPolicy {
    threshold: ImbalanceThreshold,
    capacity: CapacityLimit,
}

impl BalancerPolicy {
    pub fn new(threshold: ImbalanceThreshold, capacity: CapacityLimit) -> Self {
        Self {
            threshold,
            capacity,
        }
    }

    pub fn threshold(&self) -> ImbalanceThreshold {
        self.threshold
    }

    pub fn capacity(&self) -> CapacityLimit {
        self.capacity
    }

    /// `balanced_last_round` should be true when the previous call for this
    /// namespace produced a move; the adaptive threshold tightens so an
    /// in-progress rebalance runs to completion.
    pub fn decide(
        &self,
        snapshot: &TopologySnapshot,
        balanced_last_round: bool,
    ) -> Option<MigrateDecision> {
        let threshold = self
            .threshold
            .resolve(max_donor_chunks(snapshot), balanced_last_round);
        decide_with(snapshot, threshold, self.capacity)
    }
}

fn max_donor_chunks(snapshot: &TopologySnapshot) -> usize {
    snapshot
        .shard_ids()
        .filter(|id| !snapshot.info(id).ops_pending)
        .map(|id| snapshot.chunk_count(id))
        .max()
        .unwrap_or(0)
}

enum Outcome {
    Migrate(MigrateDecision),
    /// Every eligible pair is within the threshold.
    Balanced,
    /// Something needs to move but no shard can take it.
    Impasse,
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Migrate(decision) => decision.reason.as_str(),
            Outcome::Balanced => "balanced",
            Outcome::Impasse => "impasse",
        }
    }
}

struct ShardLoad<'a> {
    id: &'a str,
    info: ShardInfo,
    chunks: &'a [Chunk],
    receiver: bool,
}

fn shard_loads(snapshot: &TopologySnapshot, capacity: CapacityLimit) -> Vec<ShardLoad<'_>> {
    snapshot
        .shard_ids()
        .map(|id| {
            let info = snapshot.info(id);
            let receiver = info.is_receiver_with(capacity);
            if !receiver {
                let reason = skip_reason(&info);
                debug!(
                    namespace = snapshot.namespace(),
                    shard = id,
                    reason,
                    "won't send a chunk to shard"
                );
                metrics::counter!(RECEIVER_SKIPPED, "reason" => reason).increment(1);
            }
            ShardLoad {
                id,
                info,
                chunks: snapshot.chunks(id),
                receiver,
            }
        })
        .collect()
}

fn skip_reason(info: &ShardInfo) -> &'static str {
    if info.ops_pending {
        "ops_pending"
    } else if info.draining {
        "draining"
    } else {
        "capacity_exhausted"
    }
}

fn evaluate(snapshot: &TopologySnapshot, loads: &[ShardLoad<'_>], threshold: u32) -> Outcome {
    let draining: Vec<&ShardLoad<'_>> = loads
        .iter()
        .filter(|s| s.info.draining && !s.info.ops_pending && !s.chunks.is_empty())
        .collect();

    let receiver = least_loaded_receiver(loads);

    if let Some(source) = draining.first() {
        // Destinations never depend on the source, so if the first draining
        // shard has nowhere to go none of the others do either.
        let Some(dest) = receiver else {
            info!(
                namespace = snapshot.namespace(),
                draining = draining.len(),
                "no available shards to take chunks from draining shards"
            );
            return Outcome::Impasse;
        };
        return migration(snapshot, source, dest, MigrateReason::Draining);
    }

    let Some(receiver) = receiver else {
        info!(
            namespace = snapshot.namespace(),
            "no available shards to take chunks"
        );
        return Outcome::Impasse;
    };

    let Some(donor) = most_loaded_donor(loads, receiver.id) else {
        return Outcome::Balanced;
    };

    let (donor_chunks, receiver_chunks) = (donor.chunks.len(), receiver.chunks.len());
    debug!(
        namespace = snapshot.namespace(),
        donor = donor.id,
        donor_chunks,
        receiver = receiver.id,
        receiver_chunks,
        threshold,
        "evaluating imbalance"
    );

    if donor_chunks > receiver_chunks && donor_chunks - receiver_chunks >= threshold as usize {
        migration(snapshot, donor, receiver, MigrateReason::Imbalance)
    } else {
        Outcome::Balanced
    }
}

/// Fewest chunks wins; ties go to the lowest shard id.
fn least_loaded_receiver<'s, 'a>(loads: &'s [ShardLoad<'a>]) -> Option<&'s ShardLoad<'a>> {
    loads
        .iter()
        .filter(|s| s.receiver)
        .min_by(|a, b| a.chunks.len().cmp(&b.chunks.len()).then_with(|| a.id.cmp(b.id)))
}

/// Most chunks wins; ties go to the lowest shard id.
fn most_loaded_donor<'s, 'a>(
    loads: &'s [ShardLoad<'a>],
    receiver: &str,
) -> Option<&'s ShardLoad<'a>> {
    loads
        .iter()
        .filter(|s| !s.info.ops_pending && !s.chunks.is_empty() && s.id != receiver)
        .max_by(|a, b| a.chunks.len().cmp(&b.chunks.len()).then_with(|| b.id.cmp(a.id)))
}

fn migration(
    snapshot: &TopologySnapshot,
    from: &ShardLoad<'_>,
    to: &ShardLoad<'_>,
    reason: MigrateReason,
) -> Outcome {
    match pick_chunk(from.chunks, to.chunks) {
        Some(chunk) => Outcome::Migrate(MigrateDecision {
            namespace: snapshot.namespace().to_string(),
            from_shard: from.id.to_string(),
            to_shard: to.id.to_string(),
            chunk: chunk.clone(),
            reason,
        }),
        // donors and draining sources always own at least one chunk
        None => Outcome::Balanced,
    }
}
