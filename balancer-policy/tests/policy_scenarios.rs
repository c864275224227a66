mod common;

use balancer_policy::{decide, MigrateReason, ShardInfo, TopologySnapshot};
use rstest::rstest;

use common::{chunks, draining, exhausted, normal, ops_pending, split_at_49, topology, NAMESPACE};

#[test]
fn balances_onto_unlimited_empty_shard() {
    let (low, high) = split_at_49();
    let snapshot = TopologySnapshot::builder(NAMESPACE)
        .shard("shard0", ShardInfo::new(100, 0, false, false))
        .shard("shard1", ShardInfo::new(0, 0, false, false))
        .chunks("shard0", vec![low.clone(), high])
        .chunks("shard1", vec![])
        .build();

    let decision = decide(&snapshot, 1).expect("imbalance should produce a migration");
    assert_eq!(decision.from_shard, "shard0");
    assert_eq!(decision.to_shard, "shard1");
    assert_eq!(decision.chunk, low);
    assert_eq!(decision.namespace, NAMESPACE);
    assert_eq!(decision.reason, MigrateReason::Imbalance);
}

#[test]
fn evacuates_draining_shard() {
    let (low, high) = split_at_49();
    let snapshot = topology(vec![
        ("shard0", ShardInfo::new(0, 2, true, false), vec![low.clone()]),
        ("shard1", ShardInfo::new(0, 0, false, false), vec![high]),
    ]);

    let decision = decide(&snapshot, 0).expect("draining shard should be evacuated");
    assert_eq!(decision.from_shard, "shard0");
    assert_eq!(decision.to_shard, "shard1");
    assert_eq!(decision.chunk, low);
    assert_eq!(decision.reason, MigrateReason::Draining);
}

#[test]
fn drained_shard_does_not_trigger_moves() {
    let (low, high) = split_at_49();
    let snapshot = topology(vec![
        ("shard0", ShardInfo::new(0, 2, false, false), vec![low, high]),
        ("shard1", ShardInfo::new(0, 0, true, false), vec![]),
    ]);

    assert_eq!(decide(&snapshot, 0), None);
}

#[test]
fn impasse_when_nothing_can_receive() {
    let (low, high) = split_at_49();
    let snapshot = topology(vec![
        ("shard0", ShardInfo::new(0, 2, true, false), vec![low]),
        ("shard1", ShardInfo::new(1, 1, false, false), vec![high]),
        ("shard2", ShardInfo::new(0, 1, true, false), vec![]),
    ]);

    assert_eq!(decide(&snapshot, 0), None);
}

#[test]
fn empty_draining_shard_does_not_block_balancing() {
    let snapshot = topology(vec![
        ("a", normal(), chunks(0, 4)),
        ("b", normal(), vec![]),
        ("c", draining(), vec![]),
    ]);

    let decision = decide(&snapshot, 2).expect("normal balancing should still apply");
    assert_eq!(decision.from_shard, "a");
    assert_eq!(decision.to_shard, "b");
    assert_eq!(decision.reason, MigrateReason::Imbalance);
}

#[test]
fn shard_missing_from_chunk_mapping_owns_nothing() {
    let snapshot = TopologySnapshot::builder(NAMESPACE)
        .shard("a", normal())
        .shard("b", normal())
        .chunks("a", chunks(0, 3))
        .build();

    let decision = decide(&snapshot, 1).unwrap();
    assert_eq!(decision.to_shard, "b");
}

#[rstest]
#[case(0)]
#[case(3)]
#[case(1_000)]
fn draining_wins_regardless_of_threshold(#[case] threshold: u32) {
    let snapshot = topology(vec![
        ("a", normal(), chunks(0, 6)),
        ("b", draining(), chunks(60, 1)),
        ("c", exhausted(), vec![]),
        ("d", ops_pending(), vec![]),
        ("e", normal(), chunks(70, 2)),
    ]);

    let decision = decide(&snapshot, threshold).unwrap();
    assert_eq!(decision.from_shard, "b");
    assert_eq!(decision.to_shard, "e");

    let to = snapshot.info(&decision.to_shard);
    assert!(!to.draining && !to.ops_pending && !to.is_capacity_exhausted());
}

#[rstest]
#[case(vec![draining(), exhausted(), ops_pending()])]
#[case(vec![draining(), draining()])]
#[case(vec![exhausted(), exhausted(), ops_pending()])]
fn no_decision_when_no_shard_can_receive(#[case] infos: Vec<ShardInfo>) {
    let ids = ["a", "b", "c"];
    let shards = infos
        .into_iter()
        .enumerate()
        .map(|(i, info)| (ids[i], info, chunks(i as i64 * 100, i as i64 + 1)))
        .collect();

    assert_eq!(decide(&topology(shards), 0), None);
}

#[rstest]
#[case(2, 0)]
#[case(2, 1)]
#[case(2, 2)]
#[case(5, 3)]
#[case(8, 8)]
fn two_shards_move_downward_when_gap_meets_threshold(#[case] n: i64, #[case] threshold: u32) {
    let snapshot = topology(vec![("a", normal(), vec![]), ("b", normal(), chunks(0, n))]);

    let decision = decide(&snapshot, threshold).expect("gap meets threshold");
    assert_eq!(decision.from_shard, "b");
    assert_eq!(decision.to_shard, "a");
}

#[rstest]
#[case(2, 3)]
#[case(5, 6)]
fn two_shards_stay_put_below_threshold(#[case] n: i64, #[case] threshold: u32) {
    let snapshot = topology(vec![("a", normal(), chunks(0, n)), ("b", normal(), vec![])]);

    assert_eq!(decide(&snapshot, threshold), None);
}

#[test]
fn repeated_calls_return_identical_decisions() {
    let json = r#"{
        "namespace": "test.users",
        "shards": {
            "shard2": {"max_size_bytes": 1000, "current_size_bytes": 10},
            "shard0": {"draining": true},
            "shard1": {"draining": true}
        },
        "chunks": {
            "shard1": [{"min": {"int": 10}, "max": {"int": 20}}],
            "shard0": [
                {"min": {"int": 30}, "max": "max_key"},
                {"min": "min_key", "max": {"int": 10}}
            ],
            "shard2": [{"min": {"int": 20}, "max": {"int": 30}}]
        }
    }"#;

    let first = decide(&TopologySnapshot::from_json(json).unwrap(), 0).unwrap();
    assert_eq!(first.from_shard, "shard0");
    assert_eq!(first.to_shard, "shard2");

    for _ in 0..5 {
        let again = decide(&TopologySnapshot::from_json(json).unwrap(), 0).unwrap();
        assert_eq!(
            serde_json::to_string(&again).unwrap(),
            serde_json::to_string(&first).unwrap()
        );
    }
}

#[test]
fn draining_move_prefers_chunk_adjacent_to_destination() {
    // shard0 owns [0, 10) and [20, 30); shard1 owns [30, 40); the chunk
    // ending where shard1 begins is the one that keeps ranges contiguous
    let mut owned = chunks(0, 1);
    owned.extend(chunks(20, 1));
    let snapshot = topology(vec![
        ("shard0", draining(), owned),
        ("shard1", normal(), chunks(30, 1)),
    ]);

    let decision = decide(&snapshot, 0).unwrap();
    assert_eq!(decision.chunk, chunks(20, 1)[0]);
}
