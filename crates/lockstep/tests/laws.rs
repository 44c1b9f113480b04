//! Cross-cutting laws: agreement with sequential references, gather
//! idempotence, and partition-strategy independence.

use lockstep::algorithms::{
    bfs, bfs_reference, connected_components, eccentricity, radius_estimate, BfsProgram,
    ComponentsProgram, Distance,
};
use lockstep::graph::{BlockedEdgeCut, EdgeList, RandomEdgeCut};
use lockstep::EngineBuilder;

/// A small scale-free-ish fixture with cross links, a cycle, and a
/// disconnected tail.
fn fixture() -> EdgeList {
    let edges = [
        (0u32, 1u32),
        (0, 2),
        (1, 3),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 0),
        (4, 6),
        (6, 7),
        (2, 7),
        (8, 9),
    ];
    EdgeList::from_edges(10, &edges).unwrap()
}

#[test]
fn test_engine_matches_reference_bfs() {
    let list = fixture();
    let expected = bfs_reference(&list, 0);

    for partitions in [1u32, 2, 3, 4] {
        let mut engine = EngineBuilder::new()
            .num_partitions(partitions)
            .partition_strategy(BlockedEdgeCut)
            .build(&list, BfsProgram)
            .unwrap();
        let distances = bfs(&mut engine, 0).unwrap();
        assert_eq!(distances, expected, "mismatch with {partitions} partitions");
    }
}

#[test]
fn test_result_independent_of_partitioning() {
    let list = fixture();
    let expected = bfs_reference(&list, 0);

    for seed in 0..5 {
        let mut engine = EngineBuilder::new()
            .num_partitions(3)
            .partition_strategy(RandomEdgeCut::new(seed))
            .build(&list, BfsProgram)
            .unwrap();
        let distances = bfs(&mut engine, 0).unwrap();
        assert_eq!(distances, expected, "mismatch with seed {seed}");
    }
}

#[test]
fn test_gather_is_idempotent() {
    let list = fixture();
    let mut engine = EngineBuilder::new()
        .num_partitions(2)
        .partition_strategy(BlockedEdgeCut)
        .build(&list, BfsProgram)
        .unwrap();
    let _ = bfs(&mut engine, 0).unwrap();

    let mut first = vec![Distance::INFINITY; engine.vertex_count()];
    engine
        .gather(|global, value| first[global as usize] = value)
        .unwrap();
    let mut second = vec![Distance::INFINITY; engine.vertex_count()];
    engine
        .gather(|global, value| second[global as usize] = value)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_components_on_disjoint_paths() {
    // Two directed paths, bidirectionalized: 0-1-2 and 3-4.
    let mut edges = Vec::new();
    for &(a, b) in &[(0u32, 1u32), (1, 2), (3, 4)] {
        edges.push((a, b));
        edges.push((b, a));
    }
    let list = EdgeList::from_edges(5, &edges).unwrap();
    let mut engine = EngineBuilder::new()
        .num_partitions(2)
        .partition_strategy(BlockedEdgeCut)
        .build(&list, ComponentsProgram)
        .unwrap();

    let labels = connected_components(&mut engine).unwrap();
    let raw: Vec<u32> = labels.iter().map(|l| l.get()).collect();
    assert_eq!(raw, vec![0, 0, 0, 3, 3]);
}

#[test]
fn test_eccentricity_reruns_on_one_engine() {
    // 0 -> 1 -> 2 -> 3: eccentricities 3, 2, 1, 0 along the direction.
    let list = EdgeList::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
    let mut engine = EngineBuilder::new()
        .num_partitions(2)
        .partition_strategy(BlockedEdgeCut)
        .build(&list, BfsProgram)
        .unwrap();

    assert_eq!(eccentricity(&mut engine, 0).unwrap(), 3);
    assert_eq!(eccentricity(&mut engine, 2).unwrap(), 1);
    assert_eq!(eccentricity(&mut engine, 3).unwrap(), 0);
    assert_eq!(radius_estimate(&mut engine, &[0, 2, 3]).unwrap(), 0);
}

#[test]
fn test_radius_estimate_rejects_empty_sample() {
    let list = fixture();
    let mut engine = EngineBuilder::new().build(&list, BfsProgram).unwrap();
    assert!(radius_estimate(&mut engine, &[]).is_err());
}
