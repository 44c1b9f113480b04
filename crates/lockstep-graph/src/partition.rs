//! Edge-cut partition strategies and the partitioner.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::edge_list::EdgeList;
use crate::subgraph::{EdgeRef, Subgraph};
use crate::{GraphError, PartitionId, Result, VertexId};

/// Assigns every vertex to an owning partition.
///
/// Each edge is owned by its source's partition; an assignment therefore
/// fully determines the edge cut.
pub trait PartitionStrategy {
    /// Produce the owning partition for each vertex, in global-id order.
    fn assign(&self, num_vertices: usize, num_partitions: u32) -> Vec<PartitionId>;
}

/// Uniform random vertex assignment, deterministic under a fixed seed.
#[derive(Debug, Clone, Copy)]
pub struct RandomEdgeCut {
    seed: u64,
}

impl RandomEdgeCut {
    /// Create a random edge cut with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for RandomEdgeCut {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PartitionStrategy for RandomEdgeCut {
    fn assign(&self, num_vertices: usize, num_partitions: u32) -> Vec<PartitionId> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..num_vertices)
            .map(|_| rng.gen_range(0..num_partitions))
            .collect()
    }
}

/// Contiguous block assignment: the first `ceil(V / P)` vertices go to
/// partition 0, the next block to partition 1, and so on.
///
/// Deterministic layouts make this the strategy of choice for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockedEdgeCut;

impl PartitionStrategy for BlockedEdgeCut {
    fn assign(&self, num_vertices: usize, num_partitions: u32) -> Vec<PartitionId> {
        let block = num_vertices.div_ceil(num_partitions as usize).max(1);
        (0..num_vertices)
            .map(|v| ((v / block) as PartitionId).min(num_partitions - 1))
            .collect()
    }
}

/// Split `list` into `num_partitions` CSR subgraphs under `strategy`.
///
/// Every vertex receives a local id within its partition (dense, in global
/// order); every edge is stored with its source's partition and rewritten
/// to target `{partition, local}`.
pub fn partition(
    list: &EdgeList,
    strategy: &dyn PartitionStrategy,
    num_partitions: u32,
) -> Result<Vec<Subgraph>> {
    if num_partitions == 0 {
        return Err(GraphError::InvalidPartitionCount(0));
    }

    let n = list.num_vertices();
    let assign = strategy.assign(n, num_partitions);
    debug_assert_eq!(assign.len(), n);

    // Dense local ids, assigned in global order within each partition.
    let mut local_of: Vec<VertexId> = vec![0; n];
    let mut global_ids: Vec<Vec<VertexId>> = vec![Vec::new(); num_partitions as usize];
    for v in 0..n {
        let p = assign[v] as usize;
        local_of[v] = global_ids[p].len() as VertexId;
        global_ids[p].push(v as VertexId);
    }

    // Group edges by source; a stable sort keeps each source's adjacency in
    // input order.
    let mut sorted = list.edges().to_vec();
    sorted.sort_by_key(|&(src, _)| src);

    let mut degrees: Vec<Vec<u64>> = global_ids.iter().map(|ids| vec![0; ids.len()]).collect();
    let mut edges: Vec<Vec<EdgeRef>> = vec![Vec::new(); num_partitions as usize];
    for &(src, dst) in &sorted {
        let p = assign[src as usize] as usize;
        degrees[p][local_of[src as usize] as usize] += 1;
        edges[p].push(EdgeRef {
            partition: assign[dst as usize],
            local: local_of[dst as usize],
        });
    }

    let subgraphs = (0..num_partitions as usize)
        .map(|p| {
            let mut offsets = vec![0u64; global_ids[p].len() + 1];
            for (i, &deg) in degrees[p].iter().enumerate() {
                offsets[i + 1] = offsets[i] + deg;
            }
            Subgraph {
                partition: p as PartitionId,
                num_partitions,
                global_ids: std::mem::take(&mut global_ids[p]),
                offsets,
                edges: std::mem::take(&mut edges[p]),
            }
        })
        .collect::<Vec<_>>();

    info!(
        "partitioned {} vertices / {} edges into {} subgraphs",
        n,
        list.num_edges(),
        num_partitions
    );
    Ok(subgraphs)
}
