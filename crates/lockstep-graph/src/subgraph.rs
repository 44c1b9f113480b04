//! Per-partition CSR subgraphs.
//!
//! Each partition owns a disjoint vertex range with dense local ids and the
//! outgoing edges of those vertices, stored in CSR form:
//!
//! - `offsets[i]` = starting index in `edges` for local vertex i
//! - `edges[offsets[i]..offsets[i + 1]]` = that vertex's out-edges, each
//!   naming the target's owning partition and its local id there

use bytemuck::{Pod, Zeroable};

use crate::{EdgeId, GraphError, PartitionId, Result, VertexId};

/// An edge record: the owner partition and local id of the target vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EdgeRef {
    /// Partition owning the target vertex.
    pub partition: PartitionId,
    /// Target's local id within its partition.
    pub local: VertexId,
}

// SAFETY: EdgeRef is repr(C) with two u32 fields and no padding.
unsafe impl Zeroable for EdgeRef {}
unsafe impl Pod for EdgeRef {}

/// One partition's share of a partitioned graph.
#[derive(Debug, Clone)]
pub struct Subgraph {
    /// This partition's id.
    pub partition: PartitionId,
    /// Total number of partitions in the cut.
    pub num_partitions: u32,
    /// Global vertex id of each local vertex, indexed by local id.
    pub global_ids: Vec<VertexId>,
    /// CSR edge offsets, length `vertex_count + 1`.
    pub offsets: Vec<EdgeId>,
    /// CSR edge records.
    pub edges: Vec<EdgeRef>,
}

impl Subgraph {
    /// Number of vertices owned by this partition.
    pub fn vertex_count(&self) -> usize {
        self.global_ids.len()
    }

    /// Number of edges owned by this partition.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Out-degree of a local vertex.
    pub fn out_degree(&self, local: VertexId) -> usize {
        let i = local as usize;
        (self.offsets[i + 1] - self.offsets[i]) as usize
    }

    /// Out-edges of a local vertex.
    pub fn out_edges(&self, local: VertexId) -> &[EdgeRef] {
        let i = local as usize;
        &self.edges[self.offsets[i] as usize..self.offsets[i + 1] as usize]
    }

    /// Count of edges from this partition into `target`.
    ///
    /// This is the worst-case message fan-out, and therefore the capacity
    /// of the outbox toward `target`.
    pub fn fanout_to(&self, target: PartitionId) -> usize {
        self.edges.iter().filter(|e| e.partition == target).count()
    }
}

/// Validate the CSR invariant across a full partition set.
///
/// Checks offset shape and monotonicity, edge targets against the actual
/// partition sizes, and that the global-id mapping is a bijection onto
/// `0..V`. The engine core trusts its input; callers validate here, at the
/// ingestion boundary.
pub fn validate_partitions(parts: &[Subgraph]) -> Result<()> {
    let sizes: Vec<usize> = parts.iter().map(Subgraph::vertex_count).collect();
    let total: usize = sizes.iter().sum();
    let mut seen = vec![false; total];

    for sub in parts {
        if sub.offsets.len() != sub.vertex_count() + 1 {
            return Err(GraphError::InvalidCsr(format!(
                "partition {}: offsets length {} != vertex count + 1 = {}",
                sub.partition,
                sub.offsets.len(),
                sub.vertex_count() + 1
            )));
        }
        for w in sub.offsets.windows(2) {
            if w[0] > w[1] {
                return Err(GraphError::InvalidCsr(format!(
                    "partition {}: offsets not monotonic",
                    sub.partition
                )));
            }
        }
        if *sub.offsets.last().unwrap_or(&0) != sub.edge_count() as EdgeId {
            return Err(GraphError::InvalidCsr(format!(
                "partition {}: final offset {} != edge count {}",
                sub.partition,
                sub.offsets.last().unwrap_or(&0),
                sub.edge_count()
            )));
        }
        for edge in &sub.edges {
            let p = edge.partition as usize;
            if p >= parts.len() || edge.local as usize >= sizes[p] {
                return Err(GraphError::InvalidCsr(format!(
                    "partition {}: edge targets {}:{} outside the cut",
                    sub.partition, edge.partition, edge.local
                )));
            }
        }
        for &gid in &sub.global_ids {
            let g = gid as usize;
            if g >= total || seen[g] {
                return Err(GraphError::InvalidCsr(format!(
                    "global id {gid} missing or duplicated across the cut"
                )));
            }
            seen[g] = true;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_partition_fixture() -> Vec<Subgraph> {
        // 0 -> 1, 1 -> 2 with {0, 1} | {2}.
        vec![
            Subgraph {
                partition: 0,
                num_partitions: 2,
                global_ids: vec![0, 1],
                offsets: vec![0, 1, 2],
                edges: vec![
                    EdgeRef {
                        partition: 0,
                        local: 1,
                    },
                    EdgeRef {
                        partition: 1,
                        local: 0,
                    },
                ],
            },
            Subgraph {
                partition: 1,
                num_partitions: 2,
                global_ids: vec![2],
                offsets: vec![0, 0],
                edges: vec![],
            },
        ]
    }

    #[test]
    fn test_degrees_and_fanout() {
        let parts = two_partition_fixture();
        assert_eq!(parts[0].out_degree(0), 1);
        assert_eq!(parts[0].out_degree(1), 1);
        assert_eq!(parts[0].fanout_to(1), 1);
        assert_eq!(parts[0].fanout_to(0), 1);
        assert_eq!(parts[1].fanout_to(0), 0);
    }

    #[test]
    fn test_out_edges() {
        let parts = two_partition_fixture();
        assert_eq!(
            parts[0].out_edges(1),
            &[EdgeRef {
                partition: 1,
                local: 0
            }]
        );
        assert!(parts[1].out_edges(0).is_empty());
    }

    #[test]
    fn test_validate_ok() {
        validate_partitions(&two_partition_fixture()).unwrap();
    }

    #[test]
    fn test_validate_bad_offsets() {
        let mut parts = two_partition_fixture();
        parts[0].offsets = vec![0, 2, 1];
        assert!(validate_partitions(&parts).is_err());
    }

    #[test]
    fn test_validate_dangling_edge() {
        let mut parts = two_partition_fixture();
        parts[0].edges[1] = EdgeRef {
            partition: 1,
            local: 9,
        };
        assert!(validate_partitions(&parts).is_err());
    }

    #[test]
    fn test_validate_duplicate_global_id() {
        let mut parts = two_partition_fixture();
        parts[1].global_ids = vec![1];
        assert!(validate_partitions(&parts).is_err());
    }
}
