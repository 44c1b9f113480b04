//! # Lockstep Graph
//!
//! Graph ingestion and partitioning for the lockstep engine.
//!
//! The engine consumes graphs that have already been split into
//! per-partition CSR subgraphs; this crate produces them:
//!
//! - [`EdgeList`] - Directed edge list, parsed from a file or built in memory
//! - [`PartitionStrategy`] - Vertex-to-partition assignment ([`RandomEdgeCut`],
//!   [`BlockedEdgeCut`])
//! - [`Subgraph`] - One partition's CSR slice with its global-id mapping
//!
//! Every edge is owned by its source vertex's partition (an edge cut);
//! edges whose target lives elsewhere are recorded as remote references
//! and become messages at run time.
//!
//! ## Example
//!
//! ```
//! use lockstep_graph::{partition, BlockedEdgeCut, EdgeList};
//!
//! # fn main() -> lockstep_graph::Result<()> {
//! // 0 -> 1 -> 2 -> 3, split into two partitions of two vertices.
//! let list = EdgeList::from_edges(4, &[(0, 1), (1, 2), (2, 3)])?;
//! let subgraphs = partition(&list, &BlockedEdgeCut, 2)?;
//!
//! assert_eq!(subgraphs[0].vertex_count(), 2);
//! // The edge 1 -> 2 crosses the cut.
//! assert_eq!(subgraphs[0].fanout_to(1), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod edge_list;
pub mod partition;
pub mod subgraph;

pub use edge_list::EdgeList;
pub use partition::{partition, BlockedEdgeCut, PartitionStrategy, RandomEdgeCut};
pub use subgraph::{validate_partitions, EdgeRef, Subgraph};

use thiserror::Error;

/// A vertex id. Global or partition-local depending on context.
pub type VertexId = u32;

/// A partition id.
pub type PartitionId = u32;

/// An edge offset into a partition's CSR edge array.
pub type EdgeId = u64;

/// Errors raised while ingesting or partitioning a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// I/O failure while reading an edge-list file.
    #[error("I/O error reading edge list: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed edge-list line.
    #[error("malformed edge list at line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// An edge endpoint outside the declared vertex range.
    #[error("vertex {vertex} out of range (graph has {count} vertices)")]
    VertexOutOfRange {
        /// The offending vertex id.
        vertex: VertexId,
        /// Declared vertex count.
        count: usize,
    },

    /// The partition count is unusable.
    #[error("invalid partition count: {0}")]
    InvalidPartitionCount(u32),

    /// A CSR structural invariant does not hold.
    #[error("invalid CSR structure: {0}")]
    InvalidCsr(String),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
