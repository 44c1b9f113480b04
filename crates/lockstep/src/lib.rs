//! # lockstep
//!
//! A multi-device bulk-synchronous graph-processing engine.
//!
//! The graph is split into per-device partitions by an edge cut; edges
//! that cross the cut are realized as messages. Each superstep scatters
//! the previous step's messages into local vertex state, compacts the set
//! of activated vertices into a work queue, expands their out-edges
//! (updating local neighbors in place and emitting messages to remote
//! ones), exchanges outboxes peer-to-peer, and meets at one global
//! barrier before the inbox buffers swap.
//!
//! Algorithms are [`VertexProgram`]s: four pure functions (`accept`,
//! `update`, `pack`, `unpack`) monomorphized into the kernels.
//!
//! ## Example
//!
//! ```
//! use lockstep::algorithms::{bfs, BfsProgram, Distance};
//! use lockstep::graph::{BlockedEdgeCut, EdgeList};
//! use lockstep::EngineBuilder;
//!
//! # fn main() -> lockstep::Result<()> {
//! // 0 -> 1 -> 2 -> 3, two partitions of two vertices each.
//! let list = EdgeList::from_edges(4, &[(0, 1), (1, 2), (2, 3)])?;
//! let mut engine = EngineBuilder::new()
//!     .num_partitions(2)
//!     .partition_strategy(BlockedEdgeCut)
//!     .build(&list, BfsProgram)?;
//!
//! let distances = bfs(&mut engine, 0)?;
//! assert_eq!(distances[3], Distance::new(3));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod engine;
pub mod error;
pub mod program;

mod kernels;
mod partition;

pub use engine::{Engine, EngineBuilder, ProfileTotals};
pub use error::{EngineError, Result};
pub use program::VertexProgram;

/// The virtual device runtime.
pub use lockstep_core as core;

/// Graph ingestion and partitioning.
pub use lockstep_graph as graph;
