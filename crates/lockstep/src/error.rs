//! Engine error types.

use thiserror::Error;

use lockstep_graph::VertexId;

/// Errors raised by the engine.
///
/// Device-side operational faults are fatal: partial-failure recovery is
/// not a goal, so diagnostics from the runtime are surfaced verbatim.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A device runtime fault.
    #[error(transparent)]
    Core(#[from] lockstep_core::CoreError),

    /// A graph ingestion or partitioning failure.
    #[error(transparent)]
    Graph(#[from] lockstep_graph::GraphError),

    /// A vertex id outside the graph.
    #[error("vertex {0} does not exist")]
    UnknownVertex(VertexId),

    /// Invalid engine configuration.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
