//! The vertex program capability bundle.

use bytemuck::Pod;

/// A vertex-centric algorithm, expressed as four pure functions over the
/// per-vertex state and the wire payload.
///
/// The bundle is monomorphized into the kernels at the instantiation site;
/// there are no indirect calls on the hot path.
///
/// During a superstep, an active vertex offers its value to every
/// out-neighbor. For a local neighbor the candidate is the source value
/// itself; for a remote neighbor it travels as `pack(value)` and is lifted
/// back with [`unpack`](Self::unpack) on the receiving partition. Either
/// way, a neighbor whose current state satisfies
/// [`accept`](Self::accept) takes [`update`](Self::update)`(candidate)`
/// and becomes active in the next superstep.
///
/// Writes to contended vertices are not atomic. Duplicated or colliding
/// candidates must be tolerable: the usual shape is a monotone relaxation
/// (`accept` = "is the candidate an improvement", `update` idempotent over
/// retransmission), as in BFS's "mark if unvisited".
pub trait VertexProgram: Send + Sync + 'static {
    /// Per-vertex state, resident in device memory.
    type Vertex: Pod + Send + Sync;

    /// Payload transmitted across partitions; typically a projection of
    /// [`Vertex`](Self::Vertex).
    type Message: Pod + Send + Sync;

    /// Should a vertex in state `current` accept `candidate`?
    fn accept(&self, current: Self::Vertex, candidate: Self::Vertex) -> bool;

    /// New vertex state derived from an accepted candidate.
    fn update(&self, candidate: Self::Vertex) -> Self::Vertex;

    /// Project a vertex value onto the wire.
    fn pack(&self, value: Self::Vertex) -> Self::Message;

    /// Lift a received payload back to a vertex value.
    fn unpack(&self, message: Self::Message) -> Self::Vertex;
}
