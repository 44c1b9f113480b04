//! Radii estimation on top of BFS.

use lockstep_graph::VertexId;

use crate::algorithms::bfs::{bfs, BfsProgram};
use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Eccentricity of `source`: the greatest finite hop distance from it.
///
/// Re-seeds the engine's vertex values, so it can be called repeatedly on
/// the same engine.
pub fn eccentricity(engine: &mut Engine<BfsProgram>, source: VertexId) -> Result<u32> {
    let distances = bfs(engine, source)?;
    Ok(distances
        .iter()
        .filter(|d| d.is_reachable())
        .map(|d| d.get())
        .max()
        .unwrap_or(0))
}

/// Estimate the graph radius as the smallest eccentricity over `sources`.
///
/// An exact radius minimizes over every vertex; sampling a handful of
/// sources gives the usual cheap upper bound.
pub fn radius_estimate(engine: &mut Engine<BfsProgram>, sources: &[VertexId]) -> Result<u32> {
    if sources.is_empty() {
        return Err(EngineError::InvalidConfig(
            "radius estimation needs at least one source".to_string(),
        ));
    }
    let mut radius = u32::MAX;
    for &source in sources {
        radius = radius.min(eccentricity(engine, source)?);
    }
    Ok(radius)
}
