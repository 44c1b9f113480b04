//! Breadth-first search as a vertex program.
//!
//! Distances propagate as a monotone relaxation: an unvisited vertex
//! accepts any candidate and takes `candidate + 1`. Duplicated messages are
//! harmless because only the first acceptance changes state.

use bytemuck::{Pod, Zeroable};

use lockstep_graph::{EdgeList, VertexId};

use crate::engine::Engine;
use crate::error::Result;
use crate::program::VertexProgram;

/// Hop distance from the BFS source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Distance(pub u32);

impl Distance {
    /// Unreachable sentinel.
    pub const INFINITY: Distance = Distance(u32::MAX);

    /// The source's distance.
    pub const ZERO: Distance = Distance(0);

    /// Create a finite distance.
    pub const fn new(d: u32) -> Self {
        Distance(d)
    }

    /// Whether the vertex was reached.
    pub const fn is_reachable(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Inner value.
    pub const fn get(&self) -> u32 {
        self.0
    }
}

// SAFETY: Distance is #[repr(transparent)] over u32
unsafe impl Zeroable for Distance {}
unsafe impl Pod for Distance {}

/// Vertex program computing hop distances from a seeded source.
#[derive(Debug, Default, Clone, Copy)]
pub struct BfsProgram;

impl VertexProgram for BfsProgram {
    type Vertex = Distance;
    type Message = Distance;

    fn accept(&self, current: Distance, _candidate: Distance) -> bool {
        current == Distance::INFINITY
    }

    fn update(&self, candidate: Distance) -> Distance {
        Distance(candidate.0.saturating_add(1))
    }

    fn pack(&self, value: Distance) -> Distance {
        value
    }

    fn unpack(&self, message: Distance) -> Distance {
        message
    }
}

/// Run BFS from `source`, returning per-vertex distances indexed by
/// global id.
pub fn bfs(engine: &mut Engine<BfsProgram>, source: VertexId) -> Result<Vec<Distance>> {
    engine.vertex_map(|_| Distance::INFINITY)?;
    engine.vertex_filter(source, |_| Distance::ZERO)?;
    engine.run()?;

    let mut distances = vec![Distance::INFINITY; engine.vertex_count()];
    engine.gather(|global, value| distances[global as usize] = value)?;
    Ok(distances)
}

/// Sequential reference BFS over an edge list.
///
/// Used by tests and benches to check the engine's converged state.
pub fn bfs_reference(list: &EdgeList, source: VertexId) -> Vec<Distance> {
    let n = list.num_vertices();
    let mut adjacency = vec![Vec::new(); n];
    for &(src, dst) in list.edges() {
        adjacency[src as usize].push(dst);
    }

    let mut distances = vec![Distance::INFINITY; n];
    let mut queue = std::collections::VecDeque::new();
    if (source as usize) < n {
        distances[source as usize] = Distance::ZERO;
        queue.push_back(source);
    }
    while let Some(v) = queue.pop_front() {
        let next = Distance(distances[v as usize].0 + 1);
        for &to in &adjacency[v as usize] {
            if distances[to as usize] == Distance::INFINITY {
                distances[to as usize] = next;
                queue.push_back(to);
            }
        }
    }
    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_line_graph() {
        let list = EdgeList::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]).unwrap();
        let distances = bfs_reference(&list, 0);
        assert_eq!(
            distances,
            vec![
                Distance::new(0),
                Distance::new(1),
                Distance::new(2),
                Distance::new(3),
                Distance::new(4)
            ]
        );
    }

    #[test]
    fn test_reference_unreachable() {
        let list = EdgeList::from_edges(4, &[(0, 1), (2, 3)]).unwrap();
        let distances = bfs_reference(&list, 0);
        assert_eq!(distances[1], Distance::new(1));
        assert_eq!(distances[2], Distance::INFINITY);
        assert_eq!(distances[3], Distance::INFINITY);
    }

    #[test]
    fn test_program_is_monotone() {
        let program = BfsProgram;
        assert!(program.accept(Distance::INFINITY, Distance::new(3)));
        assert!(!program.accept(Distance::new(2), Distance::new(0)));
        assert_eq!(program.update(Distance::new(3)), Distance::new(4));
        assert_eq!(program.unpack(program.pack(Distance::new(7))), Distance::new(7));
    }
}
