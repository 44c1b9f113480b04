//! Connected components via min-label propagation.
//!
//! Every vertex starts labeled with its own global id; labels flow along
//! edges and a vertex adopts any smaller label it sees. At convergence all
//! vertices of a component share the component's smallest global id.
//!
//! Components follow edge direction. For the undirected notion, feed the
//! engine a bidirectionalized edge list.

use bytemuck::{Pod, Zeroable};

use lockstep_graph::VertexId;

use crate::engine::Engine;
use crate::error::Result;
use crate::program::VertexProgram;

/// Component label: the smallest global vertex id seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Label(pub u32);

impl Label {
    /// Inner value.
    pub const fn get(&self) -> u32 {
        self.0
    }
}

// SAFETY: Label is #[repr(transparent)] over u32
unsafe impl Zeroable for Label {}
unsafe impl Pod for Label {}

/// Vertex program propagating the minimum label.
///
/// `update` is the identity and `accept` keeps only improvements, so the
/// relaxation is monotone and retransmission-safe.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentsProgram;

impl VertexProgram for ComponentsProgram {
    type Vertex = Label;
    type Message = Label;

    fn accept(&self, current: Label, candidate: Label) -> bool {
        candidate < current
    }

    fn update(&self, candidate: Label) -> Label {
        candidate
    }

    fn pack(&self, value: Label) -> Label {
        value
    }

    fn unpack(&self, message: Label) -> Label {
        message
    }
}

/// Label every vertex with the smallest global id reachable along edges,
/// returning labels indexed by global id.
///
/// Seeds every vertex with its own id through the filter (which also marks
/// the whole graph active), then runs to convergence.
pub fn connected_components(engine: &mut Engine<ComponentsProgram>) -> Result<Vec<Label>> {
    for vertex in 0..engine.vertex_count() as VertexId {
        engine.vertex_filter(vertex, move |_| Label(vertex))?;
    }
    engine.run()?;

    let mut labels = vec![Label(0); engine.vertex_count()];
    engine.gather(|global, value| labels[global as usize] = value)?;
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_keeps_minimum() {
        let program = ComponentsProgram;
        assert!(program.accept(Label(5), Label(3)));
        assert!(!program.accept(Label(3), Label(5)));
        assert!(!program.accept(Label(3), Label(3)));
        assert_eq!(program.update(Label(3)), Label(3));
    }
}
