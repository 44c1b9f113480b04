//! The device-side primitives: scatter, compact, expand, and the vertex
//! map/filter utilities.
//!
//! Each kernel is a parallel map over a flat domain, launched onto a
//! partition's stream. Out-of-range threads return immediately; the only
//! cross-thread coordination is the atomic slot reservation in compact
//! (workqueue size) and expand (outbox lengths).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;

use lockstep_core::{LaunchConfig, VertexMessage};
use lockstep_graph::VertexId;

use crate::error::Result;
use crate::partition::Partition;
use crate::program::VertexProgram;

/// Apply one inbox's messages to local vertex state.
///
/// For each message, the candidate is `unpack(value)`; a receiver whose
/// current state accepts it takes `update(candidate)` and is marked in the
/// workset.
pub(crate) fn scatter<P: VertexProgram>(
    part: &Partition<P>,
    from: usize,
    program: &Arc<P>,
) -> Result<()> {
    let inbox = &part.inboxes[from];
    let n = inbox.len();
    let config = LaunchConfig::for_domain(n);
    debug!(
        "partition {} scatter kernel on {} messages (grid={}, block={})",
        part.id, n, config.grid, config.block
    );

    let stream = part.pipeline_stream();
    part.scatter_timer.begin(stream)?;

    let buf = inbox.front();
    let len = inbox.length_cell();
    let values = part.vertex_values.device_array();
    let workset = part.workset.clone();
    let program = Arc::clone(program);
    stream.enqueue(move || {
        let buf = buf.lock();
        let mut values = values.lock();
        let mut workset = workset.lock();
        let n = len.load(Ordering::Relaxed) as usize;
        for tid in 0..n {
            let msg = buf[tid];
            let candidate = program.unpack(msg.value);
            let receiver = msg.receiver as usize;
            if program.accept(values[receiver], candidate) {
                values[receiver] = program.update(candidate);
                workset[receiver] = 1;
            }
        }
    })?;

    part.scatter_timer.finish(stream)?;
    Ok(())
}

/// Compact the workset into the workqueue.
///
/// Every set flag is cleared and its index appended at an atomically
/// reserved slot. The resulting order is unspecified.
pub(crate) fn compact<P: VertexProgram>(part: &Partition<P>) -> Result<()> {
    let n = part.vertex_count;
    let config = LaunchConfig::for_domain(n);
    debug!(
        "partition {} compact kernel on {} vertices (grid={}, block={})",
        part.id, n, config.grid, config.block
    );

    let stream = part.pipeline_stream();
    part.compact_timer.begin(stream)?;

    let workset = part.workset.clone();
    let queue = part.workqueue.clone();
    let size = part.workqueue_size.device_cell();
    stream.enqueue(move || {
        let mut workset = workset.lock();
        let mut queue = queue.lock();
        for tid in 0..n {
            if workset[tid] == 1 {
                workset[tid] = 0;
                let offset = size.fetch_add(1, Ordering::Relaxed) as usize;
                queue[offset] = tid as VertexId;
            }
        }
    })?;

    part.compact_timer.finish(stream)?;
    Ok(())
}

/// Traverse the out-edges of every workqueue vertex.
///
/// Local targets are updated in place and marked in the workset; remote
/// targets get a packed message written at an atomically reserved slot in
/// the destination outbox.
pub(crate) fn expand<P: VertexProgram>(part: &Partition<P>, program: &Arc<P>) -> Result<()> {
    let n = part.workqueue_size.host() as usize;
    let config = LaunchConfig::for_domain(n);
    debug!(
        "partition {} expand kernel on {} vertices (grid={}, block={})",
        part.id, n, config.grid, config.block
    );

    let stream = part.pipeline_stream();
    part.expand_timer.begin(stream)?;

    let this_pid = part.id;
    let vertices = part.vertices.clone();
    let edges = part.edges.clone();
    let values = part.vertex_values.device_array();
    let workset = part.workset.clone();
    let queue = part.workqueue.clone();
    let outboxes: Vec<_> = part
        .outboxes
        .iter()
        .map(|b| (b.front(), b.length_cell()))
        .collect();
    let program = Arc::clone(program);
    stream.enqueue(move || {
        let vertices = vertices.lock();
        let edges = edges.lock();
        let mut values = values.lock();
        let mut workset = workset.lock();
        let queue = queue.lock();
        for tid in 0..n {
            let src = queue[tid] as usize;
            let first = vertices[src] as usize;
            let last = vertices[src + 1] as usize;
            for edge in &edges[first..last] {
                let candidate = values[src];
                if edge.partition == this_pid {
                    let target = edge.local as usize;
                    if program.accept(values[target], candidate) {
                        values[target] = program.update(candidate);
                        workset[target] = 1;
                    }
                } else {
                    let (buf, len) = &outboxes[edge.partition as usize];
                    let offset = len.fetch_add(1, Ordering::Relaxed) as usize;
                    buf.lock()[offset] = VertexMessage {
                        receiver: edge.local,
                        value: program.pack(candidate),
                    };
                }
            }
        }
    })?;

    part.expand_timer.finish(stream)?;
    Ok(())
}

/// Apply `f` to every vertex value of the partition.
pub(crate) fn vertex_map<P, F>(part: &Partition<P>, f: &Arc<F>) -> Result<()>
where
    P: VertexProgram,
    F: Fn(P::Vertex) -> P::Vertex + Send + Sync + 'static,
{
    let n = part.vertex_count;
    let config = LaunchConfig::for_domain(n);
    debug!(
        "partition {} vertex-map kernel on {} vertices (grid={}, block={})",
        part.id, n, config.grid, config.block
    );

    let values = part.vertex_values.device_array();
    let f = Arc::clone(f);
    part.device.default_stream().enqueue(move || {
        let mut values = values.lock();
        for tid in 0..n {
            values[tid] = f(values[tid]);
        }
    })?;
    Ok(())
}

/// Apply `f` to the vertex whose global id matches, marking it active.
pub(crate) fn vertex_filter<P, F>(part: &Partition<P>, global: VertexId, f: &Arc<F>) -> Result<()>
where
    P: VertexProgram,
    F: Fn(P::Vertex) -> P::Vertex + Send + Sync + 'static,
{
    let n = part.vertex_count;
    let config = LaunchConfig::for_domain(n);
    debug!(
        "partition {} vertex-filter kernel on {} vertices (grid={}, block={})",
        part.id, n, config.grid, config.block
    );

    let ids = part.global_ids.device_array();
    let values = part.vertex_values.device_array();
    let workset = part.workset.clone();
    let f = Arc::clone(f);
    part.device.default_stream().enqueue(move || {
        let ids = ids.lock();
        let mut values = values.lock();
        let mut workset = workset.lock();
        for tid in 0..n {
            if ids[tid] == global {
                values[tid] = f(values[tid]);
                workset[tid] = 1;
            }
        }
    })?;
    Ok(())
}
