//! Per-device partition state.

use lockstep_core::{
    Device, DeviceArray, DeviceBuffer, DeviceScalar, Event, MessageBox, Result as CoreResult,
    Stream,
};
use lockstep_graph::{EdgeId, EdgeRef, PartitionId, Subgraph, VertexId};

use crate::error::Result;
use crate::program::VertexProgram;

/// Start/end event pair bracketing one kernel on a stream.
pub(crate) struct KernelTimer {
    start: Event,
    end: Event,
}

impl KernelTimer {
    pub(crate) fn new() -> Self {
        Self {
            start: Event::new(),
            end: Event::new(),
        }
    }

    pub(crate) fn begin(&self, stream: &Stream) -> CoreResult<()> {
        self.start.record(stream)
    }

    pub(crate) fn finish(&self, stream: &Stream) -> CoreResult<()> {
        self.end.record(stream)
    }

    pub(crate) fn elapsed_ms(&self) -> CoreResult<f64> {
        self.end
            .elapsed_since(&self.start)
            .map(|d| d.as_secs_f64() * 1e3)
    }
}

/// One partition of the graph, resident on one device.
///
/// Owns the partition's CSR arrays, vertex values, workset/workqueue, the
/// inbox/outbox arrays toward every peer, two streams (index 1 carries the
/// whole compute/communicate pipeline; index 0 is reserved), and timing
/// events for the three kernels.
pub(crate) struct Partition<P: VertexProgram> {
    pub(crate) id: PartitionId,
    pub(crate) device: Device,
    pub(crate) vertex_count: usize,

    /// CSR offsets, length `vertex_count + 1`.
    pub(crate) vertices: DeviceArray<EdgeId>,
    pub(crate) edges: DeviceArray<EdgeRef>,
    pub(crate) global_ids: DeviceBuffer<VertexId>,
    pub(crate) vertex_values: DeviceBuffer<P::Vertex>,

    /// Activation flags, one per local vertex.
    pub(crate) workset: DeviceArray<u32>,
    /// Compacted active vertex ids.
    pub(crate) workqueue: DeviceArray<VertexId>,
    pub(crate) workqueue_size: DeviceScalar,

    /// Slot `id` in either array is unused (zero capacity).
    pub(crate) inboxes: Vec<MessageBox<P::Message>>,
    pub(crate) outboxes: Vec<MessageBox<P::Message>>,

    pub(crate) streams: [Stream; 2],
    pub(crate) scatter_timer: KernelTimer,
    pub(crate) compact_timer: KernelTimer,
    pub(crate) expand_timer: KernelTimer,
}

impl<P: VertexProgram> Partition<P> {
    /// Build a partition from its subgraph: allocate every device buffer,
    /// upload the CSR and global-id map, and size each outbox to its edge
    /// fan-out (and each inbox to the matching peer fan-in, `inbox_caps[q]`
    /// being the fan-out of partition `q` into this one).
    pub(crate) fn from_subgraph(
        sub: &Subgraph,
        device: &Device,
        inbox_caps: &[usize],
    ) -> Result<Self> {
        let v = sub.vertex_count();
        let id = sub.partition;
        let peers = sub.num_partitions as usize;

        let outboxes = (0..peers)
            .map(|q| {
                let cap = if q == id as usize {
                    0
                } else {
                    sub.fanout_to(q as PartitionId)
                };
                MessageBox::new(cap)
            })
            .collect();
        let inboxes = (0..peers)
            .map(|q| {
                let cap = if q == id as usize { 0 } else { inbox_caps[q] };
                MessageBox::new(cap)
            })
            .collect();

        Ok(Self {
            id,
            device: device.clone(),
            vertex_count: v,
            vertices: DeviceArray::from_slice(&sub.offsets)?,
            edges: DeviceArray::from_slice(&sub.edges)?,
            global_ids: DeviceBuffer::from_vec(device, sub.global_ids.clone())?,
            vertex_values: DeviceBuffer::new(device, v)?,
            workset: DeviceArray::zeroed(v)?,
            workqueue: DeviceArray::zeroed(v)?,
            workqueue_size: DeviceScalar::new(),
            inboxes,
            outboxes,
            streams: [device.create_stream()?, device.create_stream()?],
            scatter_timer: KernelTimer::new(),
            compact_timer: KernelTimer::new(),
            expand_timer: KernelTimer::new(),
        })
    }

    /// The stream carrying the compute/communicate pipeline.
    pub(crate) fn pipeline_stream(&self) -> &Stream {
        &self.streams[1]
    }

    /// Zero the workqueue size on host and device (enqueued on the
    /// pipeline stream, ahead of the compact kernel).
    pub(crate) fn reset_workqueue(&mut self) -> Result<()> {
        self.workqueue_size.set_host(0);
        self.workqueue_size.upload(&self.streams[1])?;
        Ok(())
    }

    /// Blocking device-to-host readback of the workqueue size.
    pub(crate) fn probe_workqueue(&mut self) -> Result<u64> {
        let stream = self.streams[1].clone();
        Ok(self.workqueue_size.download_blocking(&stream)?)
    }
}
