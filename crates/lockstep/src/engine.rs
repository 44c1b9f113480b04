//! The engine: construction, vertex utilities, and the superstep driver.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use lockstep_core::{DeviceId, DeviceSet};
use lockstep_graph::{
    partition as cut, validate_partitions, EdgeList, PartitionStrategy, RandomEdgeCut, VertexId,
};

use crate::error::{EngineError, Result};
use crate::kernels;
use crate::partition::Partition;
use crate::program::VertexProgram;

/// Accumulated profiling totals over a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileTotals {
    /// Total compute time across supersteps (lagging partition per step).
    pub compute_ms: f64,
    /// Total communication time across supersteps.
    pub communication_ms: f64,
    /// Total wall-clock time across supersteps.
    pub total_ms: f64,
}

/// Configures and constructs an [`Engine`].
pub struct EngineBuilder {
    num_partitions: u32,
    strategy: Box<dyn PartitionStrategy>,
}

impl EngineBuilder {
    /// Start a builder: one partition, random edge cut with seed 0.
    pub fn new() -> Self {
        Self {
            num_partitions: 1,
            strategy: Box::new(RandomEdgeCut::default()),
        }
    }

    /// Number of partitions (one device per partition).
    pub fn num_partitions(mut self, n: u32) -> Self {
        self.num_partitions = n;
        self
    }

    /// Vertex-to-partition assignment strategy.
    pub fn partition_strategy(mut self, strategy: impl PartitionStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Build an engine from an edge-list file.
    pub fn build_from_file<P: VertexProgram>(
        self,
        path: impl AsRef<std::path::Path>,
        program: P,
    ) -> Result<Engine<P>> {
        let list = EdgeList::from_file(path)?;
        self.build(&list, program)
    }

    /// Build an engine from an in-memory edge list.
    ///
    /// Partitions the graph, validates the cut, brings up one virtual
    /// device per partition with pairwise peer access, and constructs
    /// every partition's device state. Vertex values start
    /// zero-initialized; worksets start clear.
    pub fn build<P: VertexProgram>(self, list: &EdgeList, program: P) -> Result<Engine<P>> {
        let subgraphs = cut(list, self.strategy.as_ref(), self.num_partitions)?;
        validate_partitions(&subgraphs)?;

        let devices = DeviceSet::new(self.num_partitions as usize)?;
        devices.enable_all_peer_access()?;

        let count = subgraphs.len();
        let mut partitions = Vec::with_capacity(count);
        for (i, sub) in subgraphs.iter().enumerate() {
            let inbox_caps: Vec<usize> = (0..count)
                .map(|q| subgraphs[q].fanout_to(i as u32))
                .collect();
            partitions.push(Partition::from_subgraph(
                sub,
                devices.device(DeviceId(i)),
                &inbox_caps,
            )?);
        }

        info!(
            "engine ready: {} vertices, {} edges, {} partitions",
            list.num_vertices(),
            list.num_edges(),
            count
        );
        Ok(Engine {
            devices,
            partitions,
            vertex_count: list.num_vertices(),
            program: Arc::new(program),
            supersteps: 0,
            totals: ProfileTotals::default(),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bulk-synchronous vertex-centric engine over a partitioned graph.
///
/// Each partition lives on its own virtual device; cross-partition edges
/// are realized as messages exchanged between supersteps. A run loops
/// supersteps until no partition has active vertices.
pub struct Engine<P: VertexProgram> {
    devices: DeviceSet,
    pub(crate) partitions: Vec<Partition<P>>,
    vertex_count: usize,
    program: Arc<P>,
    supersteps: usize,
    totals: ProfileTotals,
}

impl<P: VertexProgram> Engine<P> {
    /// Number of vertices in the whole graph.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of partitions (and devices) in the engine.
    pub fn num_partitions(&self) -> usize {
        self.devices.len()
    }

    /// Supersteps completed by the last [`run`](Self::run).
    pub fn supersteps(&self) -> usize {
        self.supersteps
    }

    /// Accumulated profiling totals.
    pub fn profile(&self) -> ProfileTotals {
        self.totals
    }

    /// The vertex program driving this engine.
    pub fn program(&self) -> &P {
        &self.program
    }

    /// Apply `f` to every vertex value. Fully synchronous.
    pub fn vertex_map<F>(&mut self, f: F) -> Result<()>
    where
        F: Fn(P::Vertex) -> P::Vertex + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        for part in &self.partitions {
            kernels::vertex_map(part, &f)?;
            part.device.default_stream().synchronize()?;
        }
        Ok(())
    }

    /// Apply `f` to the single vertex with global id `vertex` and mark it
    /// active, seeding the initial frontier. Fully synchronous.
    ///
    /// The filter kernel runs on every partition; exactly one holds the
    /// vertex and matches.
    pub fn vertex_filter<F>(&mut self, vertex: VertexId, f: F) -> Result<()>
    where
        F: Fn(P::Vertex) -> P::Vertex + Send + Sync + 'static,
    {
        if vertex as usize >= self.vertex_count {
            return Err(EngineError::UnknownVertex(vertex));
        }
        let f = Arc::new(f);
        for part in &self.partitions {
            kernels::vertex_filter(part, vertex, &f)?;
            part.device.default_stream().synchronize()?;
        }
        Ok(())
    }

    /// Persist every partition's vertex values and feed them, with their
    /// global ids, to `update_at`. The only way results leave the engine.
    pub fn gather<F>(&mut self, mut update_at: F) -> Result<()>
    where
        F: FnMut(VertexId, P::Vertex),
    {
        let started = Instant::now();
        for part in &mut self.partitions {
            part.vertex_values.persist()?;
            for (local, &value) in part.vertex_values.host().iter().enumerate() {
                update_at(part.global_ids.host()[local], value);
            }
        }
        info!(
            "aggregated results in {:.3}ms",
            started.elapsed().as_secs_f64() * 1e3
        );
        Ok(())
    }

    /// Run supersteps until every partition's workqueue is empty.
    ///
    /// Returns the number of supersteps that performed work.
    pub fn run(&mut self) -> Result<usize> {
        self.supersteps = 0;
        while !self.superstep()? {}
        Ok(self.supersteps)
    }

    /// Execute one superstep. Returns `true` when the engine has
    /// terminated: no partition had any active vertex after compaction,
    /// and no expansion or exchange was performed.
    ///
    /// Phases, in order: scatter inboxes, compact worksets, probe for
    /// termination, expand frontiers, exchange outboxes, synchronize and
    /// swap inbox buffers.
    pub fn superstep(&mut self) -> Result<bool> {
        let count = self.partitions.len();
        debug!("======== superstep {} ========", self.supersteps);
        let started = Instant::now();

        let mut scatter_launched = vec![false; count];
        let mut expand_launched = vec![false; count];

        // Scatter: apply the messages received last superstep. Skipped for
        // empty inboxes (and thus entirely at superstep 0).
        for i in 0..count {
            for j in 0..count {
                if i == j || self.partitions[i].inboxes[j].is_empty() {
                    continue;
                }
                scatter_launched[i] = true;
                kernels::scatter(&self.partitions[i], j, &self.program)?;
            }
        }

        // Compact: reset the queue length, then fold the workset into the
        // workqueue.
        for part in &mut self.partitions {
            part.reset_workqueue()?;
            kernels::compact(part)?;
        }

        // Termination probe: as long as one partition has work, continue.
        let mut terminate = true;
        for part in &mut self.partitions {
            let pending = part.probe_workqueue()?;
            debug!("partition {} workqueue size={}", part.id, pending);
            if pending != 0 {
                terminate = false;
            }
        }
        if terminate {
            return Ok(true);
        }

        // Expand: clear the outboxes, then traverse the frontier. Skipped
        // for partitions with no work.
        for (i, part) in self.partitions.iter().enumerate() {
            if part.workqueue_size.host() == 0 {
                continue;
            }
            expand_launched[i] = true;
            for (q, outbox) in part.outboxes.iter().enumerate() {
                if q == part.id as usize {
                    continue;
                }
                outbox.clear(part.pipeline_stream())?;
            }
            kernels::expand(part, &self.program)?;
        }

        // Exchange: all-to-all transfer. Each copy is enqueued on the
        // source partition's stream, serializing it after that partition's
        // expand.
        for i in 0..count {
            for j in (i + 1)..count {
                let (pi, pj) = (&self.partitions[i], &self.partitions[j]);
                pi.inboxes[j].recv_from(&pj.outboxes[i], pj.pipeline_stream())?;
                pj.inboxes[i].recv_from(&pi.outboxes[j], pi.pipeline_stream())?;
            }
        }

        // Synchronize: the one global barrier per superstep. Mandatory:
        // the buffer swaps and the next superstep's inbox reads must
        // observe completed transfers.
        for part in &self.partitions {
            part.pipeline_stream().synchronize()?;
        }
        for part in &mut self.partitions {
            let id = part.id as usize;
            for (q, inbox) in part.inboxes.iter_mut().enumerate() {
                if q != id {
                    inbox.swap_buffers();
                }
            }
        }

        self.log_profile(started, &scatter_launched, &expand_launched)?;
        self.supersteps += 1;
        Ok(false)
    }

    /// Per-superstep timing: the lagging partition's kernel time stands in
    /// for compute; the remainder of the wall clock is communication.
    fn log_profile(
        &mut self,
        started: Instant,
        scatter_launched: &[bool],
        expand_launched: &[bool],
    ) -> Result<()> {
        let total_ms = started.elapsed().as_secs_f64() * 1e3;
        let mut max_compute_ms: f64 = 0.0;
        for (i, part) in self.partitions.iter().enumerate() {
            let scatter_ms = if scatter_launched[i] {
                part.scatter_timer.elapsed_ms()?
            } else {
                0.0
            };
            let compact_ms = part.compact_timer.elapsed_ms()?;
            let expand_ms = if expand_launched[i] {
                part.expand_timer.elapsed_ms()?
            } else {
                0.0
            };
            let compute_ms = scatter_ms + compact_ms + expand_ms;
            if compute_ms > 0.0 {
                debug!(
                    "partition {}: comp={:.2}ms, scatter={:.2}, compact={:.2}, expand={:.2}",
                    part.id,
                    compute_ms,
                    scatter_ms / compute_ms,
                    compact_ms / compute_ms,
                    expand_ms / compute_ms
                );
            }
            max_compute_ms = max_compute_ms.max(compute_ms);
        }

        let comm_ms = (total_ms - max_compute_ms).max(0.0);
        if total_ms > 0.0 {
            info!(
                "superstep {}: total={:.3}ms, comp={:.2}, comm={:.2}",
                self.supersteps,
                total_ms,
                max_compute_ms / total_ms,
                comm_ms / total_ms
            );
        }
        self.totals.total_ms += total_ms;
        self.totals.compute_ms += max_compute_ms;
        self.totals.communication_ms += comm_ms;
        Ok(())
    }
}

impl<P: VertexProgram> Drop for Engine<P> {
    fn drop(&mut self) {
        info!(
            "profiling: comp={:.3}ms, comm={:.3}ms, all={:.3}ms",
            self.totals.compute_ms, self.totals.communication_ms, self.totals.total_ms
        );
    }
}
