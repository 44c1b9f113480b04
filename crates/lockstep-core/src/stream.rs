//! In-order command streams and timing events.
//!
//! A [`Stream`] models the execution queue of a device: operations enqueued
//! on the same stream run in FIFO order, operations on different streams run
//! concurrently. That FIFO guarantee is the sole intra-stream ordering
//! contract the engine relies on.
//!
//! An [`Event`] captures a timestamp in stream order. Recording enqueues the
//! capture; the timestamp becomes observable once the stream has been
//! synchronized past it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::device::DeviceId;
use crate::error::{CoreError, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct StreamState {
    jobs: VecDeque<Job>,
    active: bool,
    closed: bool,
}

struct Shared {
    state: Mutex<StreamState>,
    work_ready: Condvar,
    idle: Condvar,
}

/// An in-order execution queue backed by a dedicated worker thread.
///
/// Cloning a `Stream` yields another handle to the same queue. The worker
/// drains any remaining work when the last handle is dropped, then exits.
#[derive(Clone)]
pub struct Stream {
    inner: Arc<StreamOwner>,
}

struct StreamOwner {
    device: DeviceId,
    shared: Arc<Shared>,
}

impl Stream {
    /// Spawn a new stream worker for `device`.
    pub(crate) fn spawn(device: DeviceId) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(StreamState {
                jobs: VecDeque::new(),
                active: false,
                closed: false,
            }),
            work_ready: Condvar::new(),
            idle: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name(format!("lockstep-stream-d{}", device.0))
            .spawn(move || worker_loop(&worker_shared))
            .map_err(|_| CoreError::StreamSpawnFailed { device: device.0 })?;

        Ok(Self {
            inner: Arc::new(StreamOwner { device, shared }),
        })
    }

    /// The device this stream belongs to.
    pub fn device(&self) -> DeviceId {
        self.inner.device
    }

    /// Enqueue an operation. Returns immediately; the operation executes in
    /// FIFO order relative to everything previously enqueued on this stream.
    pub fn enqueue<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.shared.state.lock();
        if state.closed {
            return Err(CoreError::StreamClosed {
                device: self.inner.device.0,
            });
        }
        state.jobs.push_back(Box::new(op));
        self.inner.shared.work_ready.notify_one();
        Ok(())
    }

    /// Block the host until every enqueued operation has completed.
    pub fn synchronize(&self) -> Result<()> {
        let mut state = self.inner.shared.state.lock();
        while !state.jobs.is_empty() || state.active {
            self.inner.shared.idle.wait(&mut state);
        }
        Ok(())
    }
}

impl Drop for StreamOwner {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        self.shared.work_ready.notify_all();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            loop {
                if let Some(job) = state.jobs.pop_front() {
                    state.active = true;
                    break job;
                }
                if state.closed {
                    shared.idle.notify_all();
                    return;
                }
                shared.work_ready.wait(&mut state);
            }
        };

        job();

        let mut state = shared.state.lock();
        state.active = false;
        if state.jobs.is_empty() {
            shared.idle.notify_all();
        }
    }
}

/// A timestamp recorded in stream order.
///
/// Mirrors device timing events: a pair of events bracketing a kernel yields
/// the kernel's execution time once the stream has been synchronized.
#[derive(Clone, Default)]
pub struct Event {
    at: Arc<Mutex<Option<Instant>>>,
}

impl Event {
    /// Create an unrecorded event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a timestamp capture on `stream`.
    pub fn record(&self, stream: &Stream) -> Result<()> {
        let at = Arc::clone(&self.at);
        stream.enqueue(move || {
            *at.lock() = Some(Instant::now());
        })
    }

    /// Whether this event's timestamp has been captured.
    pub fn is_recorded(&self) -> bool {
        self.at.lock().is_some()
    }

    /// Duration between `start` and this event.
    ///
    /// Both events must have been recorded and synchronized past; a negative
    /// span saturates to zero.
    pub fn elapsed_since(&self, start: &Event) -> Result<Duration> {
        let end = (*self.at.lock()).ok_or(CoreError::EventNotRecorded)?;
        let begin = (*start.at.lock()).ok_or(CoreError::EventNotRecorded)?;
        Ok(end.saturating_duration_since(begin))
    }
}
