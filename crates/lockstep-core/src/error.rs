//! Error types for the virtual device runtime.

use thiserror::Error;

/// Errors raised by the device runtime.
///
/// Operational device faults are fatal by policy: callers surface the
/// diagnostic verbatim and never attempt local recovery.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Device memory allocation failed.
    #[error("failed to allocate {bytes} bytes of device memory")]
    AllocationFailed {
        /// Requested allocation size.
        bytes: usize,
    },

    /// Peer-to-peer access between two devices is not enabled.
    #[error("peer access from device {from} to device {to} is unavailable")]
    PeerAccessUnavailable {
        /// Source device index.
        from: usize,
        /// Destination device index.
        to: usize,
    },

    /// A stream worker could not be spawned.
    #[error("failed to spawn stream worker on device {device}")]
    StreamSpawnFailed {
        /// Device index.
        device: usize,
    },

    /// Work was enqueued on a stream whose worker has exited.
    #[error("stream on device {device} is closed")]
    StreamClosed {
        /// Device index.
        device: usize,
    },

    /// A kernel launch was rejected.
    #[error("kernel launch failed: {0}")]
    LaunchFailed(String),

    /// An event was queried before both timestamps were recorded.
    #[error("event not recorded")]
    EventNotRecorded,

    /// Invalid runtime configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for device runtime operations.
pub type Result<T> = std::result::Result<T, CoreError>;
