//! # Lockstep Core
//!
//! Virtual device runtime underpinning the lockstep graph engine.
//!
//! The engine is written against an abstract accelerator model: many-thread
//! kernels, explicit host/device transfers, peer-to-peer device copies,
//! in-order command streams, and timing events. This crate realizes that
//! model on the host, the way a CPU backend stands in for a GPU backend:
//!
//! - [`DeviceSet`] - A fleet of virtual devices with pairwise peer access
//! - [`Stream`] - An in-order execution queue backed by a worker thread
//! - [`Event`] - Timestamps captured in stream order for kernel timing
//! - [`DeviceBuffer`] - Paired host/device allocation with explicit `persist`
//! - [`DeviceScalar`] - Device-resident atomic counter with a host mirror
//! - [`MessageBox`] - Double-buffered inter-partition message buffer pair
//!
//! ## Example
//!
//! ```
//! use lockstep_core::{DeviceBuffer, DeviceSet};
//!
//! # fn main() -> lockstep_core::Result<()> {
//! let devices = DeviceSet::new(2)?;
//! devices.enable_all_peer_access()?;
//!
//! let mut buf = DeviceBuffer::<u32>::from_vec(devices.device_at(0), vec![1, 2, 3])?;
//! buf.persist()?;
//! assert_eq!(buf.host(), &[1, 2, 3]);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod device;
pub mod error;
pub mod launch;
pub mod mailbox;
pub mod stream;

pub use buffer::{DeviceArray, DeviceBuffer, DeviceScalar};
pub use device::{Device, DeviceId, DeviceSet};
pub use error::{CoreError, Result};
pub use launch::LaunchConfig;
pub use mailbox::{MessageBox, MessageSlab, VertexMessage};
pub use stream::{Event, Stream};
