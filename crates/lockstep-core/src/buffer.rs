//! Device allocations, paired host/device buffers, and device counters.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::Pod;
use parking_lot::{Mutex, MutexGuard};

use crate::device::Device;
use crate::error::{CoreError, Result};
use crate::stream::Stream;

/// A device-resident array of `T`.
///
/// Cloning yields another handle to the same allocation, the way a raw
/// device pointer aliases device memory. Kernels lock the allocation for
/// the duration of a launch; the engine's stream discipline keeps lock
/// holders on any one allocation serialized.
#[derive(Clone)]
pub struct DeviceArray<T: Pod + Send + Sync> {
    data: Arc<Mutex<Box<[T]>>>,
    len: usize,
}

impl<T: Pod + Send + Sync> DeviceArray<T> {
    /// Allocate `len` zero-initialized elements.
    pub fn zeroed(len: usize) -> Result<Self> {
        len.checked_mul(mem::size_of::<T>())
            .filter(|&bytes| bytes < isize::MAX as usize)
            .ok_or(CoreError::AllocationFailed {
                bytes: len.saturating_mul(mem::size_of::<T>()),
            })?;
        Ok(Self {
            data: Arc::new(Mutex::new(vec![T::zeroed(); len].into_boxed_slice())),
            len,
        })
    }

    /// Allocate and fill from a host slice.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let array = Self::zeroed(data.len())?;
        array.lock().copy_from_slice(data);
        Ok(array)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the allocation holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lock the allocation for kernel access.
    pub fn lock(&self) -> MutexGuard<'_, Box<[T]>> {
        self.data.lock()
    }
}

/// A paired host/device allocation with explicit synchronization.
///
/// The two sides are never implicitly coherent: [`upload`](Self::upload)
/// moves host state to the device and [`persist`](Self::persist) moves
/// device state back. Both run on the owning device's default stream.
pub struct DeviceBuffer<T: Pod + Send + Sync> {
    device: Device,
    host: Vec<T>,
    dev: DeviceArray<T>,
}

impl<T: Pod + Send + Sync> DeviceBuffer<T> {
    /// Allocate both sides, zero-initialized.
    pub fn new(device: &Device, len: usize) -> Result<Self> {
        Ok(Self {
            device: device.clone(),
            host: vec![T::zeroed(); len],
            dev: DeviceArray::zeroed(len)?,
        })
    }

    /// Allocate both sides from `data`, uploading to the device.
    pub fn from_vec(device: &Device, data: Vec<T>) -> Result<Self> {
        let dev = DeviceArray::from_slice(&data)?;
        Ok(Self {
            device: device.clone(),
            host: data,
            dev,
        })
    }

    /// Reallocate both sides to `len` zero-initialized elements.
    pub fn resize(&mut self, len: usize) -> Result<()> {
        self.host = vec![T::zeroed(); len];
        self.dev = DeviceArray::zeroed(len)?;
        Ok(())
    }

    /// Number of elements on each side.
    pub fn len(&self) -> usize {
        self.host.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
    }

    /// Host-side view. Only reflects device state after [`persist`](Self::persist).
    pub fn host(&self) -> &[T] {
        &self.host
    }

    /// Mutable host-side view.
    pub fn host_mut(&mut self) -> &mut [T] {
        &mut self.host
    }

    /// Device-side handle for kernel capture.
    pub fn device_array(&self) -> DeviceArray<T> {
        self.dev.clone()
    }

    /// Copy host contents to the device; blocks until the copy completes.
    pub fn upload(&self) -> Result<()> {
        let dev = self.dev.clone();
        let src: Arc<[T]> = Arc::from(self.host.as_slice());
        self.device
            .default_stream()
            .enqueue(move || dev.lock().copy_from_slice(&src))?;
        self.device.default_stream().synchronize()
    }

    /// Copy device contents back to the host.
    ///
    /// After return the host side mirrors device state as of this call's
    /// enqueue point on the device's default stream.
    pub fn persist(&mut self) -> Result<()> {
        let dev = self.dev.clone();
        let staging = Arc::new(Mutex::new(vec![T::zeroed(); self.host.len()]));
        let dst = Arc::clone(&staging);
        self.device
            .default_stream()
            .enqueue(move || dst.lock().copy_from_slice(&dev.lock()))?;
        self.device.default_stream().synchronize()?;
        self.host.copy_from_slice(&staging.lock());
        Ok(())
    }
}

/// A device-resident counter with an explicit host mirror.
///
/// Kernels increment the device cell atomically to reserve slots; the host
/// moves the value across the boundary with explicit transfers, never
/// implicitly.
#[derive(Default)]
pub struct DeviceScalar {
    cell: Arc<AtomicU64>,
    host: u64,
}

impl DeviceScalar {
    /// Create a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host mirror value as of the last transfer.
    pub fn host(&self) -> u64 {
        self.host
    }

    /// Set the host mirror (does not touch the device side).
    pub fn set_host(&mut self, value: u64) {
        self.host = value;
    }

    /// Device-side cell for kernel capture.
    pub fn device_cell(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.cell)
    }

    /// Enqueue a host-to-device copy of the mirror value.
    pub fn upload(&self, stream: &Stream) -> Result<()> {
        let cell = Arc::clone(&self.cell);
        let value = self.host;
        stream.enqueue(move || cell.store(value, Ordering::Relaxed))
    }

    /// Synchronize `stream`, then copy the device value into the host
    /// mirror and return it.
    ///
    /// Stands in for a blocking device-to-host scalar copy, which on real
    /// hardware orders after previously enqueued work.
    pub fn download_blocking(&mut self, stream: &Stream) -> Result<u64> {
        stream.synchronize()?;
        self.host = self.cell.load(Ordering::Relaxed);
        Ok(self.host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceSet;

    #[test]
    fn test_device_array_roundtrip() {
        let array = DeviceArray::from_slice(&[1u32, 2, 3, 4]).unwrap();
        assert_eq!(array.len(), 4);
        assert_eq!(&array.lock()[..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_device_array_zeroed() {
        let array = DeviceArray::<u64>::zeroed(16).unwrap();
        assert!(array.lock().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_buffer_upload_persist() {
        let devices = DeviceSet::new(1).unwrap();
        let mut buf = DeviceBuffer::<u32>::new(devices.device_at(0), 8).unwrap();

        buf.host_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        buf.upload().unwrap();

        // Clobber the host side, then read back from the device.
        buf.host_mut().fill(0);
        buf.persist().unwrap();
        assert_eq!(buf.host(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_persist_observes_enqueued_writes() {
        let devices = DeviceSet::new(1).unwrap();
        let mut buf = DeviceBuffer::<u32>::new(devices.device_at(0), 4).unwrap();

        // A write enqueued on the default stream before persist must be
        // visible to it.
        let dev = buf.device_array();
        devices
            .device_at(0)
            .default_stream()
            .enqueue(move || dev.lock()[2] = 42)
            .unwrap();
        buf.persist().unwrap();
        assert_eq!(buf.host()[2], 42);
    }

    #[test]
    fn test_buffer_resize() {
        let devices = DeviceSet::new(1).unwrap();
        let mut buf = DeviceBuffer::<u32>::from_vec(devices.device_at(0), vec![7; 3]).unwrap();
        buf.resize(10).unwrap();
        assert_eq!(buf.len(), 10);
        assert!(buf.host().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_scalar_upload_download() {
        let devices = DeviceSet::new(1).unwrap();
        let stream = devices.device_at(0).create_stream().unwrap();

        let mut scalar = DeviceScalar::new();
        scalar.set_host(99);
        scalar.upload(&stream).unwrap();

        let cell = scalar.device_cell();
        stream
            .enqueue(move || {
                cell.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(scalar.download_blocking(&stream).unwrap(), 100);
        assert_eq!(scalar.host(), 100);
    }
}
