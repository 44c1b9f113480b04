//! Virtual devices and pairwise peer access.

use parking_lot::RwLock;
use tracing::info;

use crate::error::{CoreError, Result};
use crate::stream::Stream;

/// Index of a virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

/// One virtual device: an execution context with a default stream.
///
/// Cloning a `Device` yields another handle to the same context.
#[derive(Clone)]
pub struct Device {
    id: DeviceId,
    default_stream: Stream,
}

impl Device {
    fn new(id: DeviceId) -> Result<Self> {
        Ok(Self {
            id,
            default_stream: Stream::spawn(id)?,
        })
    }

    /// The device's index.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// The device's default stream, used by synchronous utility transfers.
    pub fn default_stream(&self) -> &Stream {
        &self.default_stream
    }

    /// Create an additional stream on this device.
    pub fn create_stream(&self) -> Result<Stream> {
        Stream::spawn(self.id)
    }
}

/// The devices participating in a run, with a pairwise peer-access matrix.
///
/// Peer access must be enabled for every participating pair before any
/// cross-device transfer runs; transfers between non-peered devices are an
/// environmental misconfiguration and fatal.
pub struct DeviceSet {
    devices: Vec<Device>,
    peer: RwLock<Vec<Vec<bool>>>,
}

impl DeviceSet {
    /// Create `count` virtual devices. Peer access starts disabled.
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(CoreError::InvalidConfig(
                "device count must be nonzero".to_string(),
            ));
        }
        let devices = (0..count)
            .map(|i| Device::new(DeviceId(i)))
            .collect::<Result<Vec<_>>>()?;
        info!("initialized virtual device set ({count} devices)");
        Ok(Self {
            devices,
            peer: RwLock::new(vec![vec![false; count]; count]),
        })
    }

    /// Number of devices in the set.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device by id.
    pub fn device(&self, id: DeviceId) -> &Device {
        &self.devices[id.0]
    }

    /// Look up a device by raw index.
    pub fn device_at(&self, index: usize) -> &Device {
        &self.devices[index]
    }

    /// All devices in the set.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Enable peer access for the ordered pair `(from, to)`.
    pub fn enable_peer_access(&self, from: DeviceId, to: DeviceId) -> Result<()> {
        if from.0 >= self.devices.len() || to.0 >= self.devices.len() {
            return Err(CoreError::PeerAccessUnavailable {
                from: from.0,
                to: to.0,
            });
        }
        self.peer.write()[from.0][to.0] = true;
        Ok(())
    }

    /// Enable peer access between every ordered pair of devices.
    pub fn enable_all_peer_access(&self) -> Result<()> {
        for from in 0..self.devices.len() {
            for to in 0..self.devices.len() {
                if from != to {
                    self.enable_peer_access(DeviceId(from), DeviceId(to))?;
                }
            }
        }
        Ok(())
    }

    /// Whether peer access is enabled for `(from, to)`.
    pub fn peer_enabled(&self, from: DeviceId, to: DeviceId) -> bool {
        self.peer
            .read()
            .get(from.0)
            .and_then(|row| row.get(to.0))
            .copied()
            .unwrap_or(false)
    }

    /// Error unless `(from, to)` has peer access enabled.
    pub fn require_peer(&self, from: DeviceId, to: DeviceId) -> Result<()> {
        if self.peer_enabled(from, to) {
            Ok(())
        } else {
            Err(CoreError::PeerAccessUnavailable {
                from: from.0,
                to: to.0,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_set_creation() {
        let set = DeviceSet::new(4).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.device_at(2).id(), DeviceId(2));
    }

    #[test]
    fn test_zero_devices_rejected() {
        assert!(matches!(
            DeviceSet::new(0),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_peer_access_matrix() {
        let set = DeviceSet::new(3).unwrap();
        assert!(!set.peer_enabled(DeviceId(0), DeviceId(1)));

        set.enable_peer_access(DeviceId(0), DeviceId(1)).unwrap();
        assert!(set.peer_enabled(DeviceId(0), DeviceId(1)));
        // Peer access is directional.
        assert!(!set.peer_enabled(DeviceId(1), DeviceId(0)));
    }

    #[test]
    fn test_enable_all_peer_access() {
        let set = DeviceSet::new(3).unwrap();
        set.enable_all_peer_access().unwrap();

        for from in 0..3 {
            for to in 0..3 {
                if from != to {
                    assert!(set.require_peer(DeviceId(from), DeviceId(to)).is_ok());
                }
            }
        }
    }

    #[test]
    fn test_require_peer_unavailable() {
        let set = DeviceSet::new(2).unwrap();
        assert!(matches!(
            set.require_peer(DeviceId(0), DeviceId(1)),
            Err(CoreError::PeerAccessUnavailable { from: 0, to: 1 })
        ));
    }
}
