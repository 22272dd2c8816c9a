//! Configuration warnings - suspicious but legal topology choices

use serde::{Deserialize, Serialize};

/// A configuration choice that does not abort construction.
///
/// Some valid setups desynchronize on purpose (a non-blocking DMA test on a
/// KVM host, say), so these are reported rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigWarning {
    /// Host and attached device disagree on lockstep mode.
    SyncModeMismatch {
        /// Host alias
        host: String,
        /// Device alias
        device: String,
        /// Host sync flag
        host_sync: bool,
        /// Device sync flag
        device_sync: bool,
    },
    /// Both sides synchronize, but at different granularities.
    SyncIntervalMismatch {
        /// Host alias
        host: String,
        /// Device alias
        device: String,
        /// Host `sync_period`
        sync_period: u64,
        /// Device `sync_interval`
        sync_interval: u64,
    },
    /// The two ends of a PCI link declare different latencies.
    PciLatencyMismatch {
        /// Host alias
        host: String,
        /// Device alias
        device: String,
        /// Host-side latency
        host_latency: u64,
        /// Device-side latency
        device_latency: u64,
    },
    /// `sync_interval` set on a device that does not synchronize.
    UnusedSyncInterval {
        /// Device alias
        device: String,
    },
    /// Device registered with the experiment but attached to no host.
    UnattachedDevice {
        /// Device alias
        device: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SyncModeMismatch {
                host,
                device,
                host_sync,
                device_sync,
            } => write!(
                f,
                "sync mode mismatch: host `{host}` sync={host_sync}, device `{device}` sync={device_sync}"
            ),
            Self::SyncIntervalMismatch {
                host,
                device,
                sync_period,
                sync_interval,
            } => write!(
                f,
                "sync granularity mismatch: host `{host}` sync_period={sync_period}, \
                 device `{device}` sync_interval={sync_interval}"
            ),
            Self::PciLatencyMismatch {
                host,
                device,
                host_latency,
                device_latency,
            } => write!(
                f,
                "pci latency mismatch: host `{host}` pci_latency={host_latency}, \
                 device `{device}` pci_latency={device_latency}"
            ),
            Self::UnusedSyncInterval { device } => write!(
                f,
                "device `{device}` sets sync_interval but does not synchronize"
            ),
            Self::UnattachedDevice { device } => {
                write!(f, "device `{device}` is not attached to any host")
            }
        }
    }
}
