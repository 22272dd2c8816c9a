//! Device - a simulated accelerator attached to a host over PCI

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::host::defaults;

/// Device represents one simulated accelerator.
///
/// Sizing parameters (`op_latency`, `matrix_size`, `mem_size`, queue depths,
/// ...) are opaque to the harness and kept in name order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    alias: String,
    #[serde(default)]
    sync: bool,
    #[serde(default)]
    sync_interval: Option<u64>,
    #[serde(default = "defaults::pci_latency")]
    pci_latency: u64,
    #[serde(default)]
    sizing: BTreeMap<String, u64>,
}

impl Device {
    /// Create a builder for a device with the given alias.
    #[must_use]
    pub fn builder(alias: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::new(alias)
    }

    /// Get the device alias.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Whether the device runs in lockstep with its host.
    #[must_use]
    pub const fn sync(&self) -> bool {
        self.sync
    }

    /// Lockstep interval; only meaningful when [`sync`](Self::sync) is set.
    #[must_use]
    pub const fn sync_interval(&self) -> Option<u64> {
        self.sync_interval
    }

    /// Device-side PCI link latency.
    #[must_use]
    pub const fn pci_latency(&self) -> u64 {
        self.pci_latency
    }

    /// Get a sizing parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<u64> {
        self.sizing.get(name).copied()
    }

    /// All sizing parameters.
    #[must_use]
    pub const fn sizing(&self) -> &BTreeMap<String, u64> {
        &self.sizing
    }
}

/// Builder for `Device`.
#[derive(Debug)]
pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    /// Create a new unsynchronized device builder.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            device: Device {
                alias: alias.into(),
                sync: false,
                sync_interval: None,
                pci_latency: defaults::PCI_LATENCY,
                sizing: BTreeMap::new(),
            },
        }
    }

    /// Set whether the device runs in lockstep with its host.
    ///
    /// A synchronized device needs a [`sync_interval`](Self::sync_interval).
    #[must_use]
    pub const fn sync(mut self, sync: bool) -> Self {
        self.device.sync = sync;
        self
    }

    /// Set the lockstep interval.
    #[must_use]
    pub const fn sync_interval(mut self, interval: u64) -> Self {
        self.device.sync_interval = Some(interval);
        self
    }

    /// Set the device-side PCI latency.
    #[must_use]
    pub const fn pci_latency(mut self, pci_latency: u64) -> Self {
        self.device.pci_latency = pci_latency;
        self
    }

    /// Set a sizing parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: u64) -> Self {
        self.device.sizing.insert(name.into(), value);
        self
    }

    /// Build the `Device`.
    #[must_use]
    pub fn build(self) -> Device {
        self.device
    }
}
