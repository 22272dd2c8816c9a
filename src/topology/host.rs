//! Host - a simulated CPU node that devices attach to

use serde::{Deserialize, Serialize};

use super::Application;

/// Defaults applied when a host parameter is not set.
pub(super) mod defaults {
    pub const CPU_TYPE: &str = "TimingSimpleCPU";
    pub const CPU_FREQ: &str = "4GHz";
    pub const CORES: u32 = 1;
    pub const SYNC_PERIOD: u64 = 500;
    pub const PCI_LATENCY: u64 = 500;

    pub fn cpu_type() -> String {
        CPU_TYPE.to_string()
    }

    pub fn cpu_freq() -> String {
        CPU_FREQ.to_string()
    }

    pub const fn cores() -> u32 {
        CORES
    }

    pub const fn sync_period() -> u64 {
        SYNC_PERIOD
    }

    pub const fn pci_latency() -> u64 {
        PCI_LATENCY
    }

    pub const fn enabled() -> bool {
        true
    }
}

/// Host represents one simulated CPU node.
///
/// The execution-model parameters (`cpu_type`, `cpu_freq`, `cores`) are
/// passed through to the runner untouched. `sync_period` and `pci_latency`
/// describe the link towards attached devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    alias: String,
    #[serde(default = "defaults::cpu_type")]
    cpu_type: String,
    #[serde(default = "defaults::cpu_freq")]
    cpu_freq: String,
    #[serde(default = "defaults::cores")]
    cores: u32,
    #[serde(default = "defaults::enabled")]
    sync: bool,
    #[serde(default = "defaults::sync_period")]
    sync_period: u64,
    #[serde(default = "defaults::pci_latency")]
    pci_latency: u64,
    #[serde(default)]
    wait: bool,
    #[serde(default = "defaults::enabled")]
    checkpoint: bool,
    #[serde(default)]
    app: Option<Application>,
    #[serde(default)]
    pci_devices: Vec<String>,
}

impl Host {
    /// Create a builder for a host with the given alias.
    #[must_use]
    pub fn builder(alias: impl Into<String>) -> HostBuilder {
        HostBuilder::new(alias)
    }

    /// Get the host alias.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Get the CPU model tag.
    #[must_use]
    pub fn cpu_type(&self) -> &str {
        &self.cpu_type
    }

    /// Get the CPU clock frequency.
    #[must_use]
    pub fn cpu_freq(&self) -> &str {
        &self.cpu_freq
    }

    /// Get the core count.
    #[must_use]
    pub const fn cores(&self) -> u32 {
        self.cores
    }

    /// Whether the host expects lockstep synchronization with its devices.
    #[must_use]
    pub const fn sync(&self) -> bool {
        self.sync
    }

    /// Time-sync granularity the host demands of attached devices.
    #[must_use]
    pub const fn sync_period(&self) -> u64 {
        self.sync_period
    }

    /// Host-side PCI link latency.
    #[must_use]
    pub const fn pci_latency(&self) -> u64 {
        self.pci_latency
    }

    /// Whether the runner blocks for this host to terminate.
    #[must_use]
    pub const fn wait(&self) -> bool {
        self.wait
    }

    /// Whether this host restores the experiment checkpoint.
    #[must_use]
    pub const fn checkpoint(&self) -> bool {
        self.checkpoint
    }

    /// Get the application descriptor, if any.
    #[must_use]
    pub const fn app(&self) -> Option<&Application> {
        self.app.as_ref()
    }

    /// Aliases of the devices attached to this host, in attachment order.
    #[must_use]
    pub fn pci_devices(&self) -> &[String] {
        &self.pci_devices
    }
}

/// Builder for `Host`.
#[derive(Debug)]
pub struct HostBuilder {
    host: Host,
}

impl HostBuilder {
    /// Create a new builder with default parameters.
    #[must_use]
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            host: Host {
                alias: alias.into(),
                cpu_type: defaults::cpu_type(),
                cpu_freq: defaults::cpu_freq(),
                cores: defaults::CORES,
                sync: true,
                sync_period: defaults::SYNC_PERIOD,
                pci_latency: defaults::PCI_LATENCY,
                wait: false,
                checkpoint: true,
                app: None,
                pci_devices: Vec::new(),
            },
        }
    }

    /// Set the CPU model tag (e.g. `TimingSimpleCPU`, `X86KvmCPU`).
    #[must_use]
    pub fn cpu_type(mut self, cpu_type: impl Into<String>) -> Self {
        self.host.cpu_type = cpu_type.into();
        self
    }

    /// Set the CPU clock frequency (e.g. `1GHz`).
    #[must_use]
    pub fn cpu_freq(mut self, cpu_freq: impl Into<String>) -> Self {
        self.host.cpu_freq = cpu_freq.into();
        self
    }

    /// Set the core count.
    #[must_use]
    pub const fn cores(mut self, cores: u32) -> Self {
        self.host.cores = cores;
        self
    }

    /// Set whether the host runs in lockstep with its devices.
    #[must_use]
    pub const fn sync(mut self, sync: bool) -> Self {
        self.host.sync = sync;
        self
    }

    /// Set the synchronization period.
    #[must_use]
    pub const fn sync_period(mut self, sync_period: u64) -> Self {
        self.host.sync_period = sync_period;
        self
    }

    /// Set the host-side PCI latency.
    #[must_use]
    pub const fn pci_latency(mut self, pci_latency: u64) -> Self {
        self.host.pci_latency = pci_latency;
        self
    }

    /// Set whether the runner waits for this host to terminate.
    #[must_use]
    pub const fn wait(mut self, wait: bool) -> Self {
        self.host.wait = wait;
        self
    }

    /// Opt this host in or out of checkpoint restore.
    #[must_use]
    pub const fn checkpoint(mut self, checkpoint: bool) -> Self {
        self.host.checkpoint = checkpoint;
        self
    }

    /// Set the application this host runs.
    #[must_use]
    pub fn app(mut self, app: Application) -> Self {
        self.host.app = Some(app);
        self
    }

    /// Attach a device by alias.
    ///
    /// The device must also be registered with the experiment; this is
    /// checked when the experiment is built.
    #[must_use]
    pub fn pcidev(mut self, device: impl Into<String>) -> Self {
        self.host.pci_devices.push(device.into());
        self
    }

    /// Build the `Host`.
    #[must_use]
    pub fn build(self) -> Host {
        self.host
    }
}
