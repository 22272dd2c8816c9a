//! Experiment - root entity of a co-simulation topology

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{ComponentId, ConfigWarning, Device, Host, Roles};
use crate::{Error, Result};

/// Experiment represents one validated co-simulation topology.
///
/// Only [`ExperimentBuilder::build`] (or [`Experiment::from_json`], which
/// goes through it) produces an `Experiment`, so every instance satisfies
/// the topology invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Experiment {
    name: String,
    checkpoint: bool,
    hosts: Vec<Host>,
    devices: Vec<Device>,
    #[serde(skip)]
    warnings: Vec<ConfigWarning>,
}

/// A (host, device) attachment edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment<'a> {
    /// Host end of the link
    pub host: &'a Host,
    /// Device end of the link
    pub device: &'a Device,
}

/// Wire shape of a topology declaration.
#[derive(Deserialize)]
struct Declaration {
    name: String,
    #[serde(default)]
    checkpoint: bool,
    #[serde(default)]
    hosts: Vec<Host>,
    #[serde(default)]
    devices: Vec<Device>,
}

impl Experiment {
    /// Create a builder for an experiment with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ExperimentBuilder {
        ExperimentBuilder::new(name)
    }

    /// Load a topology declaration from JSON, validating it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` on malformed input and `Error::Configuration`
    /// if the declared topology violates an invariant.
    pub fn from_json(json: &str) -> Result<Self> {
        let decl: Declaration = serde_json::from_str(json)?;
        let mut builder = Self::builder(decl.name).checkpoint(decl.checkpoint);
        for host in decl.hosts {
            builder = builder.add_host(host);
        }
        for device in decl.devices {
            builder = builder.add_device(device);
        }
        builder.build()
    }

    /// Serialize the topology declaration the external runner consumes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a checkpoint is restored before measurement.
    #[must_use]
    pub const fn checkpoint(&self) -> bool {
        self.checkpoint
    }

    /// All hosts, in registration order.
    #[must_use]
    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    /// All devices, in registration order.
    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Get a host by alias.
    #[must_use]
    pub fn host(&self, alias: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.alias() == alias)
    }

    /// Get a device by alias.
    #[must_use]
    pub fn device(&self, alias: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.alias() == alias)
    }

    /// Devices attached to `host`, in attachment order.
    pub fn devices_of<'a>(&'a self, host: &'a Host) -> impl Iterator<Item = &'a Device> + 'a {
        host.pci_devices()
            .iter()
            .filter_map(move |alias| self.device(alias))
    }

    /// All attachment edges, grouped by host.
    pub fn attachments(&self) -> impl Iterator<Item = Attachment<'_>> + '_ {
        self.hosts.iter().flat_map(move |host| {
            self.devices_of(host)
                .map(move |device| Attachment { host, device })
        })
    }

    /// Warnings raised while the experiment was built.
    #[must_use]
    pub fn warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    /// Every component identifier the runner files output under.
    ///
    /// Each host is followed by its attached devices.
    #[must_use]
    pub fn component_ids(&self, roles: &Roles) -> Vec<ComponentId> {
        let mut ids = Vec::with_capacity(self.hosts.len() + self.devices.len());
        for host in &self.hosts {
            ids.push(ComponentId::host(roles, host.alias()));
            for device in self.devices_of(host) {
                ids.push(ComponentId::device(roles, host.alias(), device.alias()));
            }
        }
        ids
    }
}

/// Builder for `Experiment`.
///
/// Adding hosts and devices never fails; all invariants are checked once,
/// in [`build`](Self::build).
#[derive(Debug)]
pub struct ExperimentBuilder {
    name: String,
    checkpoint: bool,
    hosts: Vec<Host>,
    devices: Vec<Device>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checkpoint: false,
            hosts: Vec::new(),
            devices: Vec::new(),
        }
    }

    /// Set whether a checkpoint is restored before measurement.
    #[must_use]
    pub const fn checkpoint(mut self, checkpoint: bool) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Register a host.
    #[must_use]
    pub fn add_host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }

    /// Register a device at the experiment level.
    #[must_use]
    pub fn add_device(mut self, device: Device) -> Self {
        self.devices.push(device);
        self
    }

    /// Validate and build the `Experiment`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` naming the first violated invariant:
    /// unsafe name, no hosts, bad or duplicate alias, attachment to an
    /// unregistered device, a device attached more than once, a waited host
    /// with no attached device, or a missing or zero synchronization
    /// interval.
    pub fn build(self) -> Result<Experiment> {
        validate_name(&self.name)?;
        if self.hosts.is_empty() {
            return Err(Error::Configuration(format!(
                "experiment `{}` has no hosts",
                self.name
            )));
        }
        validate_aliases("host", self.hosts.iter().map(Host::alias))?;
        validate_aliases("device", self.devices.iter().map(Device::alias))?;
        self.validate_attachments()?;
        self.validate_sync()?;

        let warnings = self.collect_warnings();
        for warning in &warnings {
            warn!(experiment = %self.name, "{warning}");
        }

        Ok(Experiment {
            name: self.name,
            checkpoint: self.checkpoint,
            hosts: self.hosts,
            devices: self.devices,
            warnings,
        })
    }

    fn validate_attachments(&self) -> Result<()> {
        let registered: HashSet<&str> = self.devices.iter().map(Device::alias).collect();
        let mut owner: HashMap<&str, &str> = HashMap::new();

        for host in &self.hosts {
            for device in host.pci_devices() {
                if !registered.contains(device.as_str()) {
                    return Err(Error::Configuration(format!(
                        "device `{device}` is attached to host `{}` but not registered with experiment `{}`",
                        host.alias(),
                        self.name
                    )));
                }
                if let Some(previous) = owner.insert(device.as_str(), host.alias()) {
                    return Err(Error::Configuration(format!(
                        "device `{device}` is attached to host `{previous}` and again to host `{}`",
                        host.alias()
                    )));
                }
            }
            if host.wait() && host.pci_devices().is_empty() {
                return Err(Error::Configuration(format!(
                    "host `{}` is waited for but has no attached device to measure",
                    host.alias()
                )));
            }
        }
        Ok(())
    }

    fn validate_sync(&self) -> Result<()> {
        for host in &self.hosts {
            if host.sync() && host.sync_period() == 0 {
                return Err(Error::Configuration(format!(
                    "host `{}` synchronizes with a zero sync_period",
                    host.alias()
                )));
            }
        }
        for device in &self.devices {
            if !device.sync() {
                continue;
            }
            match device.sync_interval() {
                None => {
                    return Err(Error::Configuration(format!(
                        "device `{}` synchronizes but has no sync_interval",
                        device.alias()
                    )))
                }
                Some(0) => {
                    return Err(Error::Configuration(format!(
                        "device `{}` synchronizes with a zero sync_interval",
                        device.alias()
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn collect_warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut attached: HashSet<&str> = HashSet::new();

        for host in &self.hosts {
            for alias in host.pci_devices() {
                attached.insert(alias.as_str());
                let Some(device) = self.devices.iter().find(|d| d.alias() == alias.as_str()) else {
                    continue;
                };

                if host.sync() != device.sync() {
                    warnings.push(ConfigWarning::SyncModeMismatch {
                        host: host.alias().to_string(),
                        device: device.alias().to_string(),
                        host_sync: host.sync(),
                        device_sync: device.sync(),
                    });
                } else if let (true, Some(interval)) = (device.sync(), device.sync_interval()) {
                    if interval != host.sync_period() {
                        warnings.push(ConfigWarning::SyncIntervalMismatch {
                            host: host.alias().to_string(),
                            device: device.alias().to_string(),
                            sync_period: host.sync_period(),
                            sync_interval: interval,
                        });
                    }
                }

                if host.pci_latency() != device.pci_latency() {
                    warnings.push(ConfigWarning::PciLatencyMismatch {
                        host: host.alias().to_string(),
                        device: device.alias().to_string(),
                        host_latency: host.pci_latency(),
                        device_latency: device.pci_latency(),
                    });
                }
            }
        }

        for device in &self.devices {
            if !device.sync() && device.sync_interval().is_some() {
                warnings.push(ConfigWarning::UnusedSyncInterval {
                    device: device.alias().to_string(),
                });
            }
            if !attached.contains(device.alias()) {
                warnings.push(ConfigWarning::UnattachedDevice {
                    device: device.alias().to_string(),
                });
            }
        }

        warnings
    }
}

/// Experiment names become directory and file names on the runner side.
fn validate_name(name: &str) -> Result<()> {
    let safe = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if safe {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "experiment name {name:?} is not filesystem-safe"
        )))
    }
}

fn validate_aliases<'a>(what: &str, aliases: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for alias in aliases {
        if alias.is_empty() || alias.contains('.') {
            return Err(Error::Configuration(format!(
                "{what} alias {alias:?} must be non-empty and must not contain '.'"
            )));
        }
        if !seen.insert(alias) {
            return Err(Error::Configuration(format!(
                "duplicate {what} alias `{alias}`"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accel() -> Device {
        Device::builder("accel").sync(true).sync_interval(100).pci_latency(100).build()
    }

    fn host() -> Host {
        Host::builder("host")
            .sync_period(100)
            .pci_latency(100)
            .wait(true)
            .pcidev("accel")
            .build()
    }

    #[test]
    fn test_build_valid_experiment() {
        let experiment = Experiment::builder("test0")
            .checkpoint(true)
            .add_host(host())
            .add_device(accel())
            .build()
            .unwrap();

        assert_eq!(experiment.name(), "test0");
        assert!(experiment.checkpoint());
        assert!(experiment.warnings().is_empty());
        assert_eq!(experiment.attachments().count(), 1);
    }

    #[test]
    fn test_unregistered_device_rejected() {
        let result = Experiment::builder("test0").add_host(host()).build();
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("test0-1.run_a").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a b").is_err());
    }

    #[test]
    fn test_alias_with_separator_rejected() {
        let result = Experiment::builder("t")
            .add_host(Host::builder("host.0").build())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_waited_host_without_device_rejected() {
        let result = Experiment::builder("t")
            .add_host(Host::builder("host").wait(true).build())
            .build();
        assert!(result.unwrap_err().to_string().contains("no attached device"));

        let background = Experiment::builder("t")
            .add_host(Host::builder("host").build())
            .build();
        assert!(background.is_ok());
    }

    #[test]
    fn test_sync_without_interval_rejected() {
        let result = Experiment::builder("t")
            .add_host(Host::builder("host").pcidev("accel").build())
            .add_device(Device::builder("accel").sync(true).build())
            .build();
        assert!(result.unwrap_err().to_string().contains("no sync_interval"));
    }
}
