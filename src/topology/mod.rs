//! Experiment topology model
//!
//! Declares what a co-simulation is made of: hosts, the accelerator devices
//! attached to them, and the timing parameters of each link.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Host (N) ──< attached Device alias (N)
//!            (1) ──< Device (N)
//! ```
//!
//! Every attached alias must resolve to a registered device. Hosts and
//! devices are assembled with builders; the experiment validates the whole
//! graph once, when it is built.
//!
//! ## Usage
//!
//! ```rust
//! use hwaccel_harness::topology::{Application, Device, Experiment, Host, Roles};
//!
//! let accel = Device::builder("accel")
//!     .sync(true)
//!     .sync_interval(100)
//!     .pci_latency(100)
//!     .build();
//!
//! let host = Host::builder("host")
//!     .cpu_type("TimingSimpleCPU")
//!     .cpu_freq("1GHz")
//!     .sync_period(100)
//!     .pci_latency(100)
//!     .app(Application::new("accel").arg(8))
//!     .pcidev("accel")
//!     .wait(true)
//!     .build();
//!
//! let experiment = Experiment::builder("test0")
//!     .checkpoint(true)
//!     .add_device(accel)
//!     .add_host(host)
//!     .build()?;
//!
//! let ids = experiment.component_ids(&Roles::default());
//! assert_eq!(ids[0].as_str(), "host.host");
//! assert_eq!(ids[1].as_str(), "dev.host.accel");
//! # Ok::<(), hwaccel_harness::Error>(())
//! ```

mod application;
mod component;
mod device;
mod experiment;
mod host;
mod warning;

pub use application::Application;
pub use component::{ComponentId, Roles};
pub use device::{Device, DeviceBuilder};
pub use experiment::{Attachment, Experiment, ExperimentBuilder};
pub use host::{Host, HostBuilder};
pub use warning::ConfigWarning;
