//! # hwaccel-harness: Host/Accelerator Co-Simulation Verification
//!
//! **Version**: 0.1.0
//!
//! A test harness for simulation experiments in which one or more simulated
//! host machines drive simulated hardware accelerators over a PCI-like
//! link. The crate describes an experiment topology, loads the output a
//! runner captured from every simulator process, finds the markers each
//! component logs, and reconciles host cycles with device main-clock
//! timestamps into a pass/fail verdict with metrics.
//!
//! ## Pipeline
//!
//! - [`topology`]: hosts, devices, attachments, validated up front
//! - [`bundle`]: captured stdout/stderr per component, loaded from JSON
//! - [`extract`]: first-match marker search over a log stream
//! - [`reconcile`]: main-clock ticks to nanoseconds per operation
//! - [`verify`]: the state machine that ties it together
//! - [`report`] and [`batch`]: presenting and scaling verdicts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hwaccel_harness::bundle::ResultBundle;
//! use hwaccel_harness::topology::{Application, Device, Experiment, Host};
//! use hwaccel_harness::verify::Verifier;
//!
//! let experiment = Experiment::builder("test0")
//!     .add_host(
//!         Host::builder("host")
//!             .wait(true)
//!             .app(Application::new("AccelApp").arg(8))
//!             .pcidev("accel")
//!             .build(),
//!     )
//!     .add_device(Device::builder("accel").sync(true).sync_interval(500).build())
//!     .build()?;
//!
//! let bundle = ResultBundle::load("out/test0-1.json")?;
//! let verdict = Verifier::new()?.verify(&experiment, &bundle);
//! hwaccel_harness::report::print_report(&verdict)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod batch;
pub mod bundle;
pub mod error;
pub mod extract;
pub mod reconcile;
pub mod report;
pub mod topology;
pub mod verify;

pub use error::{Error, ErrorKind, Result};
