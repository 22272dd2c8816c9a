//! Verifier - turns a result bundle into a verdict
//!
//! The verifier walks a plan derived from the experiment topology: every
//! expected component must be in the bundle, each waited-for host must
//! report its cycles per operation on stdout, and each device attached to it
//! must log the control-write start marker and the completion marker on
//! stderr. Host cycles and device main-clock latency are then reconciled.
//!
//! An experiment with no host the runner waits for has nothing to measure
//! and fails with a configuration error.
//!
//! Every error, including a panic while scanning, stops at this boundary and
//! becomes a failing [`Verdict`]; one malformed log never aborts a batch.
//!
//! ## Metric names
//!
//! The first waited host and its first device report plain names
//! (`cycles_per_op`, `sim_ns_per_op`, `elapsed_ticks`, `start_tick`,
//! `end_tick`). Further hosts are prefixed `<host>.`, further devices
//! `<host>.<device>.`. Integer fields of required markers (see
//! [`VerifierBuilder::require`]) are reported as `<tag>.<field>` under the
//! same prefixes.
//!
//! ## Example
//!
//! ```rust
//! use hwaccel_harness::bundle::{ComponentOutput, ResultBundle, Stream};
//! use hwaccel_harness::topology::{Device, Experiment, Host};
//! use hwaccel_harness::verify::{MetricValue, Verifier};
//!
//! let experiment = Experiment::builder("test0")
//!     .add_host(Host::builder("host").wait(true).pcidev("accel").build())
//!     .add_device(Device::builder("accel").build())
//!     .build()?;
//!
//! let bundle = ResultBundle::new()
//!     .with_component(
//!         "host.host",
//!         ComponentOutput::new(Stream::from_text("Cycles per operation: 8"), Stream::default()),
//!     )
//!     .with_component(
//!         "dev.host.accel",
//!         ComponentOutput::new(
//!             Stream::default(),
//!             Stream::from_text(
//!                 "MMIO Write: ctrl 1 ex_time=17597496001 main=17597491001\nDONE  main=17597500001",
//!             ),
//!         ),
//!     );
//!
//! let verdict = Verifier::new()?.verify(&experiment, &bundle);
//! assert!(verdict.passed());
//! assert_eq!(verdict.metric("sim_ns_per_op"), Some(MetricValue::Float(9000.0)));
//! # Ok::<(), hwaccel_harness::Error>(())
//! ```

mod state;
mod verdict;

pub use state::{PlanStep, VerificationPlan, VerifierState};
pub use verdict::{Failure, MetricValue, Metrics, Outcome, Verdict};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bundle::{ResultBundle, StreamKind};
use crate::extract::{EventExtractor, EventKind, EventPattern, ExtractedEvent, FieldValue};
use crate::reconcile::{ClockReconciler, ClockScale};
use crate::topology::{ComponentId, Experiment, Roles};
use crate::{Error, Result};

/// Serializable verifier settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Main-clock ticks per nanosecond
    pub clock_scale: ClockScale,
    /// Component identifier role prefixes
    pub roles: Roles,
}

/// Which end of a host/device link logs a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The host simulator
    Host,
    /// Each device attached to a measured host
    Device,
}

/// A registered marker every measured run must log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredMarker {
    side: Side,
    stream: StreamKind,
    tag: String,
}

impl RequiredMarker {
    /// Side that logs the marker.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Stream the marker is searched in.
    #[must_use]
    pub const fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Pattern tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Drives extraction and reconciliation for one run at a time.
///
/// A `Verifier` holds no per-run state; one instance can verify any number
/// of runs, from any number of threads.
#[derive(Debug, Clone)]
pub struct Verifier {
    extractor: EventExtractor,
    reconciler: ClockReconciler,
    roles: Roles,
    markers: Vec<RequiredMarker>,
}

impl Verifier {
    /// Create a verifier with default settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a built-in pattern fails to compile.
    pub fn new() -> Result<Self> {
        Self::from_config(&VerifierConfig::default())
    }

    /// Create a builder.
    #[must_use]
    pub fn builder() -> VerifierBuilder {
        VerifierBuilder::default()
    }

    /// Create a verifier from settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a built-in pattern fails to compile.
    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        Ok(Self {
            extractor: EventExtractor::new()?,
            reconciler: ClockReconciler::new(config.clock_scale),
            roles: config.roles.clone(),
            markers: Vec::new(),
        })
    }

    /// Get the role prefixes used for component identifiers.
    #[must_use]
    pub const fn roles(&self) -> &Roles {
        &self.roles
    }

    /// Extra markers measured runs must log, in registration order.
    #[must_use]
    pub fn required_markers(&self) -> &[RequiredMarker] {
        &self.markers
    }

    /// Get the clock reconciler.
    #[must_use]
    pub const fn reconciler(&self) -> &ClockReconciler {
        &self.reconciler
    }

    /// Derive the verification plan for an experiment.
    ///
    /// Hosts the runner does not wait for are only checked for presence,
    /// along with their devices.
    #[must_use]
    pub fn plan(&self, experiment: &Experiment) -> VerificationPlan {
        let mut plan = VerificationPlan::default();
        for host in experiment.hosts() {
            let host_id = ComponentId::host(&self.roles, host.alias());
            let devices: Vec<(String, ComponentId)> = experiment
                .devices_of(host)
                .map(|device| {
                    (
                        device.alias().to_string(),
                        ComponentId::device(&self.roles, host.alias(), device.alias()),
                    )
                })
                .collect();

            if host.wait() {
                plan.push(PlanStep::Measure {
                    host: host.alias().to_string(),
                    host_id,
                    devices,
                });
            } else {
                plan.push(PlanStep::Presence(host_id));
                for (_, id) in devices {
                    plan.push(PlanStep::Presence(id));
                }
            }
        }
        plan
    }

    /// Verify one run.
    ///
    /// Never panics and never returns an error: every problem becomes a
    /// failing verdict. A panic while scanning is caught after the process
    /// panic hook has run, so the default hook still prints it to stderr;
    /// install a quieter hook with [`std::panic::set_hook`] if that matters.
    #[must_use]
    pub fn verify(&self, experiment: &Experiment, bundle: &ResultBundle) -> Verdict {
        self.verify_traced(experiment, bundle).0
    }

    /// Verify one run, also returning the states it passed through.
    #[must_use]
    pub fn verify_traced(
        &self,
        experiment: &Experiment,
        bundle: &ResultBundle,
    ) -> (Verdict, Vec<VerifierState>) {
        if let Some(recorded) = bundle.exp_name() {
            if recorded != experiment.name() {
                warn!(
                    experiment = experiment.name(),
                    recorded, "result bundle was recorded for a different experiment"
                );
            }
        }

        let plan = self.plan(experiment);
        let mut run = Run::new(self, bundle);
        let outcome = match guarded(|| run.execute(&plan)) {
            Ok(()) => Outcome::Pass(std::mem::take(&mut run.metrics)),
            Err(failure) => Outcome::Fail(failure),
        };

        let passed = matches!(outcome, Outcome::Pass(_));
        run.transition(VerifierState::Done { passed });
        match &outcome {
            Outcome::Pass(metrics) => {
                info!(experiment = experiment.name(), metrics = metrics.len(), "run passed");
            }
            Outcome::Fail(failure) => {
                info!(experiment = experiment.name(), %failure, "run failed");
            }
        }

        (Verdict::new(experiment.name(), outcome), run.history)
    }
}

/// Builder for `Verifier`.
#[derive(Debug, Default)]
pub struct VerifierBuilder {
    ticks_per_ns: Option<u64>,
    roles: Roles,
    markers: Vec<(Side, StreamKind, EventPattern)>,
}

impl VerifierBuilder {
    /// Set main-clock ticks per nanosecond (default 1000).
    #[must_use]
    pub const fn clock_scale(mut self, ticks_per_ns: u64) -> Self {
        self.ticks_per_ns = Some(ticks_per_ns);
        self
    }

    /// Set the role prefix of host component identifiers (default `host`).
    #[must_use]
    pub fn host_role(mut self, role: impl Into<String>) -> Self {
        self.roles.host = role.into();
        self
    }

    /// Set the role prefix of device component identifiers (default `dev`).
    #[must_use]
    pub fn device_role(mut self, role: impl Into<String>) -> Self {
        self.roles.device = role.into();
        self
    }

    /// Require an extra marker in every measured run.
    ///
    /// The pattern is searched in `stream` of the host (or of each attached
    /// device, for [`Side::Device`]); a run without it fails with
    /// `MissingOutput`, and its integer fields become metrics.
    #[must_use]
    pub fn require(mut self, side: Side, stream: StreamKind, pattern: EventPattern) -> Self {
        self.markers.push((side, stream, pattern));
        self
    }

    /// Build the `Verifier`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for a zero clock scale, an empty role,
    /// or a pattern that clashes with a registered tag.
    pub fn build(self) -> Result<Verifier> {
        let scale = match self.ticks_per_ns {
            Some(ticks) => ClockScale::new(ticks)?,
            None => ClockScale::default(),
        };
        if self.roles.host.is_empty() || self.roles.device.is_empty() {
            return Err(Error::Configuration(
                "component roles must be non-empty".to_string(),
            ));
        }

        let mut verifier = Verifier::from_config(&VerifierConfig {
            clock_scale: scale,
            roles: self.roles,
        })?;
        for (side, stream, pattern) in self.markers {
            let tag = pattern.tag().to_string();
            verifier.extractor.register(pattern)?;
            verifier.markers.push(RequiredMarker { side, stream, tag });
        }
        Ok(verifier)
    }
}

/// Per-run state of one verification.
struct Run<'a> {
    verifier: &'a Verifier,
    bundle: &'a ResultBundle,
    state: VerifierState,
    history: Vec<VerifierState>,
    metrics: Metrics,
}

impl<'a> Run<'a> {
    fn new(verifier: &'a Verifier, bundle: &'a ResultBundle) -> Self {
        Self {
            verifier,
            bundle,
            state: VerifierState::Init,
            history: vec![VerifierState::Init],
            metrics: Metrics::default(),
        }
    }

    fn transition(&mut self, next: VerifierState) {
        debug!(from = ?self.state, to = ?next, "verifier transition");
        self.state = next;
        self.history.push(next);
    }

    fn execute(&mut self, plan: &VerificationPlan) -> std::result::Result<(), Failure> {
        for id in plan.component_ids() {
            self.bundle
                .component(id.as_str())
                .map_err(|e| Failure::from_error(&e))?;
        }

        let mut first_host = true;
        for step in plan.steps() {
            let PlanStep::Measure {
                host,
                host_id,
                devices,
            } = step
            else {
                continue;
            };

            self.transition(VerifierState::ExtractingHost);
            let cycles = self.extract(
                host_id,
                StreamKind::Stdout,
                EventKind::CyclesPerOperation.tag(),
            )?;
            let cycles_per_op = cycles
                .integer("cycles")
                .map_err(|e| Failure::from_error(&e).at(host_id, StreamKind::Stdout))?;
            let host_prefix = if first_host {
                String::new()
            } else {
                format!("{host}.")
            };
            self.metrics
                .insert(format!("{host_prefix}cycles_per_op"), cycles_per_op);
            self.required(Side::Host, host_id, &host_prefix)?;

            for (index, (device, device_id)) in devices.iter().enumerate() {
                self.transition(VerifierState::ExtractingDevice);
                let start =
                    self.extract(device_id, StreamKind::Stderr, EventKind::ControlStart.tag())?;
                let end = self.extract(device_id, StreamKind::Stderr, EventKind::Done.tag())?;

                let prefix = if first_host && index == 0 {
                    String::new()
                } else {
                    format!("{host}.{device}.")
                };
                self.required(Side::Device, device_id, &prefix)?;

                self.transition(VerifierState::Reconciling);
                let timing = self
                    .verifier
                    .reconciler
                    .reconcile_events(&cycles, &start, &end)
                    .map_err(|e| Failure::from_error(&e).at(device_id, StreamKind::Stderr))?;

                self.metrics
                    .insert(format!("{prefix}sim_ns_per_op"), timing.sim_ns_per_op);
                self.metrics
                    .insert(format!("{prefix}elapsed_ticks"), timing.elapsed_ticks);
                self.metrics
                    .insert(format!("{prefix}start_tick"), timing.start_tick);
                self.metrics
                    .insert(format!("{prefix}end_tick"), timing.end_tick);
            }
            first_host = false;
        }

        if first_host {
            return Err(Failure::from_error(&Error::Configuration(
                "no host is waited for, so no run can be measured".to_string(),
            )));
        }
        Ok(())
    }

    /// Scan one component for every required marker of `side`.
    fn required(
        &mut self,
        side: Side,
        id: &ComponentId,
        prefix: &str,
    ) -> std::result::Result<(), Failure> {
        let verifier = self.verifier;
        for marker in verifier.markers.iter().filter(|m| m.side == side) {
            let event = self.extract(id, marker.stream, &marker.tag)?;
            for (field, value) in event.fields() {
                if let FieldValue::Integer(value) = value {
                    self.metrics
                        .insert(format!("{prefix}{}.{field}", marker.tag), *value);
                }
            }
        }
        Ok(())
    }

    fn extract(
        &self,
        id: &ComponentId,
        stream: StreamKind,
        tag: &str,
    ) -> std::result::Result<ExtractedEvent, Failure> {
        let lines = self
            .bundle
            .stream(id.as_str(), stream)
            .map_err(|e| Failure::from_error(&e))?;

        match self.verifier.extractor.find(lines.lines(), tag) {
            Ok(Some(event)) => Ok(event),
            Ok(None) => {
                let what = self
                    .verifier
                    .extractor
                    .pattern(tag)
                    .map_or(tag, EventPattern::description);
                let error = Error::MissingOutput {
                    what: what.to_string(),
                    component: id.to_string(),
                    stream,
                };
                Err(Failure::from_error(&error).with_pattern(tag))
            }
            Err(e) => Err(Failure::from_error(&e).at(id, stream).with_pattern(tag)),
        }
    }
}

/// Run `f`, turning a panic into an `Unexpected` failure.
fn guarded<F>(f: F) -> std::result::Result<(), Failure>
where
    F: FnOnce() -> std::result::Result<(), Failure>,
{
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(Failure::unexpected(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
