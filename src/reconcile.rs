//! Clock reconciliation - host cycles next to device main-clock latency
//!
//! The host reports cycles per operation from its own cycle counter. The
//! device timestamps the control write that starts an operation and the
//! completion of that operation on the shared main clock. The two paths are
//! independent on purpose: a bug in one cannot silently validate the other.
//! Both figures are reported side by side; no numeric relationship between
//! them is asserted here.

use serde::{Deserialize, Serialize};

use crate::extract::ExtractedEvent;
use crate::{Error, Result};

/// Main-clock ticks per nanosecond.
///
/// The device simulator's main clock counts picoseconds, hence the default
/// of 1000. Kept configurable for simulators with a different tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ClockScale(u64);

impl ClockScale {
    /// Picosecond main clock.
    pub const PICOSECONDS: Self = Self(1000);

    /// Create a scale of `ticks_per_ns` main-clock ticks per nanosecond.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `ticks_per_ns` is zero.
    pub fn new(ticks_per_ns: u64) -> Result<Self> {
        if ticks_per_ns == 0 {
            return Err(Error::Configuration(
                "clock scale must be at least one tick per nanosecond".to_string(),
            ));
        }
        Ok(Self(ticks_per_ns))
    }

    /// Ticks per nanosecond.
    #[must_use]
    pub const fn ticks_per_ns(self) -> u64 {
        self.0
    }
}

impl Default for ClockScale {
    fn default() -> Self {
        Self::PICOSECONDS
    }
}

impl TryFrom<u64> for ClockScale {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ClockScale> for u64 {
    fn from(scale: ClockScale) -> Self {
        scale.0
    }
}

/// Latency figures derived from one host report and one device start/end pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Host-reported cycles per operation
    pub cycles_per_op: u64,
    /// Main-clock tick of the control write
    pub start_tick: u64,
    /// Main-clock tick of completion
    pub end_tick: u64,
    /// `end_tick - start_tick`
    pub elapsed_ticks: u64,
    /// Elapsed main-clock time in nanoseconds
    pub sim_ns_per_op: f64,
}

/// Combines host cycles with device main-clock timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockReconciler {
    scale: ClockScale,
}

impl ClockReconciler {
    /// Create a reconciler with the given clock scale.
    #[must_use]
    pub const fn new(scale: ClockScale) -> Self {
        Self { scale }
    }

    /// Get the clock scale.
    #[must_use]
    pub const fn scale(&self) -> ClockScale {
        self.scale
    }

    /// Reconcile raw values.
    ///
    /// # Errors
    ///
    /// Returns `Error::TimingAnomaly` if `end` precedes `start`.
    #[allow(clippy::cast_precision_loss)]
    pub fn reconcile(&self, cycles: u64, start: u64, end: u64) -> Result<Reconciliation> {
        let elapsed = end
            .checked_sub(start)
            .ok_or(Error::TimingAnomaly { start, end })?;

        Ok(Reconciliation {
            cycles_per_op: cycles,
            start_tick: start,
            end_tick: end,
            elapsed_ticks: elapsed,
            sim_ns_per_op: elapsed as f64 / self.scale.ticks_per_ns() as f64,
        })
    }

    /// Reconcile extracted markers: `cycles` from the host report, `main`
    /// from the device start and completion markers.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` if an event lacks its integer field and
    /// `Error::TimingAnomaly` if completion precedes the start.
    pub fn reconcile_events(
        &self,
        cycles: &ExtractedEvent,
        start: &ExtractedEvent,
        end: &ExtractedEvent,
    ) -> Result<Reconciliation> {
        self.reconcile(
            cycles.integer("cycles")?,
            start.integer("main")?,
            end.integer("main")?,
        )
    }
}
