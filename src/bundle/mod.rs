//! Result bundle - captured output of one completed simulation run
//!
//! The external runner writes one results file per experiment run:
//!
//! ```text
//! {
//!   "exp_name": "test0",
//!   "start_time": 1700000000.25,
//!   "end_time": 1700000042.75,
//!   "success": true,
//!   "sims": {
//!     "host.host":      { "stdout": [...], "stderr": [...] },
//!     "dev.host.accel": { "stdout": [...], "stderr": [...] }
//!   }
//! }
//! ```
//!
//! The bundle is read-only once loaded. Other per-component keys the runner
//! records (command lines, simulator class) are ignored.

mod stream;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub use stream::{Stream, StreamKind};

use crate::{Error, Result};

/// Both captured streams of one simulated component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentOutput {
    #[serde(default)]
    stdout: Stream,
    #[serde(default)]
    stderr: Stream,
}

impl ComponentOutput {
    /// Create a component record from its two streams.
    #[must_use]
    pub const fn new(stdout: Stream, stderr: Stream) -> Self {
        Self { stdout, stderr }
    }

    /// Get the standard output stream.
    #[must_use]
    pub const fn stdout(&self) -> &Stream {
        &self.stdout
    }

    /// Get the standard error stream.
    #[must_use]
    pub const fn stderr(&self) -> &Stream {
        &self.stderr
    }

    /// Get a stream by kind.
    #[must_use]
    pub const fn stream(&self, kind: StreamKind) -> &Stream {
        match kind {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }
}

/// Mapping from component identifier to captured output, plus the runner's
/// run metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(default)]
    sims: BTreeMap<String, ComponentOutput>,
}

impl ResultBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bundle from a JSON results document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a bundle from a JSON results file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Json` if it
    /// is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Add a component's captured output.
    #[must_use]
    pub fn with_component(mut self, id: impl Into<String>, output: ComponentOutput) -> Self {
        self.sims.insert(id.into(), output);
        self
    }

    /// Set the experiment name recorded by the runner.
    #[must_use]
    pub fn with_exp_name(mut self, name: impl Into<String>) -> Self {
        self.exp_name = Some(name.into());
        self
    }

    /// Set the run's wall-clock bounds, in seconds since the Unix epoch.
    #[must_use]
    pub const fn with_run_times(mut self, start_time: f64, end_time: f64) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// Experiment name recorded by the runner, if any.
    #[must_use]
    pub fn exp_name(&self) -> Option<&str> {
        self.exp_name.as_deref()
    }

    /// Runner's own success flag, if recorded.
    #[must_use]
    pub const fn success(&self) -> Option<bool> {
        self.success
    }

    /// When the run started, if recorded.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_time.and_then(epoch_to_datetime)
    }

    /// When the run ended, if recorded.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_time.and_then(epoch_to_datetime)
    }

    /// Wall-clock duration of the whole run, if both bounds are recorded.
    #[must_use]
    pub fn wall_time(&self) -> Option<TimeDelta> {
        Some(self.ended_at()? - self.started_at()?)
    }

    /// Number of components in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sims.len()
    }

    /// Check if the bundle holds no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }

    /// Component identifiers, in sorted order.
    pub fn component_ids(&self) -> impl Iterator<Item = &str> {
        self.sims.keys().map(String::as_str)
    }

    /// Check if a component is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sims.contains_key(id)
    }

    /// Get a component's captured output.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingComponent` if the runner recorded nothing for `id`.
    pub fn component(&self, id: &str) -> Result<&ComponentOutput> {
        self.sims.get(id).ok_or_else(|| Error::MissingComponent {
            component: id.to_string(),
        })
    }

    /// Get one stream of a component.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingComponent` if the runner recorded nothing for `id`.
    pub fn stream(&self, id: &str, kind: StreamKind) -> Result<&Stream> {
        Ok(self.component(id)?.stream(kind))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn epoch_to_datetime(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
