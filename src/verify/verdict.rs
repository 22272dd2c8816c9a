//! Verdict - outcome of verifying one run

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bundle::StreamKind;
use crate::error::{Error, ErrorKind};

/// Value of one metric.
///
/// Counters and main-clock ticks stay integers so they match the extracted
/// values exactly; only derived rates are floating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Exact count or tick
    Integer(u64),
    /// Derived rate
    Float(f64),
}

impl MetricValue {
    /// Get the integer value, if this is a count.
    #[must_use]
    pub const fn as_u64(self) -> Option<u64> {
        match self {
            Self::Integer(value) => Some(value),
            Self::Float(_) => None,
        }
    }

    /// Get the value as a float (lossy above 2^53 for counts).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => fmt::Display::fmt(value, f),
            Self::Float(value) => fmt::Display::fmt(value, f),
        }
    }
}

/// Metric name → value, in the order the verifier recorded them.
///
/// Recording follows the verification plan, so the first measured host
/// comes first. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics(Vec<(String, MetricValue)>);

impl Metrics {
    pub(super) fn insert(&mut self, name: String, value: impl Into<MetricValue>) {
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    /// Get a metric by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    /// Iterate over `(name, value)` pairs in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, MetricValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no metric was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Metrics {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricsVisitor;

        impl<'de> Visitor<'de> for MetricsVisitor {
            type Value = Metrics;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of metric names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Metrics, A::Error> {
                let mut metrics = Metrics::default();
                while let Some((name, value)) = access.next_entry::<String, MetricValue>()? {
                    metrics.insert(name, value);
                }
                Ok(metrics)
            }
        }

        deserializer.deserialize_map(MetricsVisitor)
    }
}

/// Error record of a failing verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    kind: ErrorKind,
    message: String,
    component: Option<String>,
    stream: Option<StreamKind>,
    pattern: Option<String>,
}

impl Failure {
    /// Record an error, keeping whatever context it carries.
    #[must_use]
    pub fn from_error(error: &Error) -> Self {
        let mut failure = Self {
            kind: error.kind(),
            message: error.to_string(),
            component: None,
            stream: None,
            pattern: None,
        };
        match error {
            Error::MissingComponent { component } => {
                failure.component = Some(component.clone());
            }
            Error::MissingOutput {
                component, stream, ..
            } => {
                failure.component = Some(component.clone());
                failure.stream = Some(*stream);
            }
            Error::ParseError { pattern, .. } => failure.pattern = Some(pattern.clone()),
            _ => {}
        }
        failure
    }

    /// Record a panic or other unanticipated condition.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::from_error(&Error::Unexpected(message.into()))
    }

    /// Fill in the stream being scanned, unless already known.
    #[must_use]
    pub fn at(mut self, component: impl ToString, stream: StreamKind) -> Self {
        self.component.get_or_insert_with(|| component.to_string());
        self.stream.get_or_insert(stream);
        self
    }

    /// Fill in the pattern being searched, unless already known.
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern.get_or_insert_with(|| pattern.into());
        self
    }

    /// Error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Component whose output was involved, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Stream that was being scanned, if any.
    #[must_use]
    pub const fn stream(&self) -> Option<StreamKind> {
        self.stream
    }

    /// Pattern tag that was being searched, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Pass with metrics, or fail with an error record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    /// Every expected marker was found and reconciled
    Pass(Metrics),
    /// Verification stopped at the first problem
    Fail(Failure),
}

/// Outcome of verifying one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    experiment: String,
    outcome: Outcome,
}

impl Verdict {
    /// Create a verdict.
    #[must_use]
    pub fn new(experiment: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            experiment: experiment.into(),
            outcome,
        }
    }

    /// Name of the verified experiment.
    #[must_use]
    pub fn experiment(&self) -> &str {
        &self.experiment
    }

    /// Get the outcome.
    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Whether the run passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Pass(_))
    }

    /// Metrics of a passing run.
    #[must_use]
    pub const fn metrics(&self) -> Option<&Metrics> {
        match &self.outcome {
            Outcome::Pass(metrics) => Some(metrics),
            Outcome::Fail(_) => None,
        }
    }

    /// Get one metric of a passing run.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<MetricValue> {
        self.metrics()?.get(name)
    }

    /// Error record of a failing run.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Pass(_) => None,
            Outcome::Fail(failure) => Some(failure),
        }
    }
}
