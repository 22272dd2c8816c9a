//! Error types for the hwaccel harness
//!
//! Construction-time errors (`Configuration`) abort topology creation.
//! Everything else is raised while verifying a run and is folded into a
//! failing [`Verdict`](crate::verify::Verdict) at the verifier boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bundle::StreamKind;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
#[derive(Error, Debug)]
pub enum Error {
    /// Topology invariant violated; no experiment is produced
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Result bundle has no entry for a component the experiment expects
    #[error("Missing component: no output captured for `{component}`")]
    MissingComponent {
        /// Component identifier that was looked up
        component: String,
    },

    /// Required marker is absent from an otherwise present stream
    #[error("Missing output: could not find {what} in `{component}` {stream}")]
    MissingOutput {
        /// Human-readable name of the marker (e.g. "cycles line")
        what: String,
        /// Component identifier whose stream was scanned
        component: String,
        /// Which stream was scanned
        stream: StreamKind,
    },

    /// Captured text does not parse as the expected type
    #[error("Parse error: field `{field}` of pattern `{pattern}` has value {value:?}: {reason}")]
    ParseError {
        /// Pattern tag
        pattern: String,
        /// Field name within the pattern
        field: String,
        /// Raw captured text
        value: String,
        /// Why conversion failed
        reason: String,
    },

    /// Device completion marker precedes the start marker on the main clock
    #[error("Timing anomaly: end tick {end} precedes start tick {start} on the main clock")]
    TimingAnomaly {
        /// Start tick (MMIO ctrl write)
        start: u64,
        /// End tick (DONE marker)
        end: u64,
    },

    /// Anything not anticipated, including panics caught at the verifier boundary
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classification of an [`Error`], carried by failing verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`Error::Configuration`]
    Configuration,
    /// See [`Error::MissingComponent`]
    MissingComponent,
    /// See [`Error::MissingOutput`]
    MissingOutput,
    /// See [`Error::ParseError`]
    Parse,
    /// See [`Error::TimingAnomaly`]
    TimingAnomaly,
    /// See [`Error::Unexpected`], [`Error::Io`] and [`Error::Json`]
    Unexpected,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::MissingComponent { .. } => ErrorKind::MissingComponent,
            Self::MissingOutput { .. } => ErrorKind::MissingOutput,
            Self::ParseError { .. } => ErrorKind::Parse,
            Self::TimingAnomaly { .. } => ErrorKind::TimingAnomaly,
            Self::Unexpected(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Unexpected,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "ConfigurationError",
            Self::MissingComponent => "MissingComponentError",
            Self::MissingOutput => "MissingOutputError",
            Self::Parse => "ParseError",
            Self::TimingAnomaly => "TimingAnomalyError",
            Self::Unexpected => "UnexpectedError",
        };
        f.write_str(name)
    }
}
