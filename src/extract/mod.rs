//! Event extraction - first-match marker scanning over captured streams
//!
//! Markers are described by a table of tagged [`EventPattern`] descriptors
//! (tag → line-anchored regex → typed fields). Adding a marker kind means
//! registering a descriptor; the scan itself never changes.
//!
//! Only the **first** matching line counts. Markers are expected once in the
//! measured window, and when a simulator repeats one the earliest is
//! authoritative.
//!
//! ## Example
//!
//! ```rust
//! use hwaccel_harness::extract::{EventExtractor, EventKind};
//!
//! let extractor = EventExtractor::new()?;
//! let stderr = [
//!     "MMIO Write: BAR 0 offset 0x0 len 8",
//!     "MMIO Write: ctrl 1 ex_time=17597496001 main=17597491001",
//!     "DONE  main=17597500001",
//! ];
//!
//! let start = extractor.find(&stderr, EventKind::ControlStart)?.unwrap();
//! assert_eq!(start.integer("main")?, 17_597_491_001);
//! assert_eq!(start.line_number(), 2);
//! # Ok::<(), hwaccel_harness::Error>(())
//! ```

mod event;
mod pattern;

pub use event::{ExtractedEvent, FieldValue};
pub use pattern::{EventKind, EventPattern, FieldKind, FieldSpec};

use tracing::debug;

use crate::{Error, Result};

/// Table of marker patterns, looked up by tag.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    patterns: Vec<EventPattern>,
}

impl EventExtractor {
    /// Create an extractor holding the built-in host and device markers.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if a built-in pattern fails to compile.
    pub fn new() -> Result<Self> {
        let mut extractor = Self::empty();
        for kind in EventKind::ALL {
            extractor.register(kind.pattern()?)?;
        }
        Ok(extractor)
    }

    /// Create an extractor with no patterns.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Register a pattern.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the tag is taken or a field refers
    /// to a capture group the regex does not have.
    pub fn register(&mut self, pattern: EventPattern) -> Result<()> {
        if self.pattern(pattern.tag()).is_some() {
            return Err(Error::Configuration(format!(
                "pattern `{}` is already registered",
                pattern.tag()
            )));
        }
        pattern.check_groups()?;
        self.patterns.push(pattern);
        Ok(())
    }

    /// Get a pattern by tag.
    #[must_use]
    pub fn pattern(&self, tag: &str) -> Option<&EventPattern> {
        self.patterns.iter().find(|p| p.tag() == tag)
    }

    /// Registered patterns, in registration order.
    #[must_use]
    pub fn patterns(&self) -> &[EventPattern] {
        &self.patterns
    }

    /// Find the first line of `lines` matching the pattern tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for an unknown tag and
    /// `Error::ParseError` if the matching line's fields do not convert.
    pub fn find<L: AsRef<str>>(
        &self,
        lines: &[L],
        tag: impl AsRef<str>,
    ) -> Result<Option<ExtractedEvent>> {
        let tag = tag.as_ref();
        let pattern = self
            .pattern(tag)
            .ok_or_else(|| Error::Configuration(format!("no pattern registered as `{tag}`")))?;

        let event = pattern.find(lines)?;
        match &event {
            Some(found) => debug!(pattern = tag, line = found.line_number(), "marker found"),
            None => debug!(pattern = tag, lines = lines.len(), "marker not found"),
        }
        Ok(event)
    }
}
