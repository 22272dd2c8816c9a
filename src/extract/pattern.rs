//! Event pattern descriptors

use regex::Regex;

use super::{ExtractedEvent, FieldValue};
use crate::{Error, Result};

/// How a captured group is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 unsigned integer
    Integer,
    /// Raw text
    Text,
}

impl FieldKind {
    fn parse(self, raw: &str) -> std::result::Result<FieldValue, String> {
        match self {
            Self::Integer => raw
                .parse::<u64>()
                .map(FieldValue::Integer)
                .map_err(|e| e.to_string()),
            Self::Text => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

/// Named capture group of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    group: usize,
    kind: FieldKind,
}

impl FieldSpec {
    /// Get the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the regex capture group index (1-based).
    #[must_use]
    pub const fn group(&self) -> usize {
        self.group
    }

    /// Get the conversion applied to the capture.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }
}

/// The marker kinds the device and host simulators emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Host driver's throughput report: `Cycles per operation: <n>`
    CyclesPerOperation,
    /// Device start trigger: `MMIO Write: ctrl 1 ex_time=<n> main=<n>`
    ControlStart,
    /// Device completion: `DONE main=<n>`
    Done,
}

impl EventKind {
    /// All built-in kinds.
    pub const ALL: [Self; 3] = [Self::CyclesPerOperation, Self::ControlStart, Self::Done];

    /// Table tag of this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::CyclesPerOperation => "cycles_per_op",
            Self::ControlStart => "mmio_ctrl_start",
            Self::Done => "done",
        }
    }

    /// Build this kind's pattern descriptor.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the regex fails to compile.
    pub fn pattern(self) -> Result<EventPattern> {
        let pattern = match self {
            Self::CyclesPerOperation => {
                EventPattern::new(self.tag(), "cycles line", r"^Cycles per operation: ([0-9]*)")?
                    .integer("cycles", 1)
            }
            Self::ControlStart => EventPattern::new(
                self.tag(),
                "CTRL=1 start marker",
                r"^MMIO Write: ctrl 1 ex_time=([0-9]*) main=([0-9]*)",
            )?
            .integer("ex_time", 1)
            .integer("main", 2),
            Self::Done => EventPattern::new(self.tag(), "DONE marker", r"^DONE\s+main=([0-9]*)")?
                .integer("main", 1),
        };
        Ok(pattern)
    }
}

impl AsRef<str> for EventKind {
    fn as_ref(&self) -> &str {
        self.tag()
    }
}

/// A tagged, line-anchored marker pattern and the fields it captures.
#[derive(Debug, Clone)]
pub struct EventPattern {
    tag: String,
    description: String,
    regex: Regex,
    fields: Vec<FieldSpec>,
}

impl EventPattern {
    /// Compile a pattern with no fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if `regex` fails to compile.
    pub fn new(
        tag: impl Into<String>,
        description: impl Into<String>,
        regex: &str,
    ) -> Result<Self> {
        let tag = tag.into();
        let regex = Regex::new(regex)
            .map_err(|e| Error::Configuration(format!("pattern `{tag}`: {e}")))?;
        Ok(Self {
            tag,
            description: description.into(),
            regex,
            fields: Vec::new(),
        })
    }

    /// Capture group `group` as a base-10 integer named `name`.
    #[must_use]
    pub fn integer(self, name: impl Into<String>, group: usize) -> Self {
        self.field(name, group, FieldKind::Integer)
    }

    /// Capture group `group` as raw text named `name`.
    #[must_use]
    pub fn text(self, name: impl Into<String>, group: usize) -> Self {
        self.field(name, group, FieldKind::Text)
    }

    fn field(mut self, name: impl Into<String>, group: usize, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            group,
            kind,
        });
        self
    }

    /// Get the table tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Human-readable marker name used in failure messages.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the regex source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Get the declared fields.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check that every field refers to an existing capture group.
    pub(super) fn check_groups(&self) -> Result<()> {
        let groups = self.regex.captures_len();
        match self.fields.iter().find(|f| f.group == 0 || f.group >= groups) {
            Some(field) => Err(Error::Configuration(format!(
                "pattern `{}` field `{}` refers to capture group {} but the regex has {} groups",
                self.tag,
                field.name,
                field.group,
                groups - 1
            ))),
            None => Ok(()),
        }
    }

    /// Return the first line matching this pattern, with its fields parsed.
    ///
    /// Later matches are ignored. A group that did not participate in the
    /// match parses as the empty string.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` if a captured field does not convert.
    pub fn find<L: AsRef<str>>(&self, lines: &[L]) -> Result<Option<ExtractedEvent>> {
        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let Some(captures) = self.regex.captures(line) else {
                continue;
            };

            let mut fields = Vec::with_capacity(self.fields.len());
            for spec in &self.fields {
                let raw = captures.get(spec.group).map_or("", |m| m.as_str());
                let value = spec.kind.parse(raw).map_err(|reason| Error::ParseError {
                    pattern: self.tag.clone(),
                    field: spec.name.clone(),
                    value: raw.to_string(),
                    reason,
                })?;
                fields.push((spec.name.clone(), value));
            }

            return Ok(Some(ExtractedEvent::new(
                self.tag.clone(),
                index + 1,
                line.to_string(),
                fields,
            )));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        for kind in EventKind::ALL {
            let pattern = kind.pattern().unwrap();
            assert_eq!(pattern.tag(), kind.tag());
            assert!(pattern.check_groups().is_ok());
        }
    }

    #[test]
    fn test_done_accepts_any_whitespace_run() {
        let pattern = EventKind::Done.pattern().unwrap();
        for line in ["DONE main=5", "DONE  main=5", "DONE\tmain=5"] {
            let event = pattern.find(&[line]).unwrap().unwrap();
            assert_eq!(event.integer("main").unwrap(), 5);
        }
    }

    #[test]
    fn test_anchored_at_line_start() {
        let pattern = EventKind::CyclesPerOperation.pattern().unwrap();
        assert!(pattern.find(&["note: Cycles per operation: 5"]).unwrap().is_none());
    }

    #[test]
    fn test_other_ctrl_values_ignored() {
        let pattern = EventKind::ControlStart.pattern().unwrap();
        let lines = [
            "MMIO Write: BAR 0 offset 0x0 len 8",
            "MMIO Write: ctrl 10 ex_time=1 main=2",
            "MMIO Write: ctrl 0 ex_time=1 main=2",
        ];
        assert!(pattern.find(&lines).unwrap().is_none());
    }

    #[test]
    fn test_empty_capture_is_parse_error() {
        let pattern = EventKind::CyclesPerOperation.pattern().unwrap();
        let err = pattern.find(&["Cycles per operation: "]).unwrap_err();
        assert!(matches!(err, Error::ParseError { ref field, .. } if field == "cycles"));
    }

    #[test]
    fn test_overflow_is_parse_error() {
        let pattern = EventKind::CyclesPerOperation.pattern().unwrap();
        let err = pattern
            .find(&["Cycles per operation: 99999999999999999999999"])
            .unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn test_bad_group_rejected() {
        let pattern = EventPattern::new("x", "x marker", r"^x=([0-9]+)")
            .unwrap()
            .integer("x", 2);
        assert!(pattern.check_groups().is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let result = EventPattern::new("broken", "broken", r"^(unclosed");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
