//! Extracted events

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Value of one captured field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Parsed base-10 integer
    Integer(u64),
    /// Raw text
    Text(String),
}

/// First matching occurrence of a pattern in a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEvent {
    tag: String,
    line_number: usize,
    line: String,
    fields: Vec<(String, FieldValue)>,
}

impl ExtractedEvent {
    pub(super) const fn new(
        tag: String,
        line_number: usize,
        line: String,
        fields: Vec<(String, FieldValue)>,
    ) -> Self {
        Self {
            tag,
            line_number,
            line,
            fields,
        }
    }

    /// Tag of the pattern that matched.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 1-based line number of the match within its stream.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// The matching line.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Iterate over `(name, value)` fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Get a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Get an integer field by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseError` if the field is absent or holds text.
    pub fn integer(&self, name: &str) -> Result<u64> {
        match self.field(name) {
            Some(FieldValue::Integer(value)) => Ok(*value),
            Some(FieldValue::Text(text)) => Err(Error::ParseError {
                pattern: self.tag.clone(),
                field: name.to_string(),
                value: text.clone(),
                reason: "field holds text, not an integer".to_string(),
            }),
            None => Err(Error::ParseError {
                pattern: self.tag.clone(),
                field: name.to_string(),
                value: String::new(),
                reason: "pattern declares no such field".to_string(),
            }),
        }
    }
}
