//! Captured text streams

use serde::{Deserialize, Serialize};

/// Which of a component's two output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Runners write a stream either as one text blob or as a list of lines.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawStream {
    Text(String),
    Lines(Vec<String>),
}

/// Ordered, immutable sequence of captured lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStream", into = "Vec<String>")]
pub struct Stream {
    lines: Vec<String>,
}

impl From<RawStream> for Stream {
    fn from(raw: RawStream) -> Self {
        match raw {
            RawStream::Text(text) => Self::from_text(&text),
            RawStream::Lines(lines) => Self { lines },
        }
    }
}

impl From<Stream> for Vec<String> {
    fn from(stream: Stream) -> Self {
        stream.lines
    }
}

impl<S: Into<String>> FromIterator<S> for Stream {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Stream {
    /// Split a captured text blob into lines (`\n` or `\r\n`).
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        text.lines().collect()
    }

    /// Get the captured lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of captured lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_from_text_and_lines_agree() {
        let text: Stream = serde_json::from_str(r#""a\r\nb\nc""#).unwrap();
        let lines: Stream = serde_json::from_str(r#"["a", "b", "c"]"#).unwrap();
        assert_eq!(text, lines);
        assert_eq!(text.len(), 3);
    }

    #[test]
    fn test_stream_serializes_as_lines() {
        let stream = Stream::from_text("x\ny");
        assert_eq!(serde_json::to_string(&stream).unwrap(), r#"["x","y"]"#);
    }
}
