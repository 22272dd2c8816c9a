//! Human-readable verdict reports
//!
//! ```text
//! [RESULT HOST]  1234 Cycles/op
//! [RESULT SIM]   9000.0 ns/op
//! [PASS] test0
//! ```
//!
//! Host lines come first, then device lines, each in verification plan
//! order. Metrics of further hosts and devices name their source:
//! `[RESULT SIM]   4.0 ns/op (h1.a1)`.

use std::fmt;
use std::io::{self, IsTerminal, Write};

use crate::verify::Verdict;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Renders a [`Verdict`] for people.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    verdict: &'a Verdict,
    color: bool,
}

impl<'a> Report<'a> {
    /// Create a plain-text report.
    #[must_use]
    pub const fn new(verdict: &'a Verdict) -> Self {
        Self {
            verdict,
            color: false,
        }
    }

    /// Enable or disable ANSI colour.
    #[must_use]
    pub const fn colored(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn tag(&self, f: &mut fmt::Formatter<'_>, color: &str, label: &str) -> fmt::Result {
        if self.color {
            write!(f, "{color}[{label}]{RESET}")
        } else {
            write!(f, "[{label}]")
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(metrics) = self.verdict.metrics() {
            for (name, value) in metrics.iter() {
                if let Some(prefix) = name.strip_suffix("cycles_per_op") {
                    self.tag(f, GREEN, "RESULT HOST")?;
                    write!(f, "  {value} Cycles/op")?;
                    source(f, prefix)?;
                }
            }
            for (name, value) in metrics.iter() {
                if let Some(prefix) = name.strip_suffix("sim_ns_per_op") {
                    self.tag(f, GREEN, "RESULT SIM")?;
                    write!(f, "   {value:.1} ns/op")?;
                    source(f, prefix)?;
                }
            }
        }

        match self.verdict.failure() {
            None => {
                self.tag(f, GREEN, "PASS")?;
                writeln!(f, " {}", self.verdict.experiment())
            }
            Some(failure) => {
                self.tag(f, RED, "FAIL")?;
                writeln!(f, " {}: {failure}", self.verdict.experiment())
            }
        }
    }
}

/// Ends a result line, naming the host or link for prefixed metrics.
fn source(f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
    match prefix.strip_suffix('.') {
        Some(label) => writeln!(f, " ({label})"),
        None => writeln!(f),
    }
}

/// Print a verdict report to standard output, coloured when stdout is a
/// terminal.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_report(verdict: &Verdict) -> io::Result<()> {
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut out = stdout.lock();
    write!(out, "{}", Report::new(verdict).colored(color))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::verify::{Failure, Outcome};

    #[test]
    fn test_failure_report() {
        let failure = Failure::from_error(&Error::TimingAnomaly { start: 10, end: 9 });
        let verdict = Verdict::new("test0", Outcome::Fail(failure));
        let text = Report::new(&verdict).to_string();
        assert!(text.starts_with("[FAIL] test0: TimingAnomalyError: "));
        assert!(!text.contains("RESULT"));
    }

    #[test]
    fn test_colored_tags() {
        let verdict = Verdict::new("t", Outcome::Fail(Failure::unexpected("boom")));
        let text = Report::new(&verdict).colored(true).to_string();
        assert!(text.starts_with("\x1b[91m[FAIL]\x1b[0m"));
    }
}
