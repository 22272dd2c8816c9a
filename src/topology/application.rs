//! Application descriptor - the workload a host runs, opaque to the harness

use serde::{Deserialize, Serialize};

/// Workload launched inside a simulated host.
///
/// The harness never interprets it; it only carries the descriptor through
/// to the topology declaration the runner consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

impl Application {
    /// Create an application descriptor with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a command-line argument.
    #[must_use]
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Get the application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
