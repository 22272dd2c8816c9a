//! Verifier states and the plan they walk

use serde::{Deserialize, Serialize};

use crate::topology::ComponentId;

/// States a verification passes through.
///
/// ```text
/// Init → ExtractingHost → ExtractingDevice → Reconciling → Done(pass|fail)
///              ↑_________________|_________________|
/// ```
///
/// Host and device extraction repeat for each host and device in the plan.
/// Any failure jumps straight to `Done { passed: false }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifierState {
    /// Checking every expected component is in the bundle
    Init,
    /// Scanning a host's stdout for the cycles report
    ExtractingHost,
    /// Scanning a device's stderr for start and completion markers
    ExtractingDevice,
    /// Combining host cycles with device timestamps
    Reconciling,
    /// Finished
    Done {
        /// Whether the run passed
        passed: bool,
    },
}

/// One step of a verification plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Component must be present; its output is not scanned.
    Presence(ComponentId),
    /// Host (and each attached device) are scanned and reconciled.
    Measure {
        /// Host alias
        host: String,
        /// Host component identifier
        host_id: ComponentId,
        /// `(device alias, device component identifier)` in attachment order
        devices: Vec<(String, ComponentId)>,
    },
}

/// Ordered steps derived from an experiment's topology.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationPlan {
    steps: Vec<PlanStep>,
}

impl VerificationPlan {
    pub(super) fn push(&mut self, step: PlanStep) {
        self.steps.push(step);
    }

    /// Get the steps.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Every component identifier the plan looks up, in plan order.
    #[must_use]
    pub fn component_ids(&self) -> Vec<&ComponentId> {
        let mut ids = Vec::new();
        for step in &self.steps {
            match step {
                PlanStep::Presence(id) => ids.push(id),
                PlanStep::Measure {
                    host_id, devices, ..
                } => {
                    ids.push(host_id);
                    ids.extend(devices.iter().map(|(_, id)| id));
                }
            }
        }
        ids
    }
}
