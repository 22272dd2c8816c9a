//! Batch verification - many runs, one verdict each
//!
//! Cases are independent: each verification only reads its own experiment
//! and bundle, so with the `rayon` feature they are verified in parallel.
//! Verdicts come back in input order, and a failing case never stops the
//! others.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::bundle::ResultBundle;
use crate::topology::Experiment;
use crate::verify::{Verdict, Verifier};

/// One (experiment, captured run) pair.
#[derive(Debug, Clone, Copy)]
pub struct Case<'a> {
    /// Topology the run was launched from
    pub experiment: &'a Experiment,
    /// Output the runner captured
    pub bundle: &'a ResultBundle,
}

impl<'a> Case<'a> {
    /// Pair an experiment with its captured run.
    #[must_use]
    pub const fn new(experiment: &'a Experiment, bundle: &'a ResultBundle) -> Self {
        Self { experiment, bundle }
    }
}

/// Verdicts of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    verdicts: Vec<Verdict>,
}

impl BatchReport {
    /// Get all verdicts.
    #[must_use]
    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }

    /// Number of passing runs.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.passed()).count()
    }

    /// Number of failing runs.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.verdicts.len() - self.passed()
    }

    /// Whether every run passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(Verdict::passed)
    }
}

/// Verify every case.
#[must_use]
pub fn verify_batch(verifier: &Verifier, cases: &[Case<'_>]) -> BatchReport {
    #[cfg(feature = "rayon")]
    let verdicts = cases
        .par_iter()
        .map(|case| verifier.verify(case.experiment, case.bundle))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let verdicts = cases
        .iter()
        .map(|case| verifier.verify(case.experiment, case.bundle))
        .collect();

    BatchReport { verdicts }
}
