//! The error kinds raised by dataset loading, strategy lookup, and core invariant checks.

use thiserror::Error;

/// Everything that can go fatally wrong while loading a dataset or running a maintenance
/// simulation.
///
/// Malformed input and an unknown strategy name abort before the scheduler starts; invariant
/// violations and no-progress detection abort mid-run. None of these are recoverable locally —
/// callers are expected to propagate with `?` and report.
#[derive(Debug, Error)]
pub enum SimError {
    /// The input dataset is missing required data or contradicts itself (a dangling
    /// VM→server reference, a VM listed under more than one server, or a server whose initial
    /// demand exceeds its capacity).
    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    /// The requested maintenance strategy name is not one of the five named policies.
    #[error("unknown maintenance strategy: {0:?}")]
    UnknownStrategy(String),

    /// A core invariant was violated — a migration attempted without destination capacity, or
    /// demand bookkeeping drifted from hosted-set reality. Always a programming error.
    #[error("invariant violated at step {step}: {detail}")]
    InvariantViolated {
        /// The maintenance step during which the violation was detected.
        step: u32,
        /// A human-readable description of what was found inconsistent.
        detail: String,
    },

    /// A maintenance step performed zero patches and zero migrations while nonupdated servers
    /// remained, so the run cannot progress further.
    #[error("no progress at step {step}: {nonupdated} server(s) remain nonupdated but no patch or migration occurred")]
    NoProgress {
        /// The maintenance step at which no progress was made.
        step: u32,
        /// How many servers were still nonupdated when the stall was detected.
        nonupdated: usize,
    },
}
