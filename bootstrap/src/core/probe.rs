//! Runtime candidate selection.
//!
//! Candidates are probed lazily in priority order and the first one meeting
//! the minimum version wins. Every rejection is kept so a final "not found"
//! can explain itself.

use std::fmt;

use super::types::RuntimeCandidate;
use super::version::SemanticVersion;

/// Result of a single version probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(SemanticVersion),
    Failed(ProbeFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The binary could not be started (usually: not on PATH).
    SpawnFailed(String),
    NonZeroExit(Option<i32>),
    TimedOut,
    /// Exited cleanly but printed nothing that looks like a version.
    Unparseable(String),
    BelowMinimum(SemanticVersion),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::SpawnFailed(reason) => write!(f, "could not run: {reason}"),
            ProbeFailure::NonZeroExit(Some(code)) => write!(f, "exited with status {code}"),
            ProbeFailure::NonZeroExit(None) => write!(f, "terminated by signal"),
            ProbeFailure::TimedOut => write!(f, "version query timed out"),
            ProbeFailure::Unparseable(output) => {
                write!(f, "unrecognized version output {:?}", output.trim())
            }
            ProbeFailure::BelowMinimum(version) => write!(f, "version {version} is too old"),
        }
    }
}

/// A candidate that was probed and not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRejection {
    pub command: String,
    pub failure: ProbeFailure,
}

impl fmt::Display for ProbeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.command, self.failure)
    }
}

/// Fold `probe` over `candidates` and return the first acceptable runtime.
///
/// Probing stops at the first accepted candidate; later candidates are never
/// invoked. On failure, returns one rejection per candidate in probe order.
pub fn select_runtime<F>(
    candidates: &[String],
    min_version: SemanticVersion,
    mut probe: F,
) -> Result<RuntimeCandidate, Vec<ProbeRejection>>
where
    F: FnMut(&str) -> ProbeOutcome,
{
    let mut rejections = Vec::new();
    for command in candidates {
        let failure = match probe(command) {
            ProbeOutcome::Found(version) if version >= min_version => {
                return Ok(RuntimeCandidate {
                    command: command.clone(),
                    version: Some(version),
                });
            }
            ProbeOutcome::Found(version) => ProbeFailure::BelowMinimum(version),
            ProbeOutcome::Failed(failure) => failure,
        };
        rejections.push(ProbeRejection {
            command: command.clone(),
            failure,
        });
    }
    Err(rejections)
}
