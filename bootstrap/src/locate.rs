//! Runtime discovery: probe candidate interpreters for an acceptable version.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::core::probe::{ProbeFailure, ProbeOutcome, select_runtime};
use crate::core::types::RuntimeCandidate;
use crate::core::version::SemanticVersion;
use crate::error::BootstrapError;
use crate::io::process::{CommandRunner, CommandSpec};

/// Locate the first candidate whose `--version` output is ≥ `min_version`.
///
/// Probe failures are swallowed and only surface, all together, in
/// [`BootstrapError::RuntimeNotFound`].
#[instrument(skip_all, fields(min_version = %min_version, candidates = candidates.len()))]
pub fn locate_runtime<R: CommandRunner>(
    runner: &R,
    workdir: &Path,
    candidates: &[String],
    min_version: SemanticVersion,
    probe_timeout: Duration,
) -> Result<RuntimeCandidate, BootstrapError> {
    let selected = select_runtime(candidates, min_version, |command| {
        let outcome = probe_candidate(runner, workdir, command, probe_timeout);
        debug!(command, ?outcome, "probed runtime candidate");
        outcome
    })
    .map_err(|rejections| BootstrapError::RuntimeNotFound {
        min_version,
        rejections,
    })?;
    info!(command = %selected.command, version = ?selected.version, "runtime located");
    Ok(selected)
}

fn probe_candidate<R: CommandRunner>(
    runner: &R,
    workdir: &Path,
    command: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let spec = CommandSpec::new(command, workdir).args(["--version"]);
    let output = match runner.capture(&spec, Some(timeout)) {
        Ok(output) => output,
        Err(err) => return ProbeOutcome::Failed(ProbeFailure::SpawnFailed(format!("{err:#}"))),
    };
    if output.timed_out {
        return ProbeOutcome::Failed(ProbeFailure::TimedOut);
    }
    if !output.success() {
        return ProbeOutcome::Failed(ProbeFailure::NonZeroExit(output.exit_code));
    }
    // Older interpreters print the banner on stderr.
    let text = output.combined_text();
    match SemanticVersion::find_in(&text) {
        Some(version) => ProbeOutcome::Found(version),
        None => ProbeOutcome::Failed(ProbeFailure::Unparseable(text)),
    }
}
