//! Health check adapter for the project's diagnostic script.
//!
//! The diagnostic is advisory. Whatever happens here is reported as a
//! [`HealthOutcome`] and never as an error. Its output is echoed to the
//! operator when the check warns, and only under `--verbose` when it passes.

use std::path::Path;

use tracing::{debug, instrument, warn};

use crate::core::types::{HealthOutcome, HealthSeverity};
use crate::io::context::BootstrapContext;
use crate::io::process::CommandRunner;
use crate::io::report::Reporter;

/// Run `script` through the active interpreter and classify its exit status.
#[instrument(skip_all, fields(script = %script.display()))]
pub fn run_health_check<R: CommandRunner>(
    runner: &R,
    ctx: &BootstrapContext,
    script: &Path,
    reporter: &mut Reporter,
) -> HealthOutcome {
    if !script.is_file() {
        warn!("diagnostic script missing");
        return HealthOutcome::Warned {
            severity: HealthSeverity::Unavailable,
            detail: format!("diagnostic {} not found", script.display()),
        };
    }

    let spec = ctx.interpreter_command([script.display().to_string()]);
    let outcome = match runner.capture(&spec, None) {
        Ok(output) => {
            let outcome = HealthOutcome::from_exit_code(output.exit_code);
            match outcome {
                HealthOutcome::Passed => reporter.detail(output.combined_text()),
                HealthOutcome::Warned { .. } => reporter.tool_output(output.combined_text()),
            }
            outcome
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "diagnostic could not be started");
            HealthOutcome::Warned {
                severity: HealthSeverity::Unavailable,
                detail: format!("could not run diagnostic: {err:#}"),
            }
        }
    };
    debug!(?outcome, "health check finished");
    outcome
}
