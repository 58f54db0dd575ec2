//! Dependency installation through the active interpreter's package manager.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::error::{BootstrapError, InstallStep};
use crate::io::context::BootstrapContext;
use crate::io::process::CommandRunner;
use crate::io::report::Reporter;

/// Package manager argument vectors, in execution order.
///
/// Development tooling is installed on every run; `force` only changes how
/// the manifest is applied.
pub fn install_plan(
    manifest: &Path,
    force: bool,
    dev_packages: &[String],
) -> Vec<(InstallStep, Vec<String>)> {
    let pip = |rest: &[&str]| -> Vec<String> {
        ["-m", "pip", "install"]
            .iter()
            .chain(rest)
            .map(|arg| arg.to_string())
            .collect()
    };

    let manifest = manifest.display().to_string();
    let manifest = manifest.as_str();
    let upgrade = pip(&["--upgrade", "pip"]);
    let mut plan = vec![(InstallStep::UpgradePackageManager, upgrade)];
    let manifest_args = if force {
        pip(&["--force-reinstall", "--no-cache-dir", "-r", manifest])
    } else {
        pip(&["--upgrade", "-r", manifest])
    };
    plan.push((InstallStep::Manifest, manifest_args));
    if !dev_packages.is_empty() {
        let mut args = pip(&[]);
        args.extend(dev_packages.iter().cloned());
        plan.push((InstallStep::DevTooling, args));
    }
    plan
}

/// Run the install plan. The first non-zero exit aborts with the tool's
/// own output attached.
#[instrument(skip_all, fields(manifest = %manifest.display(), force))]
pub fn install_dependencies<R: CommandRunner>(
    runner: &R,
    ctx: &BootstrapContext,
    manifest: &Path,
    force: bool,
    dev_packages: &[String],
    reporter: &mut Reporter,
) -> Result<(), BootstrapError> {
    if !manifest.is_file() {
        return Err(BootstrapError::Install {
            step: InstallStep::Manifest,
            exit_code: None,
            output: format!("package manifest {} not found", manifest.display()),
        });
    }

    for (step, args) in install_plan(manifest, force, dev_packages) {
        let spec = ctx.interpreter_command(args);
        reporter.info(format!("{step}: {}", spec.display()));
        debug!(%step, command = %spec.display(), "running package manager");

        let output = runner
            .capture(&spec, None)
            .map_err(|err| BootstrapError::Install {
                step,
                exit_code: None,
                output: format!("{err:#}"),
            })?;
        if !output.success() {
            warn!(%step, exit_code = ?output.exit_code, "package manager failed");
            return Err(BootstrapError::Install {
                step,
                exit_code: output.exit_code,
                output: output.combined_text(),
            });
        }
        reporter.detail(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    info!("dependencies installed");
    Ok(())
}
