//! Isolated environment management.
//!
//! The environment directory is created with the located runtime, reused when
//! present, and rebuilt from scratch only under `--force`. There is no
//! rollback: a half-created environment stays on disk until the operator
//! re-runs with `--force`.

use std::fs;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::core::types::{EnvironmentAction, EnvironmentDescriptor};
use crate::error::BootstrapError;
use crate::io::context::BootstrapContext;
use crate::io::process::CommandRunner;
use crate::io::report::Reporter;

/// Observe the environment directory without changing it.
pub fn inspect_environment(path: &Path) -> EnvironmentDescriptor {
    EnvironmentDescriptor {
        path: path.to_path_buf(),
        exists: path.exists(),
    }
}

/// Ensure the environment exists and return a context activated inside it.
///
/// `ctx` must carry the located system runtime; it creates the environment.
#[instrument(skip_all, fields(path = %ctx.paths().environment_dir.display(), force))]
pub fn ensure_environment<R: CommandRunner>(
    runner: &R,
    ctx: &BootstrapContext,
    force: bool,
    reporter: &mut Reporter,
) -> Result<(BootstrapContext, EnvironmentAction), BootstrapError> {
    let descriptor = inspect_environment(&ctx.paths().environment_dir);
    let creation_error = |reason: String| BootstrapError::Creation {
        path: descriptor.path.clone(),
        reason,
    };

    if descriptor.exists && !descriptor.path.is_dir() {
        return Err(creation_error("path exists but is not a directory".to_string()));
    }

    let action = match (descriptor.exists, force) {
        (true, false) => EnvironmentAction::Reused,
        (true, true) => {
            reporter.warning(format!(
                "--force: deleting existing environment at {}",
                descriptor.path.display()
            ));
            warn!(path = %descriptor.path.display(), "removing environment");
            fs::remove_dir_all(&descriptor.path).map_err(|err| {
                creation_error(format!("could not remove old environment: {err}"))
            })?;
            create_environment(runner, ctx, &descriptor.path).map_err(creation_error)?;
            EnvironmentAction::Recreated
        }
        (false, _) => {
            create_environment(runner, ctx, &descriptor.path).map_err(creation_error)?;
            EnvironmentAction::Created
        }
    };

    let activated = ctx.activate(&descriptor.path);
    if !activated.interpreter().is_file() {
        return Err(creation_error(format!(
            "interpreter {} is missing",
            activated.interpreter().display()
        )));
    }
    info!(?action, interpreter = %activated.interpreter().display(), "environment ready");
    Ok((activated, action))
}

fn create_environment<R: CommandRunner>(
    runner: &R,
    ctx: &BootstrapContext,
    path: &Path,
) -> Result<(), String> {
    let spec = ctx.interpreter_command([
        "-m".to_string(),
        "venv".to_string(),
        path.display().to_string(),
    ]);
    let output = runner
        .capture(&spec, None)
        .map_err(|err| format!("{err:#}"))?;
    if !output.success() {
        return Err(format!(
            "`{}` failed:\n{}",
            spec.display(),
            output.combined_text().trim_end()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::paths::environment_interpreter;
    use crate::io::report::ReportLine;
    use crate::test_support::{FakeToolchain, FixtureProject};

    fn system_ctx(project: &FixtureProject) -> BootstrapContext {
        BootstrapContext::new(project.paths(), "python3.12")
    }

    #[test]
    fn creates_missing_environment_and_activates_it() {
        let project = FixtureProject::new().expect("project");
        let toolchain = FakeToolchain::new();
        let mut reporter = Reporter::quiet();

        let (ctx, action) =
            ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
                .expect("environment");

        assert_eq!(action, EnvironmentAction::Created);
        let env_dir = project.paths().environment_dir;
        assert!(env_dir.is_dir());
        assert_eq!(ctx.interpreter(), environment_interpreter(&env_dir));
        assert_eq!(toolchain.venv_invocations(), 1);
    }

    #[test]
    fn existing_environment_is_reused_untouched() {
        let project = FixtureProject::new().expect("project");
        let toolchain = FakeToolchain::new();
        let mut reporter = Reporter::quiet();
        ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
            .expect("first");
        let marker = project.paths().environment_dir.join("marker");
        fs::write(&marker, "keep").expect("marker");

        let (_, action) =
            ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
                .expect("second");

        assert_eq!(action, EnvironmentAction::Reused);
        assert!(marker.exists());
        assert_eq!(toolchain.venv_invocations(), 1);
    }

    #[test]
    fn force_deletes_and_recreates_with_operator_notice() {
        let project = FixtureProject::new().expect("project");
        let toolchain = FakeToolchain::new();
        let mut reporter = Reporter::quiet();
        ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
            .expect("first");
        let marker = project.paths().environment_dir.join("marker");
        fs::write(&marker, "stale").expect("marker");

        let (_, action) =
            ensure_environment(&toolchain, &system_ctx(&project), true, &mut reporter)
                .expect("forced");

        assert_eq!(action, EnvironmentAction::Recreated);
        assert!(!marker.exists());
        assert_eq!(toolchain.venv_invocations(), 2);
        assert!(reporter.lines().iter().any(|line| matches!(
            line,
            ReportLine::Warning(msg) if msg.contains("deleting existing environment")
        )));
    }

    #[test]
    fn failed_creation_is_fatal() {
        let project = FixtureProject::new().expect("project");
        let toolchain = FakeToolchain::new().with_venv_failure();
        let mut reporter = Reporter::quiet();

        let err = ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Creation { .. }));
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn missing_interpreter_after_creation_is_fatal() {
        let project = FixtureProject::new().expect("project");
        let toolchain = FakeToolchain::new().without_venv_interpreter();
        let mut reporter = Reporter::quiet();

        let err = ensure_environment(&toolchain, &system_ctx(&project), false, &mut reporter)
            .unwrap_err();
        assert!(err.to_string().contains("interpreter"));
    }

    #[test]
    fn file_in_place_of_environment_is_rejected() {
        let project = FixtureProject::new().expect("project");
        fs::write(project.paths().environment_dir, "not a dir").expect("write");
        let toolchain = FakeToolchain::new();
        let mut reporter = Reporter::quiet();

        let err = ensure_environment(&toolchain, &system_ctx(&project), true, &mut reporter)
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        assert_eq!(toolchain.venv_invocations(), 0);
    }
}
