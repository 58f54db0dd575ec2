//! Stage orchestration for a single bootstrap run.
//!
//! Stages run strictly in order. Every gating stage that fails stops the run
//! with a [`StageFailure`]; the health check only ever warns. Launching is the
//! last thing a run does: once the server exits, the run is over.

use std::path::Path;
use std::time::Duration;

use tracing::{info, instrument};

use crate::configure::{ensure_configuration, ensure_data_dir};
use crate::core::env_template::default_sections;
use crate::core::launch_spec::{ServerTarget, build_launch_spec};
use crate::core::types::{
    ConfigOutcome, EnvironmentAction, HealthOutcome, RunOptions, RuntimeCandidate, Stage,
};
use crate::environment::ensure_environment;
use crate::error::{BootstrapError, StageFailure};
use crate::health::run_health_check;
use crate::install::install_dependencies;
use crate::io::context::BootstrapContext;
use crate::io::paths::ProjectPaths;
use crate::io::process::CommandRunner;
use crate::io::report::Reporter;
use crate::io::settings::BootstrapSettings;
use crate::launch::launch_server;
use crate::locate::locate_runtime;

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stages that ran, in order.
    pub stages: Vec<Stage>,
    pub runtime: RuntimeCandidate,
    /// `None` with `--skip-environment`.
    pub environment: Option<EnvironmentAction>,
    pub config: ConfigOutcome,
    pub health: HealthOutcome,
    /// Server exit code; `None` when it was stopped by a signal.
    pub launch_exit: Option<i32>,
}

/// Step numbering over the stages scheduled for this run.
struct Progress {
    schedule: Vec<Stage>,
    completed: Vec<Stage>,
}

impl Progress {
    fn new(options: &RunOptions) -> Self {
        Self {
            schedule: Stage::schedule(options.skip_environment),
            completed: Vec::new(),
        }
    }

    fn begin(&mut self, stage: Stage, reporter: &mut Reporter) {
        let index = self
            .schedule
            .iter()
            .position(|scheduled| *scheduled == stage)
            .map_or(self.completed.len() + 1, |pos| pos + 1);
        reporter.step(index, self.schedule.len(), stage);
        info!(%stage, "stage started");
        self.completed.push(stage);
    }
}

/// Run every scheduled stage against the project at `root`.
#[instrument(skip_all, fields(root = %root.display(), environment = %options.environment, force = options.force))]
pub fn run_pipeline<R: CommandRunner>(
    root: &Path,
    settings: &BootstrapSettings,
    options: &RunOptions,
    runner: &R,
    reporter: &mut Reporter,
) -> Result<PipelineReport, StageFailure> {
    let paths = ProjectPaths::new(root, &settings.paths);
    let mut progress = Progress::new(options);

    progress.begin(Stage::Validating, reporter);
    check_preconditions(&paths, options).map_err(|e| StageFailure::new(Stage::Validating, e))?;

    progress.begin(Stage::LocatingRuntime, reporter);
    let runtime = locate_runtime(
        runner,
        &paths.root,
        &settings.runtime.candidates,
        settings.runtime.min_version,
        Duration::from_secs(settings.runtime.probe_timeout_secs),
    )
    .map_err(|e| StageFailure::new(Stage::LocatingRuntime, e))?;
    match runtime.version {
        Some(version) => reporter.success(format!("using {} ({version})", runtime.command)),
        None => reporter.success(format!("using {}", runtime.command)),
    }

    let mut ctx = BootstrapContext::new(paths.clone(), runtime.command.as_str());
    let mut environment = None;
    if !options.skip_environment {
        progress.begin(Stage::PreparingEnvironment, reporter);
        let (activated, action) = ensure_environment(runner, &ctx, options.force, reporter)
            .map_err(|e| StageFailure::new(Stage::PreparingEnvironment, e))?;
        let verb = match action {
            EnvironmentAction::Created => "created",
            EnvironmentAction::Recreated => "recreated",
            EnvironmentAction::Reused => "reusing",
        };
        reporter.success(format!("{verb} {}", paths.environment_dir.display()));
        ctx = activated;
        environment = Some(action);
    }

    progress.begin(Stage::InstallingDependencies, reporter);
    install_dependencies(
        runner,
        &ctx,
        &paths.manifest_path,
        options.force,
        &settings.install.dev_packages,
        reporter,
    )
    .map_err(|e| StageFailure::new(Stage::InstallingDependencies, e))?;
    reporter.success("dependencies installed");

    progress.begin(Stage::MaterializingConfiguration, reporter);
    let config = materialize_configuration(&paths, options, reporter)
        .map_err(|e| StageFailure::new(Stage::MaterializingConfiguration, e))?;

    progress.begin(Stage::RunningHealthCheck, reporter);
    let health = run_health_check(runner, &ctx, &paths.health_check_path, reporter);
    match &health {
        HealthOutcome::Passed => reporter.success("health check passed"),
        HealthOutcome::Warned { severity, detail } => reporter.warning(format!(
            "health check {severity}: {detail}; continuing. Run `{} {}` to investigate.",
            ctx.interpreter().display(),
            paths.health_check_path.display()
        )),
    }

    progress.begin(Stage::Launching, reporter);
    let spec = build_launch_spec(
        ctx.interpreter(),
        &paths.root,
        &ServerTarget {
            app: &settings.server.app,
            host: &settings.server.host,
        },
        options,
    );
    let launch_exit = launch_server(
        runner,
        &spec,
        &settings.server.host,
        &options.port,
        ctx.activation_env(),
        reporter,
    )
    .map_err(|e| StageFailure::new(Stage::Launching, e))?;

    Ok(PipelineReport {
        stages: progress.completed,
        runtime,
        environment,
        config,
        health,
        launch_exit,
    })
}

/// Everything that must hold before the first mutation.
fn check_preconditions(paths: &ProjectPaths, options: &RunOptions) -> Result<(), BootstrapError> {
    let mut problems = Vec::new();
    if !paths.root.is_dir() {
        problems.push(format!(
            "project directory {} does not exist",
            paths.root.display()
        ));
    } else {
        if !paths.manifest_path.is_file() {
            problems.push(format!(
                "package manifest {} not found",
                paths.manifest_path.display()
            ));
        }
        if !paths.app_entry_path.is_file() {
            problems.push(format!(
                "application entry {} not found",
                paths.app_entry_path.display()
            ));
        }
    }
    match options.port.parse::<u16>() {
        Ok(0) => problems.push("port must be between 1 and 65535 (got '0')".to_string()),
        Ok(_) => {}
        Err(_) => problems.push(format!(
            "port must be between 1 and 65535 (got '{}')",
            options.port
        )),
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(BootstrapError::PreconditionsUnmet { problems })
    }
}

fn materialize_configuration(
    paths: &ProjectPaths,
    options: &RunOptions,
    reporter: &mut Reporter,
) -> Result<ConfigOutcome, BootstrapError> {
    let sections = default_sections(
        options.environment,
        &paths.data_dir_relative.display().to_string(),
    );
    let outcome = ensure_configuration(&paths.config_path, options.force, &sections)?;
    match outcome {
        ConfigOutcome::Written => {
            reporter.success(format!("wrote {}", paths.config_path.display()));
            reporter.warning(format!(
                "{} contains placeholder secrets; replace every CHANGE_ME value before deploying",
                paths.config_path.display()
            ));
        }
        ConfigOutcome::Skipped => reporter.info(format!(
            "keeping existing {} (use --force to overwrite)",
            paths.config_path.display()
        )),
    }
    if ensure_data_dir(&paths.data_dir)? {
        reporter.success(format!("created {}", paths.data_dir.display()));
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::report::ReportLine;
    use crate::test_support::{FakeToolchain, FixtureProject};

    fn toolchain() -> FakeToolchain {
        FakeToolchain::new().with_runtime("python3.12", "Python 3.12.4")
    }

    fn steps(reporter: &Reporter) -> Vec<(usize, usize)> {
        reporter
            .lines()
            .iter()
            .filter_map(|line| match line {
                ReportLine::Step { index, total, .. } => Some((*index, *total)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn steps_are_numbered_over_scheduled_stages() {
        let project = FixtureProject::new().expect("project");
        let mut reporter = Reporter::quiet();
        run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &RunOptions::default(),
            &toolchain(),
            &mut reporter,
        )
        .expect("run");
        let expected: Vec<(usize, usize)> = (1..=7).map(|i| (i, 7)).collect();
        assert_eq!(steps(&reporter), expected);

        let mut reporter = Reporter::quiet();
        let options = RunOptions {
            skip_environment: true,
            ..RunOptions::default()
        };
        run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &options,
            &toolchain(),
            &mut reporter,
        )
        .expect("run");
        let expected: Vec<(usize, usize)> = (1..=6).map(|i| (i, 6)).collect();
        assert_eq!(steps(&reporter), expected);
    }

    #[test]
    fn preconditions_are_all_reported_before_anything_runs() {
        let project = FixtureProject::new().expect("project");
        project.remove("requirements.txt");
        project.remove("app");
        let runner = toolchain();
        let options = RunOptions {
            port: "http".to_string(),
            ..RunOptions::default()
        };

        let failure = run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &options,
            &runner,
            &mut Reporter::quiet(),
        )
        .unwrap_err();

        assert_eq!(failure.stage, Stage::Validating);
        let BootstrapError::PreconditionsUnmet { problems } = &failure.error else {
            panic!("expected preconditions error");
        };
        assert_eq!(problems.len(), 3);
        assert!(runner.calls().is_empty());
        assert!(!project.root().join(".env").exists());
    }

    #[test]
    fn port_zero_is_rejected() {
        let project = FixtureProject::new().expect("project");
        let options = RunOptions {
            port: "0".to_string(),
            ..RunOptions::default()
        };
        let failure = run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &options,
            &toolchain(),
            &mut Reporter::quiet(),
        )
        .unwrap_err();
        assert!(failure.to_string().contains("got '0'"));
    }

    #[test]
    fn health_warning_names_the_manual_command() {
        let project = FixtureProject::new().expect("project");
        let mut reporter = Reporter::quiet();
        let report = run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &RunOptions::default(),
            &toolchain().with_health_exit(1),
            &mut reporter,
        )
        .expect("run");

        assert!(matches!(report.health, HealthOutcome::Warned { .. }));
        assert!(reporter.lines().iter().any(|line| matches!(
            line,
            ReportLine::Warning(msg) if msg.contains("sanity_check.py") && msg.contains("degraded")
        )));
    }

    #[test]
    fn server_runs_inside_the_environment() {
        let project = FixtureProject::new().expect("project");
        let runner = toolchain();
        run_pipeline(
            project.root(),
            &BootstrapSettings::default(),
            &RunOptions::default(),
            &runner,
            &mut Reporter::quiet(),
        )
        .expect("run");

        let launched = runner.foreground_calls();
        assert_eq!(launched.len(), 1);
        assert_eq!(
            launched[0].program,
            crate::io::paths::environment_interpreter(&project.paths().environment_dir)
        );
        assert!(launched[0].env.iter().any(|(key, _)| key == "VIRTUAL_ENV"));
    }
}
