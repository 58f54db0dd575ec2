//! Shared deterministic types for the bootstrap pipeline.
//!
//! These values are created once per run and never mutated afterwards. They
//! must not depend on external state or I/O.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::version::SemanticVersion;

/// Run mode of the launched server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    /// Auto-reload on change, debug-level server logging.
    #[default]
    Development,
    /// Info-level server logging, no reload.
    Production,
}

impl EnvironmentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentMode::Development => "development",
            EnvironmentMode::Production => "production",
        }
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-selected options for a single bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Port passed through to the server, validated during `Validating`.
    pub port: String,
    pub environment: EnvironmentMode,
    /// Skip the isolated-environment stage and use the located runtime directly.
    pub skip_environment: bool,
    /// Recreate the environment, force-reinstall dependencies, overwrite configuration.
    pub force: bool,
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            port: "8000".to_string(),
            environment: EnvironmentMode::Development,
            skip_environment: false,
            force: false,
            verbose: false,
        }
    }
}

/// Pipeline states in execution order. `Terminal` is represented by the
/// pipeline's return value rather than a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    LocatingRuntime,
    PreparingEnvironment,
    InstallingDependencies,
    MaterializingConfiguration,
    RunningHealthCheck,
    Launching,
}

impl Stage {
    /// Stages scheduled for a run, in order.
    pub fn schedule(skip_environment: bool) -> Vec<Stage> {
        [
            Stage::Validating,
            Stage::LocatingRuntime,
            Stage::PreparingEnvironment,
            Stage::InstallingDependencies,
            Stage::MaterializingConfiguration,
            Stage::RunningHealthCheck,
            Stage::Launching,
        ]
        .into_iter()
        .filter(|stage| !(skip_environment && *stage == Stage::PreparingEnvironment))
        .collect()
    }

    /// Whether a failure in this stage aborts the pipeline.
    pub fn is_gating(self) -> bool {
        self != Stage::RunningHealthCheck
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Validating => "Checking project prerequisites",
            Stage::LocatingRuntime => "Locating runtime",
            Stage::PreparingEnvironment => "Preparing isolated environment",
            Stage::InstallingDependencies => "Installing dependencies",
            Stage::MaterializingConfiguration => "Writing configuration",
            Stage::RunningHealthCheck => "Running health check",
            Stage::Launching => "Launching server",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::LocatingRuntime => "locating runtime",
            Stage::PreparingEnvironment => "preparing environment",
            Stage::InstallingDependencies => "installing dependencies",
            Stage::MaterializingConfiguration => "materializing configuration",
            Stage::RunningHealthCheck => "running health check",
            Stage::Launching => "launching",
        };
        f.write_str(name)
    }
}

/// Runtime chosen by the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCandidate {
    /// Command as declared in the candidate list (e.g. `python3.12`).
    pub command: String,
    pub version: Option<SemanticVersion>,
}

/// Snapshot of the isolated environment directory before the manager acts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub path: PathBuf,
    pub exists: bool,
}

/// What the environment manager did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentAction {
    Created,
    Recreated,
    Reused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    Written,
    Skipped,
}

/// Severity of a failed diagnostic, following its exit code convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSeverity {
    /// Exit code 1: some checks failed, system still functional.
    Degraded,
    /// Exit code 2 or higher.
    Unhealthy,
    /// The diagnostic could not be run or was killed by a signal.
    Unavailable,
}

impl fmt::Display for HealthSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HealthSeverity::Degraded => "degraded",
            HealthSeverity::Unhealthy => "unhealthy",
            HealthSeverity::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    Passed,
    Warned {
        severity: HealthSeverity,
        detail: String,
    },
}

impl HealthOutcome {
    /// Classify a finished diagnostic by exit code.
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => HealthOutcome::Passed,
            Some(1) => HealthOutcome::Warned {
                severity: HealthSeverity::Degraded,
                detail: "diagnostic exited with status 1".to_string(),
            },
            Some(code) => HealthOutcome::Warned {
                severity: HealthSeverity::Unhealthy,
                detail: format!("diagnostic exited with status {code}"),
            },
            None => HealthOutcome::Warned {
                severity: HealthSeverity::Unavailable,
                detail: "diagnostic terminated without an exit status".to_string(),
            },
        }
    }
}
