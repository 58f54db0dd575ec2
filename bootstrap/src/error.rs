//! Error taxonomy for the bootstrap pipeline.
//!
//! Every variant except the health-check warning is fatal. The health check
//! never produces an error; its failures surface as
//! [`HealthOutcome::Warned`](crate::core::types::HealthOutcome::Warned).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::probe::ProbeRejection;
use crate::core::types::Stage;
use crate::core::version::SemanticVersion;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Required project files missing or options invalid. Raised before any mutation.
    #[error("preconditions unmet:\n- {}", .problems.join("\n- "))]
    PreconditionsUnmet { problems: Vec<String> },

    #[error(
        "no runtime >= {min_version} found{}",
        format_rejections(.rejections)
    )]
    RuntimeNotFound {
        min_version: SemanticVersion,
        rejections: Vec<ProbeRejection>,
    },

    #[error("could not prepare environment at {}: {reason} (re-run with --force to rebuild it)", .path.display())]
    Creation { path: PathBuf, reason: String },

    /// Package manager failed; `output` is its own stdout/stderr, verbatim.
    #[error("{step} failed{}\n{output}", format_exit(.exit_code))]
    Install {
        step: InstallStep,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("could not write configuration: {0:#}")]
    Configuration(anyhow::Error),

    #[error("server failed: {reason} (check that port {port} is free)")]
    Launch { port: String, reason: String },
}

/// Package manager invocations, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    UpgradePackageManager,
    Manifest,
    DevTooling,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStep::UpgradePackageManager => "package manager upgrade",
            InstallStep::Manifest => "project dependency install",
            InstallStep::DevTooling => "development tooling install",
        };
        f.write_str(name)
    }
}

/// A fatal error attributed to the stage that produced it.
#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: BootstrapError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: BootstrapError) -> Self {
        Self { stage, error }
    }
}

fn format_rejections(rejections: &[ProbeRejection]) -> String {
    if rejections.is_empty() {
        return " (no candidates configured)".to_string();
    }
    let mut out = String::from(":");
    for rejection in rejections {
        out.push_str("\n- ");
        out.push_str(&rejection.to_string());
    }
    out
}

fn format_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" (exit status {code})"),
        None => " (terminated by signal)".to_string(),
    }
}
