//! Immutable per-run context threaded through every stage.
//!
//! Activating an environment never touches the bootstrap process itself (no
//! `chdir`, no `PATH` mutation). It yields a new context whose interpreter and
//! child environment point inside the isolated environment.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::paths::{ProjectPaths, environment_bin_dir, environment_interpreter};
use super::process::CommandSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapContext {
    paths: ProjectPaths,
    interpreter: PathBuf,
    active_environment: Option<PathBuf>,
}

impl BootstrapContext {
    /// Context using a system-wide runtime command.
    pub fn new(paths: ProjectPaths, runtime_command: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            interpreter: runtime_command.into(),
            active_environment: None,
        }
    }

    /// Context whose interpreter resolves inside `environment_dir`.
    pub fn activate(&self, environment_dir: &Path) -> Self {
        Self {
            paths: self.paths.clone(),
            interpreter: environment_interpreter(environment_dir),
            active_environment: Some(environment_dir.to_path_buf()),
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn active_environment(&self) -> Option<&Path> {
        self.active_environment.as_deref()
    }

    /// Interpreter invocation rooted at the project directory, carrying the
    /// activation variables when an environment is active.
    pub fn interpreter_command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(&self.interpreter, &self.paths.root)
            .args(args)
            .envs(self.activation_env())
    }

    /// `VIRTUAL_ENV` and a `PATH` led by the environment's bin directory.
    pub fn activation_env(&self) -> Vec<(String, OsString)> {
        let Some(env_dir) = &self.active_environment else {
            return Vec::new();
        };
        let mut vars = vec![("VIRTUAL_ENV".to_string(), env_dir.clone().into_os_string())];
        let mut search_path = vec![environment_bin_dir(env_dir)];
        if let Some(existing) = std::env::var_os("PATH") {
            search_path.extend(std::env::split_paths(&existing));
        }
        if let Ok(joined) = std::env::join_paths(search_path) {
            vars.push(("PATH".to_string(), joined));
        }
        vars
    }
}
