//! Test-only helpers: a scripted interpreter toolchain and a fixture project.
//!
//! [`FakeToolchain`] answers every invocation the pipeline makes the way a
//! real interpreter would, without spawning anything. Behavior is configured
//! with builder methods; every call is recorded for assertions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::io::paths::{ProjectPaths, environment_interpreter};
use crate::io::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::io::settings::PathSettings;

#[derive(Debug, Clone)]
enum ScriptedRuntime {
    Banner { text: String, on_stderr: bool },
    Failing(i32),
}

#[derive(Debug, Clone)]
struct PipFailure {
    needle: String,
    exit_code: i32,
    stderr: String,
}

#[derive(Debug, Clone)]
enum LaunchBehavior {
    Exit(Option<i32>),
    SpawnError(String),
}

/// Scripted [`CommandRunner`].
///
/// `--version` probes answer only for commands registered with
/// [`with_runtime`](Self::with_runtime) and friends; any other command fails to
/// spawn. Every other invocation is routed by its arguments: `-m venv`,
/// `-m pip`, and anything else is treated as the diagnostic script.
#[derive(Debug)]
pub struct FakeToolchain {
    runtimes: HashMap<String, ScriptedRuntime>,
    venv_fails: bool,
    venv_writes_interpreter: bool,
    pip_failure: Option<PipFailure>,
    health_exit: Option<i32>,
    health_output: String,
    health_spawn_error: Option<String>,
    launch: LaunchBehavior,
    calls: RefCell<Vec<CommandSpec>>,
    foreground: RefCell<Vec<CommandSpec>>,
}

impl Default for FakeToolchain {
    fn default() -> Self {
        Self {
            runtimes: HashMap::new(),
            venv_fails: false,
            venv_writes_interpreter: true,
            pip_failure: None,
            health_exit: Some(0),
            health_output: String::new(),
            health_spawn_error: None,
            launch: LaunchBehavior::Exit(Some(0)),
            calls: RefCell::new(Vec::new()),
            foreground: RefCell::new(Vec::new()),
        }
    }
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `command` printing `banner` on stdout for `--version`.
    pub fn with_runtime(mut self, command: &str, banner: &str) -> Self {
        self.runtimes.insert(
            command.to_string(),
            ScriptedRuntime::Banner {
                text: format!("{banner}\n"),
                on_stderr: false,
            },
        );
        self
    }

    /// Like [`with_runtime`](Self::with_runtime) but the banner goes to stderr.
    pub fn with_runtime_on_stderr(mut self, command: &str, banner: &str) -> Self {
        self.runtimes.insert(
            command.to_string(),
            ScriptedRuntime::Banner {
                text: format!("{banner}\n"),
                on_stderr: true,
            },
        );
        self
    }

    /// Register `command` exiting with `exit_code` for `--version`.
    pub fn with_failing_runtime(mut self, command: &str, exit_code: i32) -> Self {
        self.runtimes
            .insert(command.to_string(), ScriptedRuntime::Failing(exit_code));
        self
    }

    /// Fail the first pip invocation having an argument equal to `needle`.
    pub fn with_pip_failure(mut self, needle: &str, exit_code: i32, stderr: &str) -> Self {
        self.pip_failure = Some(PipFailure {
            needle: needle.to_string(),
            exit_code,
            stderr: stderr.to_string(),
        });
        self
    }

    pub fn with_venv_failure(mut self) -> Self {
        self.venv_fails = true;
        self
    }

    /// `-m venv` succeeds but leaves no interpreter behind.
    pub fn without_venv_interpreter(mut self) -> Self {
        self.venv_writes_interpreter = false;
        self
    }

    pub fn with_health_exit(mut self, exit_code: i32) -> Self {
        self.health_exit = Some(exit_code);
        self
    }

    /// Stdout printed by the diagnostic script.
    pub fn with_health_output(mut self, stdout: &str) -> Self {
        self.health_output = stdout.to_string();
        self
    }

    /// The diagnostic script cannot be started at all.
    pub fn with_health_spawn_error(mut self, message: &str) -> Self {
        self.health_spawn_error = Some(message.to_string());
        self
    }

    pub fn with_launch_exit(mut self, exit_code: Option<i32>) -> Self {
        self.launch = LaunchBehavior::Exit(exit_code);
        self
    }

    pub fn with_launch_spawn_error(mut self, message: &str) -> Self {
        self.launch = LaunchBehavior::SpawnError(message.to_string());
        self
    }

    /// Every captured invocation, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Commands probed with `--version`, in order.
    pub fn probed_commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|spec| is_probe(spec))
            .map(|spec| spec.program.display().to_string())
            .collect()
    }

    /// Argument vectors of every `-m pip` invocation.
    pub fn pip_invocations(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|spec| module_of(spec) == Some("pip"))
            .map(|spec| spec.args.clone())
            .collect()
    }

    pub fn venv_invocations(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|spec| module_of(spec) == Some("venv"))
            .count()
    }

    /// Commands handed to [`CommandRunner::run_foreground`].
    pub fn foreground_calls(&self) -> Vec<CommandSpec> {
        self.foreground.borrow().clone()
    }

    fn probe(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let command = spec.program.display().to_string();
        match self.runtimes.get(&command) {
            Some(ScriptedRuntime::Banner { text, on_stderr }) if *on_stderr => {
                Ok(CommandOutput::completed(0, "", text.as_str()))
            }
            Some(ScriptedRuntime::Banner { text, .. }) => {
                Ok(CommandOutput::completed(0, text.as_str(), ""))
            }
            Some(ScriptedRuntime::Failing(code)) => {
                Ok(CommandOutput::completed(*code, "", "interpreter crashed\n"))
            }
            None => Err(anyhow!("No such file or directory (os error 2)"))
                .with_context(|| format!("spawn {command}")),
        }
    }

    fn create_venv(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if self.venv_fails {
            return Ok(CommandOutput::completed(
                1,
                "",
                "Error: Command '-Im ensurepip' returned non-zero exit status 1.\n",
            ));
        }
        let target = spec
            .args
            .get(2)
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("venv target missing"))?;
        fs::create_dir_all(&target).with_context(|| format!("create {}", target.display()))?;
        if self.venv_writes_interpreter {
            let interpreter = environment_interpreter(&target);
            if let Some(parent) = interpreter.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&interpreter, "#!/bin/sh\n")?;
        }
        Ok(CommandOutput::completed(0, "", ""))
    }

    fn pip(&self, spec: &CommandSpec) -> CommandOutput {
        match &self.pip_failure {
            Some(failure) if spec.args.iter().any(|arg| *arg == failure.needle) => {
                CommandOutput::completed(failure.exit_code, "", failure.stderr.as_str())
            }
            _ => CommandOutput::completed(0, "Successfully installed\n", ""),
        }
    }

    fn health_check(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if let Some(message) = &self.health_spawn_error {
            return Err(anyhow!("{message}"))
                .with_context(|| format!("spawn {}", spec.program.display()));
        }
        Ok(CommandOutput {
            exit_code: self.health_exit,
            ..CommandOutput::completed(0, self.health_output.as_str(), "")
        })
    }
}

impl CommandRunner for FakeToolchain {
    fn capture(&self, spec: &CommandSpec, _timeout: Option<Duration>) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        if is_probe(spec) {
            return self.probe(spec);
        }
        match module_of(spec) {
            Some("venv") => self.create_venv(spec),
            Some("pip") => Ok(self.pip(spec)),
            _ => self.health_check(spec),
        }
    }

    fn run_foreground(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        self.foreground.borrow_mut().push(spec.clone());
        match &self.launch {
            LaunchBehavior::Exit(code) => Ok(*code),
            LaunchBehavior::SpawnError(message) => Err(anyhow!("{message}"))
                .with_context(|| format!("spawn {}", spec.program.display())),
        }
    }
}

fn is_probe(spec: &CommandSpec) -> bool {
    spec.args == ["--version"]
}

fn module_of(spec: &CommandSpec) -> Option<&str> {
    match spec.args.as_slice() {
        [flag, module, ..] if flag == "-m" => Some(module.as_str()),
        _ => None,
    }
}

/// A throwaway project checkout with the files the pipeline requires.
#[derive(Debug)]
pub struct FixtureProject {
    dir: TempDir,
}

impl FixtureProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create fixture project")?;
        let project = Self { dir };
        project.try_write("requirements.txt", "fastapi==0.115.0\nuvicorn==0.30.6\n")?;
        project.try_write(
            "app/main.py",
            "from fastapi import FastAPI\n\napp = FastAPI()\n",
        )?;
        project.try_write("sanity_check.py", "import sys\nsys.exit(0)\n")?;
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Paths for the default layout.
    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths::new(self.root(), &PathSettings::default())
    }

    pub fn write(&self, relative: &str, contents: &str) {
        self.try_write(relative, contents)
            .expect("write fixture file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root().join(relative)).expect("read fixture file")
    }

    /// Delete a file or directory from the project.
    pub fn remove(&self, relative: &str) {
        let path = self.root().join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("remove fixture dir");
        } else {
            fs::remove_file(&path).expect("remove fixture file");
        }
    }

    fn try_write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }
}
