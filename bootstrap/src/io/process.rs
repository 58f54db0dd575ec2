//! Child process execution behind the [`CommandRunner`] seam.
//!
//! Stages never spawn processes directly. They describe the invocation as a
//! [`CommandSpec`] and hand it to a runner, so tests can script every external
//! tool without touching the machine.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_000_000;

/// A single external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, OsString)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: workdir.into(),
            env: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, vars: Vec<(String, OsString)>) -> Self {
        self.env.extend(vars);
        self
    }

    /// `program arg arg ...` for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.workdir);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Captured child process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    /// A finished process with the given exit code and output.
    pub fn completed(
        exit_code: i32,
        stdout: impl Into<Vec<u8>>,
        stderr: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: stderr.into(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            timed_out: false,
        }
    }

    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout followed by stderr, lossily decoded, with truncation notices.
    pub fn combined_text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.stdout).into_owned();
        text.push_str(&truncated_notice("stdout", self.stdout_truncated));
        text.push_str(&String::from_utf8_lossy(&self.stderr));
        text.push_str(&truncated_notice("stderr", self.stderr_truncated));
        text
    }
}

fn truncated_notice(stream: &str, truncated: usize) -> String {
    if truncated > 0 {
        format!("\n[{stream} truncated {truncated} bytes]\n")
    } else {
        String::new()
    }
}

/// Abstraction over process execution.
pub trait CommandRunner {
    /// Run to completion capturing stdout/stderr. With `timeout`, the child is
    /// killed once it elapses and the output is marked `timed_out`.
    fn capture(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<CommandOutput>;

    /// Run attached to the current terminal and block until exit.
    /// Returns the exit code (`None` when terminated by a signal).
    fn run_foreground(&self, spec: &CommandSpec) -> Result<Option<i32>>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    pub output_limit_bytes: usize,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}

impl CommandRunner for SystemRunner {
    #[instrument(skip_all, fields(program = %spec.program.display(), timeout_secs = timeout.map(|t| t.as_secs())))]
    fn capture(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<CommandOutput> {
        let mut cmd = spec.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = %spec.display(), "spawning child process");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                debug!(err = %e, "failed to spawn command");
                return Err(e).with_context(|| format!("spawn {}", spec.program.display()));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr was not piped"))?;

        let limit = self.output_limit_bytes;
        let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
        let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

        let (status, timed_out) = wait_child(&mut child, timeout)?;

        let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
        let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

        if stdout_truncated > 0 || stderr_truncated > 0 {
            warn!(stdout_truncated, stderr_truncated, "output truncated");
        }

        debug!(exit_code = ?status.code(), timed_out, "command finished");
        Ok(CommandOutput {
            exit_code: if timed_out { None } else { status.code() },
            stdout,
            stderr,
            stdout_truncated,
            stderr_truncated,
            timed_out,
        })
    }

    #[instrument(skip_all, fields(program = %spec.program.display()))]
    fn run_foreground(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        let mut cmd = spec.to_command();
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        debug!(command = %spec.display(), "starting foreground process");
        let status = cmd.status().map_err(|e| {
            error!(err = %e, "failed to spawn foreground command");
            anyhow!(e).context(format!("spawn {}", spec.program.display()))
        })?;
        debug!(exit_code = ?status.code(), "foreground process exited");
        Ok(status.code())
    }
}

fn wait_child(child: &mut Child, timeout: Option<Duration>) -> Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait().context("wait for command")?, false));
    };
    match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => Ok((status, false)),
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            child.kill().context("kill command")?;
            Ok((child.wait().context("wait command after kill")?, true))
        }
    }
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
