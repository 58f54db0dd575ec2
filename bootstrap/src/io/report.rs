//! Operator-facing progress output.
//!
//! Progress is product output, not diagnostics: it is always printed and is
//! unaffected by `RUST_LOG`. Development tracing lives in [`crate::logging`].

use crate::core::types::Stage;

/// One line of operator-facing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Step {
        index: usize,
        total: usize,
        stage: Stage,
    },
    Info(String),
    Success(String),
    Warning(String),
    /// Verbose-only detail, e.g. captured tool output.
    Detail(String),
    /// Captured tool output the operator has to act on, shown without `--verbose`.
    ToolOutput(String),
}

/// Records every line and optionally echoes it to the terminal.
#[derive(Debug, Default)]
pub struct Reporter {
    echo: bool,
    verbose: bool,
    lines: Vec<ReportLine>,
}

impl Reporter {
    /// Reporter printing to stdout/stderr.
    pub fn terminal(verbose: bool) -> Self {
        Self {
            echo: true,
            verbose,
            lines: Vec::new(),
        }
    }

    /// Reporter that only records (tests).
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn step(&mut self, index: usize, total: usize, stage: Stage) {
        self.emit(ReportLine::Step {
            index,
            total,
            stage,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.emit(ReportLine::Info(message.into()));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.emit(ReportLine::Success(message.into()));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.emit(ReportLine::Warning(message.into()));
    }

    pub fn detail(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.verbose && !message.trim().is_empty() {
            self.emit(ReportLine::Detail(message));
        }
    }

    /// Echo captured output regardless of verbosity. Blank output is dropped.
    pub fn tool_output(&mut self, output: impl Into<String>) {
        let output = output.into();
        if !output.trim().is_empty() {
            self.emit(ReportLine::ToolOutput(output));
        }
    }

    fn emit(&mut self, line: ReportLine) {
        if self.echo {
            match &line {
                ReportLine::Step {
                    index,
                    total,
                    stage,
                } => println!("[{index}/{total}] {}...", stage.label()),
                ReportLine::Info(msg) => println!("      {msg}"),
                ReportLine::Success(msg) => println!("      ok: {msg}"),
                ReportLine::Warning(msg) => eprintln!("      warning: {msg}"),
                ReportLine::Detail(msg) | ReportLine::ToolOutput(msg) => {
                    for line in msg.lines() {
                        println!("      | {line}");
                    }
                }
            }
        }
        self.lines.push(line);
    }
}
