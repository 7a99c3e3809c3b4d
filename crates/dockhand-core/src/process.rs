//! Subprocess execution.
//!
//! Every docker and git call goes through the [`ProcessRunner`] capability so
//! orchestrators can be driven against [`crate::fakes::ScriptedRunner`] in tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DockhandError, Result};

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable name or path.
    pub program: String,

    /// Arguments, passed without shell interpretation.
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program and subcommand, e.g. `docker push`.
    pub fn label(&self) -> String {
        match self.args.first() {
            Some(sub) => format!("{} {}", self.program, sub),
            None => self.program.clone(),
        }
    }

    /// Space-joined command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the child's stdout/stderr are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream straight into the CI log.
    Inherit,

    /// Collect into [`ProcessOutcome::stdout`] / [`ProcessOutcome::stderr`].
    Capture,
}

/// Result of a finished subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Exit code; -1 when the child was killed by a signal.
    pub exit_code: i32,

    /// Captured stdout (empty in `Inherit` mode).
    pub stdout: String,

    /// Captured stderr (empty in `Inherit` mode).
    pub stderr: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ProcessOutcome {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability to run an external program to completion.
///
/// A non-zero exit is reported through [`ProcessOutcome::exit_code`], not as an
/// error; `Err` means the program could not be started at all.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, mode: OutputMode) -> Result<ProcessOutcome>;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    work_dir: Option<PathBuf>,
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every child in `dir` instead of the current directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: Some(dir.into()),
        }
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, invocation: &Invocation, mode: OutputMode) -> Result<ProcessOutcome> {
        if invocation.program.is_empty() {
            return Err(DockhandError::Config("empty program name".to_string()));
        }

        let start = Instant::now();
        debug!(command = %invocation.command_line(), "spawning");

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let (exit_code, stdout, stderr) = match mode {
            OutputMode::Inherit => {
                let status = command
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await?;
                (status.code().unwrap_or(-1), String::new(), String::new())
            }
            OutputMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await?;
                (
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stdout).to_string(),
                    String::from_utf8_lossy(&output.stderr).to_string(),
                )
            }
        };

        Ok(ProcessOutcome {
            exit_code,
            stdout,
            stderr,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
