//! In-memory fakes for the process and checks capabilities (testing only).
//!
//! Provides `ScriptedRunner` and `MemoryChecksApi`, which record every call
//! and answer from a fixed script instead of touching docker, git or GitHub.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::checks::{CheckConclusion, CheckRunId, ChecksApi, CreateCheckRun};
use crate::error::{DockhandError, Result};
use crate::process::{Invocation, OutputMode, ProcessOutcome, ProcessRunner};

/// Commit hash answered by [`ScriptedRunner::with_git_head`] by default.
pub const FAKE_HEAD_SHA: &str = "ce587453ced02b1526dfb4cb910479d431683101";

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Scripted {
    Exit { code: i32, stdout: String },
    SpawnError(String),
}

/// [`ProcessRunner`] answering from prefix rules on the command line.
///
/// The first rule whose prefix matches wins; unmatched commands exit 0 with
/// empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Scripted)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands starting with `prefix` exit with `code`.
    pub fn on(mut self, prefix: &str, code: i32) -> Self {
        self.rules.push((
            prefix.to_string(),
            Scripted::Exit {
                code,
                stdout: String::new(),
            },
        ));
        self
    }

    /// Commands starting with `prefix` exit 0 printing `stdout`.
    pub fn on_stdout(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            Scripted::Exit {
                code: 0,
                stdout: stdout.to_string(),
            },
        ));
        self
    }

    /// Commands starting with `prefix` cannot be spawned.
    pub fn on_spawn_error(mut self, prefix: &str, message: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            Scripted::SpawnError(message.to_string()),
        ));
        self
    }

    /// Answer `git rev-parse HEAD` and `git log` for a checkout at `sha`.
    pub fn with_git_head(self, sha: &str) -> Self {
        let log = format!("{sha} Merge pull request #1 from acme/feature\n");
        self.on_stdout("git rev-parse HEAD", &format!("{sha}\n"))
            .on_stdout("git log", &log)
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Every command line seen so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Invocation::command_line).collect()
    }

    /// Command lines starting with `prefix`.
    pub fn commands_matching(&self, prefix: &str) -> Vec<String> {
        self.command_lines()
            .into_iter()
            .filter(|line| line.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation, _mode: OutputMode) -> Result<ProcessOutcome> {
        self.calls.lock().unwrap().push(invocation.clone());

        let line = invocation.command_line();
        let scripted = self
            .rules
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, s)| s.clone())
            .unwrap_or(Scripted::Exit {
                code: 0,
                stdout: String::new(),
            });

        match scripted {
            Scripted::Exit { code, stdout } => Ok(ProcessOutcome {
                exit_code: code,
                stdout,
                stderr: if code == 0 {
                    String::new()
                } else {
                    format!("{line}: scripted failure")
                },
                duration_ms: 0,
            }),
            Scripted::SpawnError(message) => Err(DockhandError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                message,
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryChecksApi
// ---------------------------------------------------------------------------

/// A call received by [`MemoryChecksApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksCall {
    Create { name: String, head_sha: String },
    Update { id: CheckRunId, conclusion: CheckConclusion },
}

/// In-memory checks API that hands out sequential ids.
#[derive(Debug)]
pub struct MemoryChecksApi {
    first_id: u64,
    fail_create: Option<String>,
    fail_update: Option<String>,
    calls: Mutex<Vec<ChecksCall>>,
}

impl Default for MemoryChecksApi {
    fn default() -> Self {
        Self {
            first_id: 1,
            fail_create: None,
            fail_update: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryChecksApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every create call with `message`.
    pub fn failing_create(mut self, message: &str) -> Self {
        self.fail_create = Some(message.to_string());
        self
    }

    /// Reject every update call with `message`.
    pub fn failing_update(mut self, message: &str) -> Self {
        self.fail_update = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ChecksCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ChecksCall::Create { .. }))
            .count()
    }

    /// Conclusions passed to update calls, in order.
    pub fn conclusions(&self) -> Vec<CheckConclusion> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ChecksCall::Update { conclusion, .. } => Some(conclusion),
                ChecksCall::Create { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChecksApi for MemoryChecksApi {
    async fn create_check(&self, request: &CreateCheckRun) -> Result<CheckRunId> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(ChecksCall::Create {
            name: request.name.clone(),
            head_sha: request.head_sha.clone(),
        });
        if let Some(message) = &self.fail_create {
            return Err(DockhandError::ChecksApi(message.clone()));
        }
        let created = calls
            .iter()
            .filter(|c| matches!(c, ChecksCall::Create { .. }))
            .count() as u64;
        Ok(CheckRunId(self.first_id + created - 1))
    }

    async fn update_check(&self, id: CheckRunId, conclusion: CheckConclusion) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ChecksCall::Update { id, conclusion });
        match &self.fail_update {
            Some(message) => Err(DockhandError::ChecksApi(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_first_matching_rule_wins() {
        let runner = ScriptedRunner::new()
            .on("docker pull", 1)
            .on("docker", 7);

        let pull = Invocation::new("docker").args(["pull", "acme/app/base"]);
        let push = Invocation::new("docker").args(["push", "acme/app/base"]);
        let git = Invocation::new("git").arg("status");

        let code = |outcome: Result<ProcessOutcome>| outcome.unwrap().exit_code;
        assert_eq!(code(runner.run(&pull, OutputMode::Inherit).await), 1);
        assert_eq!(code(runner.run(&push, OutputMode::Inherit).await), 7);
        assert_eq!(code(runner.run(&git, OutputMode::Capture).await), 0);
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_runner_spawn_error() {
        let runner = ScriptedRunner::new()
            .on_spawn_error("docker", "docker: not found");
        let result = runner
            .run(&Invocation::new("docker").arg("info"), OutputMode::Inherit)
            .await;
        assert!(matches!(result, Err(DockhandError::Io(_))));
    }

    #[tokio::test]
    async fn test_memory_checks_api_records_calls() {
        let api = MemoryChecksApi::new();
        let id = api
            .create_check(&CreateCheckRun::in_progress("tests", FAKE_HEAD_SHA))
            .await
            .unwrap();
        api.update_check(id, CheckConclusion::Success)
            .await
            .unwrap();

        assert_eq!(api.create_count(), 1);
        assert_eq!(api.conclusions(), vec![CheckConclusion::Success]);
        assert_eq!(
            api.calls()[0],
            ChecksCall::Create {
                name: "tests".to_string(),
                head_sha: FAKE_HEAD_SHA.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_memory_checks_api_failing_update_still_records() {
        let api = MemoryChecksApi::new().failing_update("boom");
        let result = api
            .update_check(CheckRunId(1), CheckConclusion::Failure)
            .await;
        assert!(matches!(result, Err(DockhandError::ChecksApi(_))));
        assert_eq!(api.conclusions(), vec![CheckConclusion::Failure]);
    }
}
