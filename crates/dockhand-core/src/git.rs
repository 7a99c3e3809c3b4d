//! Git integration for resolving the checked-out commit.

use std::sync::Arc;

use crate::error::{DockhandError, Result};
use crate::process::{Invocation, OutputMode, ProcessRunner};

/// One line of `git log --pretty=oneline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLine {
    pub sha: String,
    pub subject: String,
}

/// `git` CLI client. Output is captured, never streamed.
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn ProcessRunner>,
}

impl GitCli {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// Full hash of `HEAD` via `git rev-parse HEAD`.
    ///
    /// Fails when git is missing, the directory is not a work tree, or the
    /// output is empty.
    pub async fn head_sha(&self) -> Result<String> {
        let stdout = self.capture(&["rev-parse", "HEAD"]).await?;
        let sha = stdout.trim().to_string();
        if sha.is_empty() {
            return Err(DockhandError::Git(
                "git rev-parse HEAD returned empty output".to_string(),
            ));
        }
        Ok(sha)
    }

    /// History of `HEAD`, newest first.
    pub async fn log_oneline(&self) -> Result<Vec<CommitLine>> {
        let stdout = self.capture(&["log", "--pretty=oneline"]).await?;
        Ok(parse_oneline(&stdout))
    }

    async fn capture(&self, args: &[&str]) -> Result<String> {
        let inv = Invocation::new("git").args(args.iter().copied());
        let outcome = self
            .runner
            .run(&inv, OutputMode::Capture)
            .await
            .map_err(|e| DockhandError::Git(format!("failed to run git: {e}")))?;

        if !outcome.success() {
            return Err(DockhandError::Git(format!(
                "{} failed: {}",
                inv.command_line(),
                outcome.stderr.trim()
            )));
        }
        Ok(outcome.stdout)
    }
}

fn parse_oneline(output: &str) -> Vec<CommitLine> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (sha, subject) = line.split_once(' ').unwrap_or((line, ""));
            CommitLine {
                sha: sha.to_string(),
                subject: subject.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::TokioProcessRunner;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        run_git(
            dir.path(),
            &["commit", "--allow-empty", "-m", "second commit"],
        );
        dir
    }

    fn git_in(dir: &Path) -> GitCli {
        GitCli::new(Arc::new(TokioProcessRunner::in_dir(dir)))
    }

    #[test]
    fn test_parse_oneline() {
        let lines = parse_oneline("abc123 Merge pull request #4\ndef456 fix\n\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].sha, "abc123");
        assert_eq!(lines[0].subject, "Merge pull request #4");
        assert_eq!(lines[1].subject, "fix");
    }

    #[tokio::test]
    async fn head_sha_returns_40_hex_chars() {
        let repo = make_git_repo();
        let sha = git_in(repo.path()).head_sha().await.unwrap();
        assert_eq!(sha.len(), 40, "SHA should be 40 hex chars, got: {sha}");
        assert!(sha.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn head_sha_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let result = git_in(dir.path()).head_sha().await;
        assert!(matches!(result, Err(DockhandError::Git(_))));
    }

    #[tokio::test]
    async fn log_oneline_lists_newest_first() {
        let repo = make_git_repo();
        let git = git_in(repo.path());

        let log = git.log_oneline().await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].subject, "second commit");
        assert_eq!(log[0].sha, git.head_sha().await.unwrap());
    }
}
