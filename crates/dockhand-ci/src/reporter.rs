//! Check Reporter: wrap one containerized command in a GitHub check run.

use std::sync::Arc;

use dockhand_core::{
    split_words, CheckConclusion, CheckReporterConfig, CheckRunId, ChecksApi, CreateCheckRun,
    DockerCli, DockhandError, GitCli, Result, RunRequest,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::observer::{PipelineEvent, PipelineObserver};

/// Outcome of a successful reporter run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub check_id: CheckRunId,
    pub head_sha: String,
    pub conclusion: CheckConclusion,
}

/// Creates a check run, runs the container, and completes the check run
/// with `success` or `failure`.
pub struct CheckReporter {
    config: CheckReporterConfig,
    checks: Arc<dyn ChecksApi>,
    docker: DockerCli,
    git: GitCli,
    observer: Arc<dyn PipelineObserver>,
}

impl CheckReporter {
    pub fn new(
        config: CheckReporterConfig,
        checks: Arc<dyn ChecksApi>,
        docker: DockerCli,
        git: GitCli,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            config,
            checks,
            docker,
            git,
            observer,
        }
    }

    /// Run the whole protocol.
    ///
    /// Exactly one check run is created and exactly one update is attempted.
    /// A build error is reported as `failure` and then returned unchanged; if
    /// the update itself fails, that error is returned instead.
    pub async fn run(&self) -> Result<CheckReport> {
        let head_sha = self.git.head_sha().await?;
        let id = self.create_check(&head_sha).await?;

        match self.run_build().await {
            Ok(()) => {
                self.update_check(id, CheckConclusion::Success).await?;
                Ok(CheckReport {
                    check_id: id,
                    head_sha,
                    conclusion: CheckConclusion::Success,
                })
            }
            Err(build_err) => {
                warn!(check_id = %id, error = %build_err, "build failed, reporting failure");
                self.update_check(id, CheckConclusion::Failure).await?;
                Err(build_err)
            }
        }
    }

    /// Create an `in_progress` check run on `head_sha`.
    pub async fn create_check(&self, head_sha: &str) -> Result<CheckRunId> {
        let request = CreateCheckRun::in_progress(self.config.name.clone(), head_sha);
        let id = self.checks.create_check(&request).await?;
        self.observer.on_event(&PipelineEvent::CheckCreated {
            id,
            name: self.config.name.clone(),
            head_sha: head_sha.to_string(),
        });
        Ok(id)
    }

    /// `docker run --rm {flags} {image} {command}`; non-zero exit is an error.
    pub async fn run_build(&self) -> Result<()> {
        let request = RunRequest {
            image: self.config.image.clone(),
            command: split_words(&self.config.command)?,
            flags: split_words(&self.config.flags)?,
        };
        info!(image = %request.image, command = %self.config.command, "running container");

        let outcome = self.docker.run(&request).await?;
        if !outcome.success() {
            return Err(DockhandError::ProcessFailed {
                program: "docker run".to_string(),
                code: outcome.exit_code,
            });
        }
        Ok(())
    }

    /// Complete the check run. Not retried.
    pub async fn update_check(&self, id: CheckRunId, conclusion: CheckConclusion) -> Result<()> {
        self.checks.update_check(id, conclusion).await?;
        self.observer
            .on_event(&PipelineEvent::CheckCompleted { id, conclusion });
        Ok(())
    }
}
