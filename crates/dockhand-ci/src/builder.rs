//! Stage Builder: cached multi-stage image build and push.
//!
//! Each stage goes through pull-as-cache → re-tag → build → push before the
//! next one starts. Only the cache seeding may fail; the first failing build
//! or push aborts the run and leaves earlier pushes in place.

use std::sync::Arc;

use dockhand_core::{BuildRequest, DockerCli, DockhandError, Result, StageBuilderConfig};
use serde::Serialize;
use tracing::info;

use crate::observer::{PipelineEvent, PipelineObserver};
use crate::stage::{Stage, StageRole, SERVER_TAG_OUTPUT, TESTENV_TAG_OUTPUT};
use crate::tagging::CommitTagger;

/// Result of a complete Stage Builder run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Every pushed tag, in build order.
    pub pushed: Vec<String>,

    /// Derived tag of the test environment stage.
    pub testenv_tag: String,

    /// Derived tag of the server stage.
    pub server_tag: String,

    /// Commit the derived tags were computed against.
    pub head_sha: String,
}

impl BuildReport {
    /// Step outputs as `(name, value)` pairs.
    pub fn outputs(&self) -> [(&'static str, &str); 2] {
        [
            (TESTENV_TAG_OUTPUT, self.testenv_tag.as_str()),
            (SERVER_TAG_OUTPUT, self.server_tag.as_str()),
        ]
    }
}

/// Multi-stage build orchestrator.
pub struct StageBuilder {
    config: StageBuilderConfig,
    docker: DockerCli,
    tagger: CommitTagger,
    observer: Arc<dyn PipelineObserver>,
}

impl StageBuilder {
    pub fn new(
        config: StageBuilderConfig,
        docker: DockerCli,
        tagger: CommitTagger,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            config,
            docker,
            tagger,
            observer,
        }
    }

    /// Every stage in build order: generic stages, then test env, then server.
    pub fn plan(&self) -> Vec<Stage> {
        let repository = &self.config.repository;
        self.config
            .stages
            .iter()
            .map(|name| Stage::generic(repository, name))
            .chain([
                Stage::new(repository, &self.config.testenv_stage, StageRole::TestEnv),
                Stage::new(repository, &self.config.server_stage, StageRole::Server),
            ])
            .collect()
    }

    /// Build and push every stage, then derive the two published tags.
    ///
    /// `HEAD` is resolved before the first build so a broken checkout never
    /// pushes anything.
    pub async fn run(&self) -> Result<BuildReport> {
        let head_sha = self.tagger.head_sha().await?;
        info!(head_sha = %head_sha, repository = %self.config.repository, "starting stage build");

        let mut pushed = Vec::new();
        let mut testenv_tag = None;
        let mut server_tag = None;

        for stage in self.plan() {
            let branch_tag = self.build_and_push_stage(&stage).await?;
            pushed.push(branch_tag.clone());

            match stage.role {
                StageRole::Generic => {}
                StageRole::TestEnv => {
                    testenv_tag = Some(self.tagger.derive_commit_tag(&branch_tag).await?.tag);
                }
                StageRole::Server => {
                    server_tag = Some(self.tagger.derive_commit_tag(&branch_tag).await?.tag);
                }
            }
        }

        match (testenv_tag, server_tag) {
            (Some(testenv_tag), Some(server_tag)) => Ok(BuildReport {
                pushed,
                testenv_tag,
                server_tag,
                head_sha,
            }),
            _ => Err(DockhandError::Config(
                "testenv and server stages must both be built".to_string(),
            )),
        }
    }

    /// Seed the cache, build, and push one stage. Returns the pushed tag.
    pub async fn build_and_push_stage(&self, stage: &Stage) -> Result<String> {
        self.observer.on_event(&PipelineEvent::StageStarted {
            stage: stage.name.clone(),
            tag: stage.tag.clone(),
        });

        if let Err(reason) = self.seed_cache(stage).await {
            self.observer.on_event(&PipelineEvent::CacheSeedMissed {
                stage: stage.name.clone(),
                tag: stage.tag.clone(),
                reason,
            });
        }

        let request = BuildRequest {
            dockerfile: self.config.dockerfile.clone(),
            target: stage.name.clone(),
            tag: stage.tag.clone(),
            cache_from: stage.name.clone(),
            context: self.config.context.clone(),
        };
        let built = self.docker.build(&request).await?;
        if !built.success() {
            return Err(DockhandError::BuildFailed {
                tag: stage.tag.clone(),
            });
        }
        self.observer.on_event(&PipelineEvent::StageBuilt {
            stage: stage.name.clone(),
            tag: stage.tag.clone(),
        });

        let pushed = self.docker.push(&stage.tag).await?;
        if !pushed.success() {
            return Err(DockhandError::PushFailed {
                tag: stage.tag.clone(),
            });
        }
        self.observer.on_event(&PipelineEvent::StagePushed {
            stage: stage.name.clone(),
            tag: stage.tag.clone(),
        });

        Ok(stage.tag.clone())
    }

    /// Pull the previous remote image and re-tag it as the bare stage name.
    /// Any failure is returned as a reason string for the caller to swallow.
    async fn seed_cache(&self, stage: &Stage) -> std::result::Result<(), String> {
        let pulled = self
            .docker
            .pull(&stage.tag)
            .await
            .map_err(|e| e.to_string())?;
        if !pulled.success() {
            return Err(format!("docker pull exited with code {}", pulled.exit_code));
        }

        let tagged = self
            .docker
            .tag(&stage.tag, &stage.name)
            .await
            .map_err(|e| e.to_string())?;
        if !tagged.success() {
            return Err(format!("docker tag exited with code {}", tagged.exit_code));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::RecordingObserver;
    use dockhand_core::fakes::{ScriptedRunner, FAKE_HEAD_SHA};
    use dockhand_core::GitCli;

    fn builder(runner: Arc<ScriptedRunner>, stages: &str) -> StageBuilder {
        let config =
            StageBuilderConfig::from_inputs("acme/app", "Dockerfile", stages, "test", "server")
                .unwrap();
        let observer: Arc<dyn PipelineObserver> = Arc::new(RecordingObserver::new());
        StageBuilder::new(
            config,
            DockerCli::new(runner.clone()),
            CommitTagger::new(GitCli::new(runner), observer.clone()),
            observer,
        )
    }

    #[test]
    fn test_plan_orders_generic_then_test_then_server() {
        let builder = builder(Arc::new(ScriptedRunner::new()), "base,deps");
        let plan = builder.plan();

        let tags: Vec<&str> = plan.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec![
                "acme/app/base",
                "acme/app/deps",
                "acme/app/test",
                "acme/app/server",
            ]
        );
        assert_eq!(plan[2].role, StageRole::TestEnv);
        assert_eq!(plan[3].role, StageRole::Server);
    }

    #[test]
    fn test_plan_without_generic_stages() {
        let builder = builder(Arc::new(ScriptedRunner::new()), "");
        assert_eq!(builder.plan().len(), 2);
    }

    #[tokio::test]
    async fn test_build_and_push_stage_command_sequence() {
        let runner = Arc::new(ScriptedRunner::new());
        let builder = builder(runner.clone(), "base");

        let tag = builder
            .build_and_push_stage(&Stage::generic("acme/app", "base"))
            .await
            .unwrap();
        assert_eq!(tag, "acme/app/base");
        assert_eq!(
            runner.command_lines(),
            vec![
                "docker pull acme/app/base",
                "docker tag acme/app/base base",
                "docker build --build-arg BUILDKIT_INLINE_CACHE=1 --cache-from base \
                 --file Dockerfile --tag acme/app/base --target base .",
                "docker push acme/app/base",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_pull_skips_retag_but_builds() {
        let runner = Arc::new(ScriptedRunner::new().on("docker pull", 1));
        let builder = builder(runner.clone(), "base");

        builder
            .build_and_push_stage(&Stage::generic("acme/app", "base"))
            .await
            .unwrap();
        assert!(runner.commands_matching("docker tag").is_empty());
        assert_eq!(runner.commands_matching("docker build").len(), 1);
        assert_eq!(runner.commands_matching("docker push").len(), 1);
    }

    #[tokio::test]
    async fn test_failed_retag_is_tolerated() {
        let runner = Arc::new(ScriptedRunner::new().on("docker tag", 1));
        let builder = builder(runner.clone(), "base");

        let result = builder
            .build_and_push_stage(&Stage::generic("acme/app", "base"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_run_resolves_head_before_building() {
        let runner = Arc::new(ScriptedRunner::new().on("git", 128));
        let builder = builder(runner.clone(), "base");

        assert!(matches!(builder.run().await, Err(DockhandError::Git(_))));
        assert!(runner.commands_matching("docker").is_empty());
    }

    #[tokio::test]
    async fn test_report_outputs() {
        let runner = Arc::new(ScriptedRunner::new().with_git_head(FAKE_HEAD_SHA));
        let report = builder(runner, "base").run().await.unwrap();

        assert_eq!(
            report.outputs(),
            [
                ("testenv-tag", "acme/app/test"),
                ("server-tag", "acme/app/server"),
            ]
        );
        assert_eq!(report.head_sha, FAKE_HEAD_SHA);
    }
}
