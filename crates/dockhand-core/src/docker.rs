//! Thin wrapper over the `docker` CLI.
//!
//! Only argument assembly lives here. Deciding whether a non-zero exit is
//! fatal or tolerated is left to the callers in `dockhand-ci`.

use std::sync::Arc;

use crate::error::{DockhandError, Result};
use crate::process::{Invocation, OutputMode, ProcessOutcome, ProcessRunner};

const DOCKER: &str = "docker";

/// Build argument enabling BuildKit's inline layer cache metadata.
pub const INLINE_CACHE_BUILD_ARG: &str = "BUILDKIT_INLINE_CACHE=1";

/// Parameters for `docker build`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Path to the Dockerfile.
    pub dockerfile: String,

    /// Multi-stage target to build.
    pub target: String,

    /// Output tag.
    pub tag: String,

    /// Local image used as a layer cache source.
    pub cache_from: String,

    /// Build context directory.
    pub context: String,
}

impl BuildRequest {
    pub fn to_invocation(&self) -> Invocation {
        Invocation::new(DOCKER).args([
            "build",
            "--build-arg",
            INLINE_CACHE_BUILD_ARG,
            "--cache-from",
            &self.cache_from,
            "--file",
            &self.dockerfile,
            "--tag",
            &self.tag,
            "--target",
            &self.target,
            &self.context,
        ])
    }
}

/// Parameters for `docker run --rm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Image reference.
    pub image: String,

    /// Command and arguments run inside the container.
    pub command: Vec<String>,

    /// Extra flags placed between `--rm` and the image.
    pub flags: Vec<String>,
}

impl RunRequest {
    pub fn to_invocation(&self) -> Invocation {
        Invocation::new(DOCKER)
            .args(["run", "--rm"])
            .args(self.flags.iter().cloned())
            .arg(self.image.clone())
            .args(self.command.iter().cloned())
    }
}

/// Split a flags or command string into arguments with POSIX shell quoting.
///
/// Quotes group words and are removed; nothing is expanded. Unbalanced
/// quotes are a configuration error.
pub fn split_words(input: &str) -> Result<Vec<String>> {
    shell_words::split(input)
        .map_err(|e| DockhandError::Config(format!("cannot split {input:?}: {e}")))
}

/// `docker` CLI client. All output streams into the CI log.
#[derive(Clone)]
pub struct DockerCli {
    runner: Arc<dyn ProcessRunner>,
}

impl DockerCli {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    /// `docker pull {image}`
    pub async fn pull(&self, image: &str) -> Result<ProcessOutcome> {
        let inv = Invocation::new(DOCKER).args(["pull", image]);
        self.runner.run(&inv, OutputMode::Inherit).await
    }

    /// `docker tag {source} {target}`
    pub async fn tag(&self, source: &str, target: &str) -> Result<ProcessOutcome> {
        let inv = Invocation::new(DOCKER).args(["tag", source, target]);
        self.runner.run(&inv, OutputMode::Inherit).await
    }

    pub async fn build(&self, request: &BuildRequest) -> Result<ProcessOutcome> {
        self.runner
            .run(&request.to_invocation(), OutputMode::Inherit)
            .await
    }

    /// `docker push {tag}`
    pub async fn push(&self, tag: &str) -> Result<ProcessOutcome> {
        let inv = Invocation::new(DOCKER).args(["push", tag]);
        self.runner.run(&inv, OutputMode::Inherit).await
    }

    pub async fn run(&self, request: &RunRequest) -> Result<ProcessOutcome> {
        self.runner
            .run(&request.to_invocation(), OutputMode::Inherit)
            .await
    }
}
