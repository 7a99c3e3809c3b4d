//! dockhand core library
//!
//! Plumbing shared by the dockhand pipelines: configuration records, the
//! process runner capability with docker and git wrappers, the checks API
//! capability with its GitHub client, workflow commands and tracing setup.

pub mod actions;
pub mod checks;
pub mod config;
pub mod docker;
pub mod error;
pub mod fakes;
pub mod git;
pub mod github;
pub mod process;
pub mod telemetry;

pub use actions::{error_command, set_failed, ActionOutputs};
pub use checks::{
    CheckConclusion, CheckRun, CheckRunId, CheckStatus, ChecksApi, CompleteCheckRun,
    CreateCheckRun,
};
pub use config::{
    parse_stage_list, CheckReporterConfig, GithubConfig, RepoSlug, StageBuilderConfig,
    DEFAULT_API_URL, DEFAULT_BUILD_CONTEXT, DEFAULT_DOCKERFILE,
};
pub use docker::{split_words, BuildRequest, DockerCli, RunRequest};
pub use error::{DockhandError, Result};
pub use git::{CommitLine, GitCli};
pub use github::GithubChecksClient;
pub use process::{Invocation, OutputMode, ProcessOutcome, ProcessRunner, TokioProcessRunner};
pub use telemetry::{init_tracing, LogFormat};
