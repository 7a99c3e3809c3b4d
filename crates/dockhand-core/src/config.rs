//! Configuration records for the two pipelines.
//!
//! The CLI fills these from flags or `INPUT_*` variables and calls
//! `validate()` once before anything runs. Orchestrators assume a validated
//! config.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::docker::split_words;
use crate::error::{DockhandError, Result};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default Dockerfile path.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Default `docker build` context.
pub const DEFAULT_BUILD_CONTEXT: &str = ".";

/// `owner/repo` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoSlug {
    type Err = DockhandError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(DockhandError::Config(format!(
                "repository must look like owner/repo, got {s:?}"
            ))),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Connection settings for the checks API.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST base URL, without trailing slash.
    pub api_url: String,

    /// Repository the check runs belong to.
    pub repository: RepoSlug,

    /// Bearer token.
    pub token: String,
}

impl GithubConfig {
    pub fn new(api_url: &str, repository: &str, token: &str) -> Result<Self> {
        let config = Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.parse()?,
            token: token.trim().to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require("token", &self.token)?;
        require("api url", &self.api_url)
    }
}

/// Inputs of the Check Reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReporterConfig {
    /// Display name of the check run.
    pub name: String,

    /// Image to run.
    pub image: String,

    /// Command run inside the container, split with shell quoting.
    pub command: String,

    /// Extra `docker run` flags, split with shell quoting. May be empty.
    #[serde(default)]
    pub flags: String,
}

impl CheckReporterConfig {
    pub fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("image", &self.image)?;
        require("command", &self.command)?;
        split_words(&self.command)?;
        split_words(&self.flags)?;
        Ok(())
    }
}

/// Inputs of the Stage Builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBuilderConfig {
    /// Image repository prefix; tags are `{repository}/{stage}`.
    pub repository: String,

    /// Dockerfile used for every stage.
    pub dockerfile: String,

    /// Generic stages, built in order.
    pub stages: Vec<String>,

    /// Stage whose tag is published as `testenv-tag`.
    pub testenv_stage: String,

    /// Stage whose tag is published as `server-tag`.
    pub server_stage: String,

    /// Build context directory.
    pub context: String,
}

impl StageBuilderConfig {
    /// Build from raw action inputs; `stages` is comma-separated.
    pub fn from_inputs(
        repository: &str,
        dockerfile: &str,
        stages: &str,
        testenv_stage: &str,
        server_stage: &str,
    ) -> Result<Self> {
        let config = Self {
            repository: repository.trim().to_string(),
            dockerfile: dockerfile.trim().to_string(),
            stages: parse_stage_list(stages)?,
            testenv_stage: testenv_stage.trim().to_string(),
            server_stage: server_stage.trim().to_string(),
            context: DEFAULT_BUILD_CONTEXT.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require("repository", &self.repository)?;
        require("dockerfile", &self.dockerfile)?;
        require("testenv-stage", &self.testenv_stage)?;
        require("server-stage", &self.server_stage)?;
        require("context", &self.context)?;
        if let Some(bad) = self
            .stages
            .iter()
            .find(|s| s.is_empty() || s.chars().any(char::is_whitespace))
        {
            return Err(DockhandError::Config(format!(
                "invalid stage name: {bad:?}"
            )));
        }
        Ok(())
    }
}

/// Split a comma-separated stage list, trimming each entry.
///
/// A blank input yields no stages; an empty entry such as `a,,b` is an error.
pub fn parse_stage_list(input: &str) -> Result<Vec<String>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(str::trim)
        .map(|stage| {
            if stage.is_empty() {
                Err(DockhandError::Config(format!(
                    "empty entry in stage list {input:?}"
                )))
            } else {
                Ok(stage.to_string())
            }
        })
        .collect()
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DockhandError::Config(format!("{field} must not be empty")));
    }
    Ok(())
}
