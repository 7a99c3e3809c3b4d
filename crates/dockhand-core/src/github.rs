//! GitHub REST client for check runs.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use crate::checks::{
    CheckConclusion, CheckRun, CheckRunId, ChecksApi, CompleteCheckRun, CreateCheckRun,
};
use crate::config::GithubConfig;
use crate::error::{DockhandError, Result};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// [`ChecksApi`] implementation over the GitHub REST API.
pub struct GithubChecksClient {
    config: GithubConfig,
    http: Client,
}

impl GithubChecksClient {
    pub fn new(config: GithubConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));

        let http = Client::builder()
            .user_agent(concat!("dockhand/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self { config, http })
    }

    fn check_runs_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/check-runs",
            self.config.api_url, self.config.repository.owner, self.config.repository.repo
        )
    }

    fn check_run_url(&self, id: CheckRunId) -> String {
        format!("{}/{}", self.check_runs_url(), id)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.config.token)
    }
}

/// Turn a non-2xx response into a `ChecksApi` error carrying status and body.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("{status}: {}", body.trim());
    Err(DockhandError::ChecksApi(message))
}

#[async_trait]
impl ChecksApi for GithubChecksClient {
    async fn create_check(&self, request: &CreateCheckRun) -> Result<CheckRunId> {
        let url = self.check_runs_url();
        debug!(%url, name = %request.name, head_sha = %request.head_sha, "creating check run");

        let response = self
            .authorized(self.http.post(&url))
            .json(request)
            .send()
            .await?;
        let run: CheckRun = ensure_success(response).await?.json().await?;
        Ok(run.id)
    }

    async fn update_check(&self, id: CheckRunId, conclusion: CheckConclusion) -> Result<()> {
        let url = self.check_run_url(id);
        debug!(%url, %conclusion, "completing check run");

        let response = self
            .authorized(self.http.patch(&url))
            .json(&CompleteCheckRun::now(conclusion))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
