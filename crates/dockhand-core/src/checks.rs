//! Check-run types and the checks API capability.
//!
//! A check run is created `in_progress` against one commit and completed
//! exactly once with a [`CheckConclusion`]. [`crate::github::GithubChecksClient`]
//! talks to the real REST API; [`crate::fakes::MemoryChecksApi`] records calls
//! for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Remote check-run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckRunId(pub u64);

impl std::fmt::Display for CheckRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Queued,
    InProgress,
    Completed,
}

/// Terminal outcome of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    ActionRequired,
    Cancelled,
    Failure,
    Neutral,
    Success,
    Skipped,
    Stale,
    TimedOut,
}

impl CheckConclusion {
    /// Wire name, e.g. `timed_out`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckConclusion::ActionRequired => "action_required",
            CheckConclusion::Cancelled => "cancelled",
            CheckConclusion::Failure => "failure",
            CheckConclusion::Neutral => "neutral",
            CheckConclusion::Success => "success",
            CheckConclusion::Skipped => "skipped",
            CheckConclusion::Stale => "stale",
            CheckConclusion::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for CheckConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a create-check-run request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    pub started_at: DateTime<Utc>,
}

impl CreateCheckRun {
    /// An `in_progress` check run started now.
    pub fn in_progress(name: impl Into<String>, head_sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            head_sha: head_sha.into(),
            status: CheckStatus::InProgress,
            started_at: Utc::now(),
        }
    }
}

/// Body of the update request that completes a check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteCheckRun {
    pub status: CheckStatus,
    pub conclusion: CheckConclusion,
    pub completed_at: DateTime<Utc>,
}

impl CompleteCheckRun {
    pub fn now(conclusion: CheckConclusion) -> Self {
        Self {
            status: CheckStatus::Completed,
            conclusion,
            completed_at: Utc::now(),
        }
    }
}

/// Check run as returned by the API. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckRun {
    pub id: CheckRunId,
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub conclusion: Option<CheckConclusion>,
}

/// Create and complete check runs for one repository.
#[async_trait]
pub trait ChecksApi: Send + Sync {
    /// Create an `in_progress` check run and return its id.
    async fn create_check(&self, request: &CreateCheckRun) -> Result<CheckRunId>;

    /// Mark a check run `completed` with the given conclusion.
    async fn update_check(&self, id: CheckRunId, conclusion: CheckConclusion) -> Result<()>;
}
