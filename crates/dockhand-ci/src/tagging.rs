//! Commit-anchored tags for pushed stage images.

use std::sync::Arc;

use dockhand_core::{GitCli, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::observer::{PipelineEvent, PipelineObserver};

/// A tag derived from a branch-built image and the checked-out commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivedTag {
    /// Tag to publish.
    pub tag: String,

    /// Commit the tag was derived against.
    pub head_sha: String,
}

/// Derives commit tags by inspecting local git history.
#[derive(Clone)]
pub struct CommitTagger {
    git: GitCli,
    observer: Arc<dyn PipelineObserver>,
}

impl CommitTagger {
    pub fn new(git: GitCli, observer: Arc<dyn PipelineObserver>) -> Self {
        Self { git, observer }
    }

    /// Full hash of the checked-out commit.
    pub async fn head_sha(&self) -> Result<String> {
        self.git.head_sha().await
    }

    /// Resolve `branch_tag` to a commit-stable tag.
    ///
    /// Reads the history and `HEAD` but currently returns `branch_tag`
    /// unchanged. Whether a CI merge commit should be traced back to its
    /// feature commit is undecided, so no rewriting happens yet.
    pub async fn derive_commit_tag(&self, branch_tag: &str) -> Result<DerivedTag> {
        let history = self.git.log_oneline().await?;
        let head_sha = self.git.head_sha().await?;
        debug!(
            branch_tag = %branch_tag,
            head_sha = %head_sha,
            history_len = history.len(),
            head_subject = %history.first().map(|c| c.subject.as_str()).unwrap_or(""),
            "inspected history for commit tag"
        );

        let derived = DerivedTag {
            tag: branch_tag.to_string(),
            head_sha,
        };
        self.observer.on_event(&PipelineEvent::TagDerived {
            branch_tag: branch_tag.to_string(),
            commit_tag: derived.tag.clone(),
            head_sha: derived.head_sha.clone(),
        });
        Ok(derived)
    }
}
