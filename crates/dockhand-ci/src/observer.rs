//! Pipeline progress events and their sinks.
//!
//! Orchestrators report progress through [`PipelineObserver`] rather than
//! logging directly, so tests can assert on the event stream.

use std::sync::Mutex;

use dockhand_core::{CheckConclusion, CheckRunId};
use tracing::{info, warn};

/// One step of progress in either pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    CheckCreated {
        id: CheckRunId,
        name: String,
        head_sha: String,
    },
    CheckCompleted {
        id: CheckRunId,
        conclusion: CheckConclusion,
    },
    StageStarted {
        stage: String,
        tag: String,
    },
    /// The cache-seed pull or re-tag failed; the build runs without it.
    CacheSeedMissed {
        stage: String,
        tag: String,
        reason: String,
    },
    StageBuilt {
        stage: String,
        tag: String,
    },
    StagePushed {
        stage: String,
        tag: String,
    },
    TagDerived {
        branch_tag: String,
        commit_tag: String,
        head_sha: String,
    },
}

/// Sink for [`PipelineEvent`]s.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::CheckCreated { id, name, head_sha } => {
                info!(event = "check.created", check_id = %id, name = %name, head_sha = %head_sha);
            }
            PipelineEvent::CheckCompleted { id, conclusion } => {
                info!(event = "check.completed", check_id = %id, conclusion = %conclusion);
            }
            PipelineEvent::StageStarted { stage, tag } => {
                info!(event = "stage.started", stage = %stage, tag = %tag);
            }
            PipelineEvent::CacheSeedMissed { stage, tag, reason } => {
                warn!(event = "stage.cache_seed_missed", %stage, %tag, %reason);
            }
            PipelineEvent::StageBuilt { stage, tag } => {
                info!(event = "stage.built", stage = %stage, tag = %tag);
            }
            PipelineEvent::StagePushed { stage, tag } => {
                info!(event = "stage.pushed", stage = %stage, tag = %tag);
            }
            PipelineEvent::TagDerived {
                branch_tag,
                commit_tag,
                head_sha,
            } => {
                info!(
                    event = "tag.derived",
                    branch_tag = %branch_tag,
                    commit_tag = %commit_tag,
                    head_sha = %head_sha
                );
            }
        }
    }
}

/// Keeps every event in memory (testing only).
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
