//! dockhand CI - container build steps
//!
//! Provides two orchestrators:
//! - `CheckReporter` runs one container command inside a GitHub check run
//! - `StageBuilder` builds and pushes Dockerfile stages with inline layer cache

pub mod builder;
pub mod observer;
pub mod reporter;
pub mod stage;
pub mod tagging;

// Re-export key types
pub use builder::{BuildReport, StageBuilder};
pub use observer::{PipelineEvent, PipelineObserver, RecordingObserver, TracingObserver};
pub use reporter::{CheckReport, CheckReporter};
pub use stage::{image_tag, Stage, StageRole, SERVER_TAG_OUTPUT, TESTENV_TAG_OUTPUT};
pub use tagging::{CommitTagger, DerivedTag};
