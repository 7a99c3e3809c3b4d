//! Integration tests for the Check Reporter against in-memory fakes.

use dockhand_ci::{CheckReporter, PipelineEvent, RecordingObserver};
use dockhand_core::fakes::{ChecksCall, MemoryChecksApi, ScriptedRunner, FAKE_HEAD_SHA};
use dockhand_core::{
    CheckConclusion, CheckReporterConfig, CheckRunId, DockerCli, DockhandError, GitCli,
};
use std::sync::Arc;

struct Harness {
    runner: Arc<ScriptedRunner>,
    checks: Arc<MemoryChecksApi>,
    observer: Arc<RecordingObserver>,
    reporter: CheckReporter,
}

fn harness(runner: ScriptedRunner, checks: MemoryChecksApi) -> Harness {
    let runner = Arc::new(runner.with_git_head(FAKE_HEAD_SHA));
    let checks = Arc::new(checks);
    let observer = Arc::new(RecordingObserver::new());

    let config = CheckReporterConfig {
        name: "unit tests".to_string(),
        image: "myimg".to_string(),
        command: "./run-tests.sh".to_string(),
        flags: String::new(),
    };
    config.validate().expect("valid config");

    let reporter = CheckReporter::new(
        config,
        checks.clone(),
        DockerCli::new(runner.clone()),
        GitCli::new(runner.clone()),
        observer.clone(),
    );

    Harness {
        runner,
        checks,
        observer,
        reporter,
    }
}

/// Test: successful build creates one check and completes it with success
#[tokio::test]
async fn test_successful_build_reports_success() {
    let h = harness(ScriptedRunner::new(), MemoryChecksApi::new());

    let report = h.reporter.run().await.expect("reporter failed");

    assert_eq!(report.conclusion, CheckConclusion::Success);
    assert_eq!(report.head_sha, FAKE_HEAD_SHA);
    assert_eq!(
        h.checks.calls(),
        vec![
            ChecksCall::Create {
                name: "unit tests".to_string(),
                head_sha: FAKE_HEAD_SHA.to_string(),
            },
            ChecksCall::Update {
                id: report.check_id,
                conclusion: CheckConclusion::Success,
            },
        ]
    );
    assert_eq!(
        h.runner.commands_matching("docker"),
        vec!["docker run --rm myimg ./run-tests.sh"]
    );
}

/// Scenario: container exits 1 → check updated to failure, error is the build's
#[tokio::test]
async fn test_failing_container_reports_failure_and_reraises() {
    let h = harness(
        ScriptedRunner::new().on("docker run", 1),
        MemoryChecksApi::new(),
    );

    let err = h.reporter.run().await.unwrap_err();

    assert_eq!(err.to_string(), "docker run failed with exit code 1");
    let DockhandError::ProcessFailed { code, .. } = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(code, 1);
    assert_eq!(h.checks.create_count(), 1);
    assert_eq!(h.checks.conclusions(), vec![CheckConclusion::Failure]);
}

/// Test: docker missing entirely still produces a failure report
#[tokio::test]
async fn test_spawn_error_reports_failure() {
    let h = harness(
        ScriptedRunner::new()
            .on_spawn_error("docker", "docker: command not found"),
        MemoryChecksApi::new(),
    );

    let err = h.reporter.run().await.unwrap_err();

    assert!(matches!(err, DockhandError::Io(_)));
    assert!(err.to_string().contains("docker: command not found"));
    assert_eq!(h.checks.conclusions(), vec![CheckConclusion::Failure]);
}

/// Test: a failing update surfaces its own error, with no second attempt
#[tokio::test]
async fn test_update_failure_after_build_failure_is_terminal() {
    let h = harness(
        ScriptedRunner::new().on("docker run", 1),
        MemoryChecksApi::new().failing_update("502 Bad Gateway"),
    );

    let err = h.reporter.run().await.unwrap_err();

    assert!(matches!(err, DockhandError::ChecksApi(_)));
    assert!(err.to_string().contains("502 Bad Gateway"));
    assert_eq!(h.checks.conclusions(), vec![CheckConclusion::Failure]);
}

/// Test: a failing update on the success path also fails the run
#[tokio::test]
async fn test_update_failure_after_success_is_terminal() {
    let h = harness(
        ScriptedRunner::new(),
        MemoryChecksApi::new().failing_update("403 Forbidden"),
    );

    let err = h.reporter.run().await.unwrap_err();

    assert!(matches!(err, DockhandError::ChecksApi(_)));
    assert_eq!(h.checks.conclusions(), vec![CheckConclusion::Success]);
}

/// Test: rejected credentials stop before the container runs
#[tokio::test]
async fn test_create_failure_skips_build() {
    let h = harness(
        ScriptedRunner::new(),
        MemoryChecksApi::new()
            .failing_create("401 Unauthorized: Bad credentials"),
    );

    let err = h.reporter.run().await.unwrap_err();

    assert!(err.to_string().contains("Bad credentials"));
    assert!(h.runner.commands_matching("docker").is_empty());
    assert!(h.checks.conclusions().is_empty());
}

/// Test: observer sees created then completed
#[tokio::test]
async fn test_observer_sees_check_lifecycle() {
    let h = harness(
        ScriptedRunner::new().on("docker run", 3),
        MemoryChecksApi::new(),
    );

    let _ = h.reporter.run().await;

    assert_eq!(
        h.observer.events(),
        vec![
            PipelineEvent::CheckCreated {
                id: CheckRunId(1),
                name: "unit tests".to_string(),
                head_sha: FAKE_HEAD_SHA.to_string(),
            },
            PipelineEvent::CheckCompleted {
                id: CheckRunId(1),
                conclusion: CheckConclusion::Failure,
            },
        ]
    );
}
