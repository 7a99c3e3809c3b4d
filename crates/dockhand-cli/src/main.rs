//! dockhand - container build steps for GitHub Actions
//!
//! ## Commands
//!
//! - `check`: run a container command wrapped in a GitHub check run
//! - `build-stages`: build and push Dockerfile stages with inline layer cache
//!
//! Every step input falls back to the `INPUT_<NAME>` variable the Actions
//! runner exports for it, so the binary can be used directly as an action
//! entrypoint.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, Level};

use dockhand_ci::{
    BuildReport, CheckReporter, CommitTagger, PipelineObserver, StageBuilder, TracingObserver,
};
use dockhand_core::{
    set_failed, ActionOutputs, CheckReporterConfig, ChecksApi, DockerCli, GitCli,
    GithubChecksClient, GithubConfig, LogFormat, ProcessRunner, StageBuilderConfig,
    TokioProcessRunner, DEFAULT_API_URL, DEFAULT_BUILD_CONTEXT, DEFAULT_DOCKERFILE,
};

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Container build steps for GitHub Actions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a container command and report it as a GitHub check run
    Check(CheckArgs),

    /// Build and push Dockerfile stages, seeding each from its last pushed image
    BuildStages(BuildStagesArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Token allowed to write check runs
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: String,

    /// Display name of the check run
    #[arg(long, env = "INPUT_NAME")]
    name: String,

    /// Image to run
    #[arg(long, env = "INPUT_IMAGE")]
    image: String,

    /// Command executed inside the container
    #[arg(long, env = "INPUT_COMMAND", allow_hyphen_values = true)]
    command: String,

    /// Extra `docker run` flags
    #[arg(long, env = "INPUT_FLAGS", default_value = "", allow_hyphen_values = true)]
    flags: String,

    /// Repository owning the check run (owner/repo)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    github_repository: String,

    /// GitHub REST base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

impl CheckArgs {
    fn into_configs(self) -> Result<(GithubConfig, CheckReporterConfig)> {
        let api_url = or_default(&self.api_url, DEFAULT_API_URL);
        let github = GithubConfig::new(&api_url, &self.github_repository, &self.token)
            .context("invalid GitHub settings")?;
        let reporter = CheckReporterConfig {
            name: self.name,
            image: self.image,
            command: self.command,
            flags: self.flags,
        };
        reporter.validate().context("invalid check inputs")?;
        Ok((github, reporter))
    }
}

#[derive(Args, Debug)]
struct BuildStagesArgs {
    /// Image repository prefix; stage tags are `<repository>/<stage>`
    #[arg(long, env = "INPUT_REPOSITORY")]
    repository: String,

    /// Dockerfile holding every stage
    #[arg(long, env = "INPUT_DOCKERFILE", default_value = DEFAULT_DOCKERFILE)]
    dockerfile: String,

    /// Comma-separated generic stages, built first and in order
    #[arg(long, env = "INPUT_STAGES", default_value = "")]
    stages: String,

    /// Stage published as the `testenv-tag` output
    #[arg(long, env = "INPUT_TESTENV-STAGE")]
    testenv_stage: String,

    /// Stage published as the `server-tag` output
    #[arg(long, env = "INPUT_SERVER-STAGE")]
    server_stage: String,

    /// Build context directory
    #[arg(long, env = "INPUT_CONTEXT", default_value = DEFAULT_BUILD_CONTEXT)]
    context: String,
}

impl BuildStagesArgs {
    fn into_config(self) -> Result<StageBuilderConfig> {
        let mut config = StageBuilderConfig::from_inputs(
            &self.repository,
            &or_default(&self.dockerfile, DEFAULT_DOCKERFILE),
            &self.stages,
            &self.testenv_stage,
            &self.server_stage,
        )
        .context("invalid build inputs")?;
        config.context = or_default(&self.context, DEFAULT_BUILD_CONTEXT);
        config.validate().context("invalid build inputs")?;
        Ok(config)
    }
}

/// Optional inputs left empty in the workflow arrive as `""`; those fall
/// back to `default`.
fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        value => value.to_string(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(code) => return code,
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    dockhand_core::init_tracing(LogFormat::from_json_flag(cli.json), level);

    let result = match cli.command {
        Commands::Check(args) => cmd_check(args).await,
        Commands::BuildStages(args) => cmd_build_stages(args).await,
    };
    finish(result)
}

/// Parse arguments. `--help` and `--version` exit cleanly; usage errors
/// fail the step with an error annotation.
fn parse_cli<I, T>(args: I) -> std::result::Result<Cli, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|err| {
        err.print().ok();
        if err.use_stderr() {
            set_failed(err.render().to_string().trim());
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Map the command result to the process exit code, annotating failures.
fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = failure_message(&err);
            error!(error = %message, "step failed");
            set_failed(&message);
            ExitCode::FAILURE
        }
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

async fn cmd_check(args: CheckArgs) -> Result<()> {
    let (github, config) = args.into_configs()?;
    let checks = Arc::new(GithubChecksClient::new(github)?);
    let runner = Arc::new(TokioProcessRunner::new());
    run_check(config, checks, runner).await
}

async fn run_check(
    config: CheckReporterConfig,
    checks: Arc<dyn ChecksApi>,
    runner: Arc<dyn ProcessRunner>,
) -> Result<()> {
    let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);
    let reporter = CheckReporter::new(
        config,
        checks,
        DockerCli::new(runner.clone()),
        GitCli::new(runner),
        observer,
    );
    let report = reporter.run().await?;

    info!(report = %serde_json::to_string(&report)?, "check run completed");
    Ok(())
}

async fn cmd_build_stages(args: BuildStagesArgs) -> Result<()> {
    let config = args.into_config()?;
    let runner = Arc::new(TokioProcessRunner::new());
    let outputs = ActionOutputs::from_env();
    run_build_stages(config, runner, &outputs).await
}

async fn run_build_stages(
    config: StageBuilderConfig,
    runner: Arc<dyn ProcessRunner>,
    outputs: &ActionOutputs,
) -> Result<()> {
    let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);
    let builder = StageBuilder::new(
        config,
        DockerCli::new(runner.clone()),
        CommitTagger::new(GitCli::new(runner), observer.clone()),
        observer,
    );
    let report = builder.run().await?;

    info!(report = %serde_json::to_string(&report)?, "stages built and pushed");
    write_outputs(&report, outputs)
}

fn write_outputs(report: &BuildReport, outputs: &ActionOutputs) -> Result<()> {
    for (name, value) in report.outputs() {
        outputs
            .set_output(name, value)
            .with_context(|| format!("failed to set output {name}"))?;
    }
    Ok(())
}
