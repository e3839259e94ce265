use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::auth::Token;
use crate::config::{Config, PollConfig};
use crate::defaults::DefaultsStore;
use crate::git::SourceInfo;
use crate::output;
use crate::providers::azure::AzureDevOpsClient;
use crate::report::RunReport;
use crate::runner::{Execution, PipelineRunner, RunRequest, RunnerSettings};

#[derive(Parser, Debug)]
#[command(name = "pipeline-runner")]
#[command(
    author,
    version,
    about = "Provision and run an Azure DevOps validation pipeline",
    long_about = None
)]
pub struct Cli {
    /// Name prefix; the project is named <PREFIX>-<FLAVOR>
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    prefix: String,

    /// Pipeline identifier; the definition is read from test/pipeline/<PIPELINE>.yaml
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    pipeline: String,

    /// Build flavor, passed to the run as the `flavor` parameter
    #[arg(value_parser = NonEmptyStringValueParser::new())]
    flavor: String,

    /// Version string, passed to the run as the `version` parameter
    #[arg(
        id = "run_version",
        value_name = "VERSION",
        value_parser = NonEmptyStringValueParser::new()
    )]
    run_version: String,

    #[arg(long, env = "AZURE_DEVOPS_ORG_URL")]
    organization: Option<String>,

    #[arg(short, long, env = "AZURE_DEVOPS_EXT_PAT", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "AZURE_DEVOPS_EXT_GITHUB_PAT", hide_env_values = true)]
    github_token: Option<String>,

    /// Agent pool to authorize the pipeline against
    #[arg(long)]
    pool: Option<String>,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between run status checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Seconds to wait for the run before cancelling it
    #[arg(long)]
    timeout: Option<u64>,

    /// Write a JSON run report to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    pretty: bool,
}

/// Exit status for a command line that failed to parse.
///
/// `--help` and `--version` also arrive here and succeed.
pub fn parse_failure_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

impl Cli {
    fn settings(&self, config: &Config) -> Result<RunnerSettings> {
        let poll = PollConfig {
            interval_secs: self.poll_interval.unwrap_or(config.poll.interval_secs),
            timeout_secs: self.timeout.unwrap_or(config.poll.timeout_secs),
        };

        Ok(RunnerSettings {
            agent_pool: self
                .pool
                .clone()
                .unwrap_or_else(|| config.azure.agent_pool.clone()),
            visibility: config.provisioning.visibility,
            process_template_id: config.provisioning.process_template_id.clone(),
            poll: poll.policy()?,
        })
    }

    fn write_report(&self, execution: &Execution) -> Result<()> {
        let Some(output_path) = &self.output else {
            return Ok(());
        };

        let report = RunReport::from_execution(execution);
        let json_output = if self.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };

        std::fs::write(output_path, json_output)
            .with_context(|| format!("Failed to write report: {}", output_path.display()))?;
        info!("Run report written to: {}", output_path.display());
        Ok(())
    }

    pub async fn execute(&self) -> Result<ExitCode> {
        let request =
            RunRequest::new(&self.prefix, &self.pipeline, &self.flavor, &self.run_version)?;
        let config = Config::load(self.config.as_deref())?;
        let settings = self.settings(&config)?;
        let working_dir =
            std::env::current_dir().context("Failed to resolve the working directory")?;
        let definition =
            request.locate_definition(&working_dir, &config.provisioning.pipeline_dir)?;
        info!("Using pipeline definition {}", definition.path().display());

        let organization = self
            .organization
            .clone()
            .or_else(|| config.azure.organization.clone())
            .context("No organization URL configured; pass --organization or set AZURE_DEVOPS_ORG_URL")?;
        let token = self
            .token
            .clone()
            .map(Token::from)
            .context("No personal access token; pass --token or set AZURE_DEVOPS_EXT_PAT")?;

        let source = SourceInfo::discover(Path::new("."))
            .await
            .context("Failed to inspect the local checkout")?;

        let client = AzureDevOpsClient::new(&organization, token)?;
        let runner = PipelineRunner::new(client, settings)
            .github_token(self.github_token.clone().map(Token::from))
            .record_defaults(DefaultsStore::user()?, organization.as_str())
            .show_progress(true);

        info!(
            "Running {} for project {} on {}",
            request.pipeline,
            request.project_name(),
            source.branch
        );
        let execution = runner.execute(&request, &definition, &source).await?;

        output::print_execution(&execution);
        self.write_report(&execution)?;

        Ok(ExitCode::from(execution.outcome.disposition.exit_code()))
    }
}
