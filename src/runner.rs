mod input;
mod provision;
mod watch;

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::Token;
use crate::config::Visibility;
use crate::defaults::DefaultsStore;
use crate::error::Result;
use crate::git::SourceInfo;
use crate::output::PollProgress;
use crate::poll::{Clock, PollPolicy, SystemClock};
use crate::providers::azure::{
    AgentQueue, DevOpsApi, Pipeline, PipelineRun, PipelineSpec, Project, ProjectSpec, RunSpec,
    ServiceEndpoint,
};

pub use input::{DefinitionFile, RunRequest};

/// How a watched run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Disposition {
    Succeeded,
    Failed,
    TimedOut,
}

impl Disposition {
    pub fn is_success(self) -> bool {
        self == Self::Succeeded
    }

    pub fn exit_code(self) -> u8 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run: PipelineRun,
    pub disposition: Disposition,
    pub elapsed: Duration,
}

/// Everything resolved or created during one invocation.
#[derive(Debug, Clone)]
pub struct Execution {
    pub project: Project,
    pub queue: AgentQueue,
    pub endpoint: ServiceEndpoint,
    pub pipeline: Pipeline,
    pub outcome: RunOutcome,
}

/// Fixed parameters that do not come from the positional inputs.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub agent_pool: String,
    pub visibility: Visibility,
    pub process_template_id: String,
    pub poll: PollPolicy,
}

/// Drives provisioning, authorization, the run trigger and the poll loop,
/// strictly in that order.
pub struct PipelineRunner<A, C = SystemClock> {
    api: A,
    clock: C,
    settings: RunnerSettings,
    github_token: Option<Token>,
    defaults: Option<(DefaultsStore, String)>,
    show_progress: bool,
}

impl<A: DevOpsApi> PipelineRunner<A, SystemClock> {
    pub fn new(api: A, settings: RunnerSettings) -> Self {
        Self::with_clock(api, SystemClock, settings)
    }
}

impl<A: DevOpsApi, C: Clock> PipelineRunner<A, C> {
    pub fn with_clock(api: A, clock: C, settings: RunnerSettings) -> Self {
        Self {
            api,
            clock,
            settings,
            github_token: None,
            defaults: None,
            show_progress: false,
        }
    }

    /// Token used when the GitHub service connection has to be created.
    #[must_use]
    pub fn github_token(mut self, token: Option<Token>) -> Self {
        self.github_token = token;
        self
    }

    /// Records `organization` and the resolved project as local defaults.
    #[must_use]
    pub fn record_defaults(mut self, store: DefaultsStore, organization: impl Into<String>) -> Self {
        self.defaults = Some((store, organization.into()));
        self
    }

    #[must_use]
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    #[cfg(test)]
    pub(crate) fn api(&self) -> &A {
        &self.api
    }

    pub async fn execute(
        &self,
        request: &RunRequest,
        definition: &DefinitionFile,
        source: &SourceInfo,
    ) -> Result<Execution> {
        let project_spec = ProjectSpec {
            name: request.project_name(),
            description: request.description(),
            visibility: self.settings.visibility,
            process_template_id: self.settings.process_template_id.clone(),
        };
        let project = provision::ensure_project(&self.api, &project_spec).await?;
        self.save_defaults(&project)?;

        let queue = provision::lookup_queue(&self.api, &project, &self.settings.agent_pool).await?;

        let endpoint = provision::ensure_service_connection(
            &self.api,
            &project,
            source,
            self.github_token.as_ref(),
        )
        .await?;

        let pipeline_spec = PipelineSpec {
            name: request.pipeline.clone(),
            yaml_path: definition.yaml_path().to_string(),
            repository: source.repository.clone(),
            connection_id: endpoint.id.clone(),
            branch: source.branch.clone(),
        };
        let pipeline = provision::ensure_pipeline(&self.api, &project, &pipeline_spec).await?;

        info!(
            "Authorizing pipeline {} on queue {}",
            pipeline.id, queue.id
        );
        self.api
            .authorize_pipeline(&project, queue.id, pipeline.id)
            .await?;

        let mut template_parameters = IndexMap::new();
        template_parameters.insert("flavor".to_string(), request.flavor.clone());
        template_parameters.insert("version".to_string(), request.version.clone());
        let run_spec = RunSpec {
            ref_name: source.ref_name(),
            commit: source.commit.clone(),
            template_parameters,
        };
        let run = self
            .api
            .run_pipeline(&project, pipeline.id, &run_spec)
            .await?;
        info!(
            "Started run {} of {} at {}",
            run.id, pipeline.name, source.commit
        );

        let progress = PollProgress::start(run.id, self.show_progress);
        let outcome = watch::watch_run(
            &self.api,
            &self.clock,
            self.settings.poll,
            &project,
            run.id,
            &progress,
        )
        .await?;

        Ok(Execution {
            project,
            queue,
            endpoint,
            pipeline,
            outcome,
        })
    }

    fn save_defaults(&self, project: &Project) -> Result<()> {
        let Some((store, organization)) = &self.defaults else {
            return Ok(());
        };

        store.set_project(organization, &project.name)?;
        debug!(
            "Default project set to {} in {}",
            project.name,
            store.path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunnerError;
    use crate::git::GitHubRepository;
    use crate::poll::FakeClock;
    use crate::providers::azure::fake::{run, FakeDevOps};
    use crate::providers::azure::{RunResult, RunStatus, ValidationLevel, ValidationResult};
    use reqwest::Method;
    use std::path::Path;

    fn settings() -> RunnerSettings {
        RunnerSettings {
            agent_pool: "Default".to_string(),
            visibility: Visibility::Private,
            process_template_id: "tmpl".to_string(),
            poll: PollPolicy::default(),
        }
    }

    fn source() -> SourceInfo {
        SourceInfo {
            branch: "main".to_string(),
            commit: "abc123".to_string(),
            repository: GitHubRepository {
                owner: "acme".to_string(),
                name: "widgets".to_string(),
            },
        }
    }

    fn definition(root: &Path) -> (RunRequest, DefinitionFile) {
        std::fs::create_dir(root.join("pipelines")).unwrap();
        std::fs::write(root.join("pipelines").join("smoke.yaml"), "steps: []\n").unwrap();
        let request = RunRequest::new("ci", "smoke", "debug", "1.2.3").unwrap();
        let definition = request
            .locate_definition(root, Path::new("pipelines"))
            .unwrap();
        (request, definition)
    }

    fn completed(result: RunResult) -> PipelineRun {
        let mut run = run(1, RunStatus::Completed, Some(result));
        run.validation_results = vec![ValidationResult {
            result: ValidationLevel::Ok,
            message: "Validation passed".to_string(),
        }];
        run
    }

    fn runner(api: FakeDevOps) -> PipelineRunner<FakeDevOps, FakeClock> {
        PipelineRunner::with_clock(api, FakeClock::new(), settings())
            .github_token(Some(Token::from("gh")))
    }

    #[tokio::test]
    async fn test_successful_execution() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![completed(RunResult::Succeeded)]);
        let runner = runner(api);

        let execution = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        assert_eq!(execution.project.name, "ci-debug");
        assert_eq!(execution.endpoint.name, "ci-debug");
        assert_eq!(
            execution.endpoint.url.as_deref(),
            Some("https://github.com/acme/widgets")
        );
        assert_eq!(execution.pipeline.name, "smoke");
        assert_eq!(execution.queue.id, 4);
        assert_eq!(execution.outcome.disposition, Disposition::Succeeded);
        assert_eq!(execution.outcome.disposition.exit_code(), 0);
        assert_eq!(execution.outcome.run.validation_results.len(), 1);

        let pipeline_spec = runner.api().last_pipeline_spec().unwrap();
        assert_eq!(pipeline_spec.yaml_path, "pipelines/smoke.yaml");
        assert_eq!(pipeline_spec.connection_id, execution.endpoint.id);

        let spec = runner.api().last_run_spec().unwrap();
        assert_eq!(spec.ref_name, "refs/heads/main");
        assert_eq!(spec.commit, "abc123");
        let params: Vec<_> = spec.template_parameters.iter().collect();
        assert_eq!(
            params,
            vec![
                (&"flavor".to_string(), &"debug".to_string()),
                (&"version".to_string(), &"1.2.3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![completed(RunResult::Succeeded)]);
        let runner = runner(api);

        runner
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        assert_eq!(
            runner.api().calls(),
            vec![
                "get_project",
                "create_project",
                "find_queue",
                "find_service_endpoint",
                "create_service_endpoint",
                "find_pipeline",
                "create_pipeline",
                "invoke",
                "run_pipeline",
                "get_run",
            ]
        );

        let invoked = runner.api().invoked();
        assert_eq!(invoked[0].method, Method::PATCH);
        assert_eq!(invoked[0].route, "pipelines/pipelinePermissions/queue/4");
        assert_eq!(
            invoked[0].body,
            Some(serde_json::json!({"pipelines": [{"id": 10, "authorized": true}]}))
        );
    }

    #[tokio::test]
    async fn test_second_invocation_only_looks_up() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![completed(RunResult::Succeeded)]);
        let runner = runner(api);

        let first = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap();
        let second = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        let api = runner.api();
        assert_eq!(api.count("create_project"), 1);
        assert_eq!(api.count("create_service_endpoint"), 1);
        assert_eq!(api.count("create_pipeline"), 1);
        assert_eq!(api.count("get_project"), 2);
        assert_eq!(api.count("run_pipeline"), 2);
        // authorization is re-sent on every invocation
        assert_eq!(api.invoked().len(), 2);
        assert_eq!(first.project, second.project);
        assert_eq!(first.pipeline, second.pipeline);
    }

    #[tokio::test]
    async fn test_failed_run() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![completed(RunResult::Failed)]);

        let execution = runner(api)
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        assert_eq!(execution.outcome.disposition, Disposition::Failed);
        assert_eq!(execution.outcome.disposition.exit_code(), 1);
        assert_eq!(execution.outcome.run.validation_results.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_pool_stops_before_connection() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new().with_queue(4, "Other");
        let runner = runner(api);

        let err = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::AgentPoolNotFound(ref name) if name == "Default"));
        let api = runner.api();
        assert_eq!(api.count("create_project"), 1);
        assert_eq!(api.count("find_service_endpoint"), 0);
        assert_eq!(api.count("create_service_endpoint"), 0);
        assert_eq!(api.count("create_pipeline"), 0);
        assert_eq!(api.count("run_pipeline"), 0);
    }

    #[tokio::test]
    async fn test_timed_out_run() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![run(1, RunStatus::InProgress, None)]);
        let runner = runner(api);

        let execution = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        assert_eq!(execution.outcome.disposition, Disposition::TimedOut);
        assert_eq!(execution.outcome.disposition.exit_code(), 1);
        let cancels: Vec<_> = runner
            .api()
            .invoked()
            .into_iter()
            .filter(|r| r.route == "build/builds/99")
            .collect();
        assert_eq!(cancels.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_creation_requires_github_token() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let api = FakeDevOps::new().with_queue(4, "Default");
        let runner = PipelineRunner::with_clock(api, FakeClock::new(), settings());

        let err = runner
            .execute(&request, &definition, &source())
            .await
            .unwrap_err();

        assert!(matches!(err, RunnerError::Config(_)));
        assert_eq!(runner.api().count("create_service_endpoint"), 0);
    }

    #[tokio::test]
    async fn test_records_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (request, definition) = definition(dir.path());
        let store_path = dir.path().join("config").join("defaults.toml");
        let api = FakeDevOps::new()
            .with_queue(4, "Default")
            .with_run_statuses(vec![completed(RunResult::Succeeded)]);

        runner(api)
            .record_defaults(DefaultsStore::at(&store_path), "https://dev.azure.com/acme")
            .execute(&request, &definition, &source())
            .await
            .unwrap();

        let defaults = DefaultsStore::at(&store_path).load().unwrap();
        assert_eq!(defaults.defaults.project.as_deref(), Some("ci-debug"));
        assert_eq!(
            defaults.defaults.organization.as_deref(),
            Some("https://dev.azure.com/acme")
        );
    }
}
