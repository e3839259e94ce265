//! In-memory [`DevOpsApi`] used by runner tests.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::api::{ApiRequest, DevOpsApi};
use super::types::{
    AgentQueue, EndpointSpec, Pipeline, PipelineRun, PipelineSpec, Project, ProjectSpec, RunSpec,
    RunStatus, ServiceEndpoint,
};
use crate::error::{Result, RunnerError};

#[derive(Default)]
struct State {
    projects: Vec<Project>,
    queues: Vec<AgentQueue>,
    endpoints: Vec<ServiceEndpoint>,
    pipelines: Vec<Pipeline>,
    run_statuses: VecDeque<PipelineRun>,
    last_run_spec: Option<RunSpec>,
    last_pipeline_spec: Option<PipelineSpec>,
    calls: Vec<String>,
    invoked: Vec<ApiRequest>,
    fail_invoke: bool,
}

#[derive(Default)]
pub(crate) struct FakeDevOps {
    state: Mutex<State>,
}

impl FakeDevOps {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_queue(self, id: u64, name: &str) -> Self {
        self.state.lock().unwrap().queues.push(AgentQueue {
            id,
            name: name.to_string(),
            pool: None,
        });
        self
    }

    /// Queues the responses `get_run` hands out, in order. The last one
    /// repeats once the queue is drained.
    pub(crate) fn with_run_statuses(self, runs: Vec<PipelineRun>) -> Self {
        self.state.lock().unwrap().run_statuses = runs.into();
        self
    }

    pub(crate) fn failing_invoke(self) -> Self {
        self.state.lock().unwrap().fail_invoke = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub(crate) fn invoked(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().invoked.clone()
    }

    pub(crate) fn last_run_spec(&self) -> Option<RunSpec> {
        self.state.lock().unwrap().last_run_spec.clone()
    }

    pub(crate) fn last_pipeline_spec(&self) -> Option<PipelineSpec> {
        self.state.lock().unwrap().last_pipeline_spec.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

pub(crate) fn run(id: u64, status: RunStatus, result: Option<super::types::RunResult>) -> PipelineRun {
    PipelineRun {
        id,
        build_number: None,
        status,
        result,
        validation_results: Vec::new(),
        links: None,
    }
}

impl DevOpsApi for FakeDevOps {
    async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        self.record("get_project");
        let state = self.state.lock().unwrap();
        Ok(state.projects.iter().find(|p| p.name == name).cloned())
    }

    async fn create_project(&self, spec: &ProjectSpec) -> Result<Project> {
        self.record("create_project");
        let mut state = self.state.lock().unwrap();
        let project = Project {
            id: format!("project-{}", state.projects.len() + 1),
            name: spec.name.clone(),
            state: Some("wellFormed".to_string()),
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn find_queue(&self, _project: &Project, pool_name: &str) -> Result<Option<AgentQueue>> {
        self.record("find_queue");
        let state = self.state.lock().unwrap();
        Ok(state.queues.iter().find(|q| q.name == pool_name).cloned())
    }

    async fn find_service_endpoint(
        &self,
        _project: &Project,
        name: &str,
    ) -> Result<Option<ServiceEndpoint>> {
        self.record("find_service_endpoint");
        let state = self.state.lock().unwrap();
        Ok(state.endpoints.iter().find(|e| e.name == name).cloned())
    }

    async fn create_service_endpoint(
        &self,
        _project: &Project,
        spec: &EndpointSpec,
    ) -> Result<ServiceEndpoint> {
        self.record("create_service_endpoint");
        let mut state = self.state.lock().unwrap();
        let endpoint = ServiceEndpoint {
            id: format!("endpoint-{}", state.endpoints.len() + 1),
            name: spec.name.clone(),
            kind: "github".to_string(),
            url: Some(spec.url.clone()),
        };
        state.endpoints.push(endpoint.clone());
        Ok(endpoint)
    }

    async fn find_pipeline(&self, _project: &Project, name: &str) -> Result<Option<Pipeline>> {
        self.record("find_pipeline");
        let state = self.state.lock().unwrap();
        Ok(state.pipelines.iter().find(|p| p.name == name).cloned())
    }

    async fn create_pipeline(&self, _project: &Project, spec: &PipelineSpec) -> Result<Pipeline> {
        self.record("create_pipeline");
        let mut state = self.state.lock().unwrap();
        state.last_pipeline_spec = Some(spec.clone());
        let pipeline = Pipeline {
            id: state.pipelines.len() as u64 + 10,
            name: spec.name.clone(),
            path: Some("\\".to_string()),
        };
        state.pipelines.push(pipeline.clone());
        Ok(pipeline)
    }

    async fn run_pipeline(
        &self,
        _project: &Project,
        _pipeline_id: u64,
        spec: &RunSpec,
    ) -> Result<PipelineRun> {
        self.record("run_pipeline");
        self.state.lock().unwrap().last_run_spec = Some(spec.clone());
        Ok(run(99, RunStatus::NotStarted, None))
    }

    async fn get_run(&self, _project: &Project, run_id: u64) -> Result<PipelineRun> {
        self.record("get_run");
        let mut state = self.state.lock().unwrap();
        let next = if state.run_statuses.len() > 1 {
            state.run_statuses.pop_front()
        } else {
            state.run_statuses.front().cloned()
        };
        next.map(|mut r| {
            r.id = run_id;
            r
        })
        .ok_or_else(|| RunnerError::Api {
            status: 404,
            message: format!("run {run_id} not found"),
        })
    }

    async fn invoke(&self, request: ApiRequest) -> Result<Value> {
        self.record("invoke");
        let mut state = self.state.lock().unwrap();
        state.invoked.push(request);
        if state.fail_invoke {
            return Err(RunnerError::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(Value::Null)
    }
}
