use reqwest::Method;
use serde_json::{json, Value};

use crate::error::Result;

use super::types::{
    AgentQueue, EndpointSpec, Pipeline, PipelineRun, PipelineSpec, Project, ProjectSpec, RunSpec,
    ServiceEndpoint,
};

pub(crate) const PIPELINE_PERMISSIONS_API_VERSION: &str = "7.1-preview.1";
pub(crate) const BUILDS_API_VERSION: &str = "7.1";

/// Raw request against an organization's REST API.
///
/// `route` is relative to `_apis/`. When `project` is set the route is
/// scoped to that project.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub project: Option<String>,
    pub route: String,
    pub api_version: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, route: impl Into<String>) -> Self {
        Self {
            method,
            project: None,
            route: route.into(),
            api_version: "7.1".to_string(),
            body: None,
        }
    }

    #[must_use]
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Control-plane operations the runner needs from the DevOps platform.
///
/// The typed methods cover what the platform's high-level API handles
/// directly. Pipeline authorization and run cancellation have no typed
/// counterpart there, so they are provided methods that go through the
/// generic [`DevOpsApi::invoke`] transport.
#[allow(async_fn_in_trait)]
pub trait DevOpsApi {
    async fn get_project(&self, name: &str) -> Result<Option<Project>>;

    async fn create_project(&self, spec: &ProjectSpec) -> Result<Project>;

    async fn find_queue(&self, project: &Project, pool_name: &str) -> Result<Option<AgentQueue>>;

    async fn find_service_endpoint(
        &self,
        project: &Project,
        name: &str,
    ) -> Result<Option<ServiceEndpoint>>;

    async fn create_service_endpoint(
        &self,
        project: &Project,
        spec: &EndpointSpec,
    ) -> Result<ServiceEndpoint>;

    async fn find_pipeline(&self, project: &Project, name: &str) -> Result<Option<Pipeline>>;

    async fn create_pipeline(&self, project: &Project, spec: &PipelineSpec) -> Result<Pipeline>;

    async fn run_pipeline(
        &self,
        project: &Project,
        pipeline_id: u64,
        spec: &RunSpec,
    ) -> Result<PipelineRun>;

    async fn get_run(&self, project: &Project, run_id: u64) -> Result<PipelineRun>;

    /// Sends an arbitrary request and returns the decoded JSON body, or
    /// `Value::Null` for an empty one.
    async fn invoke(&self, request: ApiRequest) -> Result<Value>;

    /// Marks `pipeline_id` as allowed to use the agent queue.
    async fn authorize_pipeline(
        &self,
        project: &Project,
        queue_id: u64,
        pipeline_id: u64,
    ) -> Result<()> {
        let request = ApiRequest::new(
            Method::PATCH,
            format!("pipelines/pipelinePermissions/queue/{queue_id}"),
        )
        .in_project(project.id.as_str())
        .api_version(PIPELINE_PERMISSIONS_API_VERSION)
        .body(json!({
            "pipelines": [{ "id": pipeline_id, "authorized": true }]
        }));

        self.invoke(request).await?;
        Ok(())
    }

    /// Requests cancellation of a run. Does not wait for it to stop.
    async fn cancel_run(&self, project: &Project, run_id: u64) -> Result<()> {
        let request = ApiRequest::new(Method::PATCH, format!("build/builds/{run_id}"))
            .in_project(project.id.as_str())
            .api_version(BUILDS_API_VERSION)
            .body(json!({ "status": "cancelling" }));

        self.invoke(request).await?;
        Ok(())
    }
}
