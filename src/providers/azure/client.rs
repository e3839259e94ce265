mod endpoints;
mod pipelines;
mod projects;
mod transport;

use serde_json::Value;

pub use transport::AzureDevOpsClient;

use super::api::{ApiRequest, DevOpsApi};
use super::types::{
    AgentQueue, EndpointSpec, Pipeline, PipelineRun, PipelineSpec, Project, ProjectSpec, RunSpec,
    ServiceEndpoint,
};
use crate::error::Result;
use crate::poll::SystemClock;

impl DevOpsApi for AzureDevOpsClient {
    async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        self.fetch_project(name).await
    }

    async fn create_project(&self, spec: &ProjectSpec) -> Result<Project> {
        self.post_project(spec, projects::PROJECT_CREATION_POLICY, &SystemClock)
            .await
    }

    async fn find_queue(&self, project: &Project, pool_name: &str) -> Result<Option<AgentQueue>> {
        self.fetch_queue(project, pool_name).await
    }

    async fn find_service_endpoint(
        &self,
        project: &Project,
        name: &str,
    ) -> Result<Option<ServiceEndpoint>> {
        self.fetch_service_endpoint(project, name).await
    }

    async fn create_service_endpoint(
        &self,
        project: &Project,
        spec: &EndpointSpec,
    ) -> Result<ServiceEndpoint> {
        self.post_github_endpoint(project, spec).await
    }

    async fn find_pipeline(&self, project: &Project, name: &str) -> Result<Option<Pipeline>> {
        self.fetch_pipeline(project, name).await
    }

    async fn create_pipeline(&self, project: &Project, spec: &PipelineSpec) -> Result<Pipeline> {
        self.post_pipeline(project, spec).await
    }

    async fn run_pipeline(
        &self,
        project: &Project,
        pipeline_id: u64,
        spec: &RunSpec,
    ) -> Result<PipelineRun> {
        self.post_run(project, pipeline_id, spec).await
    }

    async fn get_run(&self, project: &Project, run_id: u64) -> Result<PipelineRun> {
        self.fetch_run(project, run_id).await
    }

    async fn invoke(&self, request: ApiRequest) -> Result<Value> {
        let segments: Vec<&str> = request.route.split('/').collect();
        let url = self.api_url(
            request.project.as_deref(),
            &segments,
            &request.api_version,
            &[],
        )?;

        let mut builder = self.request(request.method, url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        self.send_value(builder).await
    }
}
