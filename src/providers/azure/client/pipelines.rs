use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use super::transport::{AzureDevOpsClient, ListResponse};
use crate::error::Result;
use crate::providers::azure::api::BUILDS_API_VERSION;
use crate::providers::azure::types::{
    Links, Pipeline, PipelineRun, PipelineSpec, Project, RunResult, RunSpec, RunStatus,
};

const DEFINITIONS_API_VERSION: &str = "7.1";
const PIPELINES_API_VERSION: &str = "7.1";

/// Run as returned by the pipelines API, which names the status `state`.
#[derive(Debug, Deserialize)]
struct QueuedRun {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: RunStatus,
    #[serde(default)]
    result: Option<RunResult>,
    #[serde(rename = "_links", default)]
    links: Option<Links>,
}

impl From<QueuedRun> for PipelineRun {
    fn from(run: QueuedRun) -> Self {
        Self {
            id: run.id,
            build_number: run.name,
            status: run.state,
            result: run.result,
            validation_results: Vec::new(),
            links: run.links,
        }
    }
}

impl AzureDevOpsClient {
    pub(super) async fn fetch_pipeline(
        &self,
        project: &Project,
        name: &str,
    ) -> Result<Option<Pipeline>> {
        let url = self.api_url(
            Some(project.id.as_str()),
            &["build", "definitions"],
            DEFINITIONS_API_VERSION,
            &[("name", name)],
        )?;
        let definitions: ListResponse<Pipeline> =
            self.send_json(self.request(Method::GET, url)).await?;

        Ok(definitions
            .value
            .into_iter()
            .find(|definition| definition.name == name))
    }

    pub(super) async fn post_pipeline(
        &self,
        project: &Project,
        spec: &PipelineSpec,
    ) -> Result<Pipeline> {
        let url = self.api_url(
            Some(project.id.as_str()),
            &["build", "definitions"],
            DEFINITIONS_API_VERSION,
            &[],
        )?;
        let body = json!({
            "name": spec.name,
            "path": "\\",
            "type": "build",
            "queueStatus": "enabled",
            "process": { "type": 2, "yamlFilename": spec.yaml_path },
            "repository": {
                "type": "GitHub",
                "id": spec.repository.full_name(),
                "name": spec.repository.full_name(),
                "url": format!("{}.git", spec.repository.url()),
                "defaultBranch": format!("refs/heads/{}", spec.branch),
                "properties": { "connectedServiceId": spec.connection_id }
            }
        });

        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }

    pub(super) async fn post_run(
        &self,
        project: &Project,
        pipeline_id: u64,
        spec: &RunSpec,
    ) -> Result<PipelineRun> {
        let pipeline_id = pipeline_id.to_string();
        let url = self.api_url(
            Some(project.id.as_str()),
            &["pipelines", pipeline_id.as_str(), "runs"],
            PIPELINES_API_VERSION,
            &[],
        )?;
        let body = json!({
            "resources": {
                "repositories": {
                    "self": { "refName": spec.ref_name, "version": spec.commit }
                }
            },
            "templateParameters": spec.template_parameters
        });

        let run: QueuedRun = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(run.into())
    }

    pub(super) async fn fetch_run(&self, project: &Project, run_id: u64) -> Result<PipelineRun> {
        let run_id = run_id.to_string();
        let url = self.api_url(
            Some(project.id.as_str()),
            &["build", "builds", run_id.as_str()],
            BUILDS_API_VERSION,
            &[],
        )?;
        self.send_json(self.request(Method::GET, url)).await
    }
}
