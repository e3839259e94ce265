use reqwest::Method;
use serde_json::json;

use super::transport::{AzureDevOpsClient, ListResponse};
use crate::error::Result;
use crate::providers::azure::types::{AgentQueue, EndpointSpec, Project, ServiceEndpoint};

const SERVICE_ENDPOINTS_API_VERSION: &str = "7.1-preview.4";
const QUEUES_API_VERSION: &str = "7.1-preview.1";

impl AzureDevOpsClient {
    pub(super) async fn fetch_queue(
        &self,
        project: &Project,
        pool_name: &str,
    ) -> Result<Option<AgentQueue>> {
        let url = self.api_url(
            Some(project.id.as_str()),
            &["distributedtask", "queues"],
            QUEUES_API_VERSION,
            &[("queueName", pool_name)],
        )?;
        let queues: ListResponse<AgentQueue> =
            self.send_json(self.request(Method::GET, url)).await?;

        Ok(queues.value.into_iter().find(|queue| queue.name == pool_name))
    }

    pub(super) async fn fetch_service_endpoint(
        &self,
        project: &Project,
        name: &str,
    ) -> Result<Option<ServiceEndpoint>> {
        let url = self.api_url(
            Some(project.id.as_str()),
            &["serviceendpoint", "endpoints"],
            SERVICE_ENDPOINTS_API_VERSION,
            &[("endpointNames", name)],
        )?;
        let endpoints: ListResponse<ServiceEndpoint> =
            self.send_json(self.request(Method::GET, url)).await?;

        Ok(endpoints
            .value
            .into_iter()
            .find(|endpoint| endpoint.name == name))
    }

    pub(super) async fn post_github_endpoint(
        &self,
        project: &Project,
        spec: &EndpointSpec,
    ) -> Result<ServiceEndpoint> {
        let url = self.api_url(
            None,
            &["serviceendpoint", "endpoints"],
            SERVICE_ENDPOINTS_API_VERSION,
            &[],
        )?;
        let body = json!({
            "name": spec.name,
            "type": "github",
            "url": spec.url,
            "authorization": {
                "scheme": "PersonalAccessToken",
                "parameters": { "accessToken": spec.token.as_str() }
            },
            "isShared": false,
            "serviceEndpointProjectReferences": [{
                "name": spec.name,
                "projectReference": { "id": project.id, "name": project.name }
            }]
        });

        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }
}
