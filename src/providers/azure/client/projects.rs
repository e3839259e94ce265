use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::transport::AzureDevOpsClient;
use crate::config::Visibility;
use crate::error::{Result, RunnerError};
use crate::poll::{Clock, PollPolicy};
use crate::providers::azure::types::{Project, ProjectSpec};

const PROJECTS_API_VERSION: &str = "7.1";
const OPERATIONS_API_VERSION: &str = "7.1";

/// Project creation is queued server-side; this bounds the wait for it.
pub(super) const PROJECT_CREATION_POLICY: PollPolicy =
    PollPolicy::new(Duration::from_secs(2), Duration::from_secs(120));

#[derive(Debug, Deserialize)]
struct OperationReference {
    id: String,
    #[serde(default)]
    status: OperationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
enum OperationStatus {
    #[default]
    NotSet,
    Queued,
    InProgress,
    Cancelled,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AzureDevOpsClient {
    pub(super) async fn fetch_project(&self, name: &str) -> Result<Option<Project>> {
        let url = self.api_url(None, &["projects", name], PROJECTS_API_VERSION, &[])?;
        self.send_optional(self.request(Method::GET, url)).await
    }

    pub(super) async fn post_project(
        &self,
        spec: &ProjectSpec,
        policy: PollPolicy,
        clock: &impl Clock,
    ) -> Result<Project> {
        let url = self.api_url(None, &["projects"], PROJECTS_API_VERSION, &[])?;
        let visibility = match spec.visibility {
            Visibility::Private => "private",
            Visibility::Public => "public",
        };
        let body = json!({
            "name": spec.name,
            "description": spec.description,
            "visibility": visibility,
            "capabilities": {
                "versioncontrol": { "sourceControlType": "Git" },
                "processTemplate": { "templateTypeId": spec.process_template_id }
            }
        });

        let operation: OperationReference = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        info!("Project creation queued as operation {}", operation.id);

        self.wait_for_operation(operation, policy, clock).await?;

        self.fetch_project(&spec.name).await?.ok_or_else(|| RunnerError::Api {
            status: 404,
            message: format!("Project {} not found after creation", spec.name),
        })
    }

    async fn wait_for_operation(
        &self,
        mut operation: OperationReference,
        policy: PollPolicy,
        clock: &impl Clock,
    ) -> Result<()> {
        let start = clock.now();
        loop {
            match operation.status {
                OperationStatus::Succeeded => return Ok(()),
                OperationStatus::Failed | OperationStatus::Cancelled => {
                    return Err(RunnerError::OperationFailed {
                        id: operation.id,
                        status: format!("{:?}", operation.status).to_lowercase(),
                    });
                }
                status => debug!("Operation {} is {status:?}", operation.id),
            }

            if policy.expired(clock.now() - start) {
                return Err(RunnerError::OperationFailed {
                    id: operation.id,
                    status: "timed out".to_string(),
                });
            }
            clock.sleep(policy.interval()).await;

            let url = self.api_url(
                None,
                &["operations", operation.id.as_str()],
                OPERATIONS_API_VERSION,
                &[],
            )?;
            operation = self.send_json(self.request(Method::GET, url)).await?;
        }
    }
}
