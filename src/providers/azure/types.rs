use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::auth::Token;
use crate::config::Visibility;
use crate::git::GitHubRepository;

/// Azure DevOps team project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Parameters for a project that does not exist yet.
#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
    pub process_template_id: String,
}

/// Project-scoped handle on an agent pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentQueue {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub pool: Option<PoolReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolReference {
    pub id: u64,
    pub name: String,
}

/// Service connection (service endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Parameters for a GitHub service connection.
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub name: String,
    pub url: String,
    pub token: Token,
}

/// Pipeline (build definition) reference.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Parameters for a YAML pipeline backed by a GitHub repository.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,
    pub yaml_path: String,
    pub repository: GitHubRepository,
    pub connection_id: String,
    pub branch: String,
}

/// Parameters for queueing a run.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub ref_name: String,
    pub commit: String,
    pub template_parameters: IndexMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    NotStarted,
    InProgress,
    #[serde(alias = "canceling")]
    Cancelling,
    Postponed,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunResult {
    Succeeded,
    PartiallySucceeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationLevel {
    Ok,
    Warning,
    Error,
    #[serde(other)]
    Unknown,
}

/// Pre-execution check reported by the platform for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub result: ValidationLevel,
    #[serde(default)]
    pub message: String,
}

/// A single run of a pipeline, as reported by the build API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: u64,
    #[serde(default)]
    pub build_number: Option<String>,
    #[serde(default)]
    pub status: RunStatus,
    #[serde(default)]
    pub result: Option<RunResult>,
    #[serde(default)]
    pub validation_results: Vec<ValidationResult>,
    #[serde(rename = "_links", default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl PipelineRun {
    pub fn succeeded(&self) -> bool {
        self.status.is_completed() && self.result == Some(RunResult::Succeeded)
    }

    pub fn web_url(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.web.as_ref())
            .map(|web| web.href.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub web: Option<Href>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
    pub href: String,
}
