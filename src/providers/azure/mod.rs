mod api;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod types;

pub use api::DevOpsApi;
pub use client::AzureDevOpsClient;
pub use types::{
    AgentQueue, EndpointSpec, Pipeline, PipelineRun, PipelineSpec, Project, ProjectSpec, RunResult,
    RunSpec, RunStatus, ServiceEndpoint, ValidationLevel, ValidationResult,
};
