use log::info;
use std::future::Future;

use crate::auth::Token;
use crate::error::{Result, RunnerError};
use crate::git::SourceInfo;
use crate::providers::azure::{
    AgentQueue, DevOpsApi, EndpointSpec, Pipeline, PipelineSpec, Project, ProjectSpec,
    ServiceEndpoint,
};

/// Looks a resource up by name and creates it only when absent.
///
/// An existing resource is returned untouched, whatever its configuration.
async fn ensure<T, Find, Create, CreateFut>(
    kind: &str,
    name: &str,
    find: Find,
    create: Create,
) -> Result<T>
where
    Find: Future<Output = Result<Option<T>>>,
    Create: FnOnce() -> CreateFut,
    CreateFut: Future<Output = Result<T>>,
{
    if let Some(existing) = find.await? {
        info!("{kind} {name} already exists, reusing");
        return Ok(existing);
    }

    info!("Creating {kind} {name}");
    let created = create().await?;
    info!("Created {kind} {name}");
    Ok(created)
}

pub(super) async fn ensure_project(api: &impl DevOpsApi, spec: &ProjectSpec) -> Result<Project> {
    ensure("Project", &spec.name, api.get_project(&spec.name), || {
        api.create_project(spec)
    })
    .await
}

pub(super) async fn lookup_queue(
    api: &impl DevOpsApi,
    project: &Project,
    pool_name: &str,
) -> Result<AgentQueue> {
    let queue = api
        .find_queue(project, pool_name)
        .await?
        .ok_or_else(|| RunnerError::AgentPoolNotFound(pool_name.to_string()))?;

    info!("Using agent pool {pool_name} (queue {})", queue.id);
    Ok(queue)
}

pub(super) async fn ensure_service_connection(
    api: &impl DevOpsApi,
    project: &Project,
    source: &SourceInfo,
    github_token: Option<&Token>,
) -> Result<ServiceEndpoint> {
    let name = project.name.as_str();
    ensure(
        "Service connection",
        name,
        api.find_service_endpoint(project, name),
        || async move {
            let token = github_token.ok_or_else(|| {
                RunnerError::Config(
                    "A GitHub token is required to create the service connection".to_string(),
                )
            })?;
            let spec = EndpointSpec {
                name: name.to_string(),
                url: source.repository.url(),
                token: token.clone(),
            };
            api.create_service_endpoint(project, &spec).await
        },
    )
    .await
}

pub(super) async fn ensure_pipeline(
    api: &impl DevOpsApi,
    project: &Project,
    spec: &PipelineSpec,
) -> Result<Pipeline> {
    ensure(
        "Pipeline",
        &spec.name,
        api.find_pipeline(project, &spec.name),
        || api.create_pipeline(project, spec),
    )
    .await
}
