use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::azure::{RunResult, RunStatus, ValidationResult};
use crate::runner::{Disposition, Execution};

/// Machine-readable record of one invocation, written with `--output`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub project: String,
    pub pipeline: String,
    pub pipeline_id: u64,
    pub queue_id: u64,
    pub service_connection_id: String,
    pub run_id: u64,
    pub status: RunStatus,
    pub result: Option<RunResult>,
    pub outcome: Disposition,
    pub validation_results: Vec<ValidationResult>,
    pub web_url: Option<String>,
    pub elapsed_secs: u64,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn from_execution(execution: &Execution) -> Self {
        let run = &execution.outcome.run;
        Self {
            project: execution.project.name.clone(),
            pipeline: execution.pipeline.name.clone(),
            pipeline_id: execution.pipeline.id,
            queue_id: execution.queue.id,
            service_connection_id: execution.endpoint.id.clone(),
            run_id: run.id,
            status: run.status,
            result: run.result,
            outcome: execution.outcome.disposition,
            validation_results: run.validation_results.clone(),
            web_url: run.web_url().map(ToString::to_string),
            elapsed_secs: execution.outcome.elapsed.as_secs(),
            finished_at: Utc::now(),
        }
    }
}
