use log::{debug, info, warn};

use crate::error::Result;
use crate::output::PollProgress;
use crate::poll::{Clock, PollPolicy};
use crate::providers::azure::{DevOpsApi, Project};

use super::{Disposition, RunOutcome};

/// Polls a run until it completes or `policy` runs out.
///
/// On timeout a single cancellation is requested; its failure is logged
/// and does not change the outcome. Polling errors are not retried.
pub(super) async fn watch_run(
    api: &impl DevOpsApi,
    clock: &impl Clock,
    policy: PollPolicy,
    project: &Project,
    run_id: u64,
    progress: &PollProgress,
) -> Result<RunOutcome> {
    let start = clock.now();

    loop {
        let run = api.get_run(project, run_id).await?;
        let elapsed = clock.now() - start;
        debug!("Run {run_id} status {:?} after {}s", run.status, elapsed.as_secs());

        if run.status.is_completed() {
            let disposition = if run.succeeded() {
                progress.finish_success(&format!("Run {run_id} completed"));
                Disposition::Succeeded
            } else {
                progress.finish_failure(&format!("Run {run_id} completed"));
                Disposition::Failed
            };
            info!("Run {run_id} completed with result {:?}", run.result);
            return Ok(RunOutcome {
                run,
                disposition,
                elapsed,
            });
        }

        progress.update(run_id, run.status, elapsed);

        if policy.expired(elapsed) {
            warn!(
                "Run {run_id} did not complete within {}s, requesting cancellation",
                policy.timeout().as_secs()
            );
            if let Err(err) = api.cancel_run(project, run_id).await {
                warn!("Cancellation request for run {run_id} failed: {err}");
            }
            progress.finish_failure(&format!("Run {run_id} timed out"));
            return Ok(RunOutcome {
                run,
                disposition: Disposition::TimedOut,
                elapsed,
            });
        }

        clock.sleep(policy.interval()).await;
    }
}
