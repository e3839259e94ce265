use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

use crate::providers::azure::RunStatus;

use super::styling::{bright_green, bright_red, bright_yellow};

/// Spinner shown while a run is being polled.
pub struct PollProgress {
    pb: ProgressBar,
}

impl PollProgress {
    pub fn start(run_id: u64, visible: bool) -> Self {
        let pb = if visible {
            let pb = ProgressBar::new_spinner();
            pb.set_draw_target(ProgressDrawTarget::stderr());
            pb
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(bright_yellow(format!("Waiting for run {run_id}")).to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    pub fn update(&self, run_id: u64, status: RunStatus, elapsed: Duration) {
        self.pb.set_message(
            bright_yellow(format!(
                "Run {run_id} is {} ({}s elapsed)",
                status_label(status),
                elapsed.as_secs()
            ))
            .to_string(),
        );
    }

    pub fn finish_success(&self, message: &str) {
        self.pb
            .finish_with_message(bright_green(format!("{message} ✓")).to_string());
    }

    pub fn finish_failure(&self, message: &str) {
        self.pb
            .finish_with_message(bright_red(format!("{message} ✗")).to_string());
    }
}

pub fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::NotStarted => "notStarted",
        RunStatus::InProgress => "inProgress",
        RunStatus::Cancelling => "cancelling",
        RunStatus::Postponed => "postponed",
        RunStatus::Completed => "completed",
        RunStatus::Unknown => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_match_wire_names() {
        for status in [
            RunStatus::NotStarted,
            RunStatus::InProgress,
            RunStatus::Cancelling,
            RunStatus::Postponed,
            RunStatus::Completed,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire.as_str(), Some(status_label(status)));
        }
    }

    #[test]
    fn test_hidden_progress_accepts_updates() {
        let progress = PollProgress::start(1, false);
        progress.update(1, RunStatus::InProgress, Duration::from_secs(5));
        progress.finish_success("done");
    }
}
