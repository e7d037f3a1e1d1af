//! Prometheus metrics for registration activity.
//!
//! Metric macros are no-ops until a recorder is installed, so the engine
//! records unconditionally and binaries decide whether to install
//! [`MetricsRecorder`].
//!
//! # Example
//!
//! ```rust,no_run
//! use activity_registration::metrics::MetricsRecorder;
//!
//! let mut recorder = MetricsRecorder::new();
//! recorder.install().unwrap();
//! println!("{}", recorder.render().unwrap_or_default());
//! ```

use crate::error::RegistrationError;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Label used for requests naming an activity outside the catalog
const UNKNOWN_ACTIVITY: &str = "unknown";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder with text rendering.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that is not installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if the exporter cannot be installed.
    ///
    /// # Note
    ///
    /// If a metrics recorder is already installed (e.g., in tests), this
    /// logs a warning and leaves the recorder without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus text format.
    ///
    /// Returns `None` if the recorder hasn't been installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "registration_signups_total",
        "Registration attempts by activity and outcome"
    );
    describe_counter!(
        "registration_withdrawals_total",
        "Withdrawal attempts by activity and outcome"
    );
    describe_counter!(
        "registration_resets_total",
        "Number of full roster resets"
    );
    describe_gauge!(
        "registration_roster_size",
        "Participants currently registered per activity"
    );
}

fn labels(activity: &str, outcome: Result<(), &RegistrationError>) -> (String, &'static str) {
    match outcome {
        Ok(()) => (activity.to_string(), "success"),
        Err(RegistrationError::NotFound { .. }) => (UNKNOWN_ACTIVITY.to_string(), "not_found"),
        Err(error) => (activity.to_string(), error.kind()),
    }
}

/// Record a registration attempt.
pub fn record_signup(activity: &str, outcome: Result<(), &RegistrationError>) {
    let (activity, outcome) = labels(activity, outcome);
    counter!("registration_signups_total", "activity" => activity, "outcome" => outcome).increment(1);
}

/// Record a withdrawal attempt.
pub fn record_withdrawal(activity: &str, outcome: Result<(), &RegistrationError>) {
    let (activity, outcome) = labels(activity, outcome);
    counter!("registration_withdrawals_total", "activity" => activity, "outcome" => outcome).increment(1);
}

/// Record a full reset.
pub fn record_reset() {
    counter!("registration_resets_total").increment(1);
}

/// Record the current size of a roster.
#[allow(clippy::cast_precision_loss)] // Roster sizes are far below f64 precision
pub fn record_roster_size(activity: &str, size: usize) {
    gauge!("registration_roster_size", "activity" => activity.to_string()).set(size as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityName;

    #[test]
    fn test_unknown_activities_share_a_label() {
        let error = RegistrationError::NotFound {
            activity: ActivityName::from("Made Up"),
        };
        assert_eq!(labels("Made Up", Err(&error)), ("unknown".to_string(), "not_found"));
        assert_eq!(labels("Chess Club", Ok(())), ("Chess Club".to_string(), "success"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_signup("Chess Club", Ok(()));
        record_reset();
        record_roster_size("Chess Club", 3);
        assert!(MetricsRecorder::new().render().is_none());
    }
}
