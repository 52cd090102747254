//! Audit events and sinks.
//!
//! Security-relevant decisions, such as a caller reaching for a repository
//! they do not own, are recorded as structured events. The production sink
//! forwards them to `tracing` under the `repogate::audit` target so they can
//! be filtered or shipped separately from request logs.

use serde::{Deserialize, Serialize};

/// Log target carrying audit events.
pub const AUDIT_TARGET: &str = "repogate::audit";

/// A structured audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// A caller targeted a repository owned by someone else.
    OwnershipRejected {
        /// Internal user id of the caller.
        user_id: String,
        /// GitHub login linked to the caller.
        github_username: String,
        /// The `owner/repo` that was requested.
        repository: String,
        /// Endpoint that was invoked.
        endpoint: String,
    },
}

/// A sink that can record audit events.
pub trait TelemetrySink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: TelemetryEvent);
}

/// Emits events as `warn` records on [`AUDIT_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::OwnershipRejected {
                user_id,
                github_username,
                repository,
                endpoint,
            } => tracing::warn!(
                target: AUDIT_TARGET,
                %user_id,
                %github_username,
                %repository,
                %endpoint,
                "ownership check rejected request"
            ),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingTelemetrySink;

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use std::sync::Mutex;

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps events in memory for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingTelemetrySink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingTelemetrySink {
        /// Drains the recorded events.
        #[must_use]
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .map(|mut events| events.drain(..).collect())
                .unwrap_or_default()
        }
    }

    impl TelemetrySink for RecordingTelemetrySink {
        fn record(&self, event: TelemetryEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
        }
    }
}
