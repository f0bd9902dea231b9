//! # Activity Log Sink
//!
//! Writes domain events as structured `tracing` events under the
//! `kasir::activity` target, where the subscriber can route them to the
//! activity log.

use kasir_core::{DomainEvent, EventSink};
use tracing::{info, warn};

/// Tracing target of activity log entries.
pub const ACTIVITY_TARGET: &str = "kasir::activity";

/// [`EventSink`] that logs every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &DomainEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => info!(target: ACTIVITY_TARGET, event = event.name(), %payload, "activity"),
            Err(e) => warn!(event = event.name(), error = %e, "Failed to serialize activity event"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use kasir_core::{DomainEvent, EventSink};

    /// Keeps every emitted event for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl RecordingSink {
        pub fn names(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.name()).collect()
        }

        pub fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &DomainEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
