//! Event log service.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and mirrors every received [`RouterEvent`] into the
//! `tracing` output. It runs as a long-lived background task and shuts down
//! when the bus is dropped.

use tokio::sync::broadcast;

use crate::bus::RouterEvent;

/// Background service that logs router events.
pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop until the channel closes.
    ///
    /// Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<RouterEvent>) -> u64 {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        worker = event.worker_address.as_deref().unwrap_or("-"),
                        job_id = event.job_id.as_deref().unwrap_or("-"),
                        payload = %event.payload,
                        "Router event"
                    );
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }
}
