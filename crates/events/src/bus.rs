//! Router events and the broadcast bus that carries them.
//!
//! The router and the dispatch binary share one `Arc<EventBus>`. Sending
//! never waits on listeners.

use asr_core::types::{JobId, WorkerAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// RouterEvent
// ---------------------------------------------------------------------------

/// A registry change, an assignment outcome or an epoch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterEvent {
    /// Dot-separated event name, e.g. `"job.assigned"`.
    pub event_type: String,

    /// Address of the worker the event concerns, if any.
    pub worker_address: Option<WorkerAddress>,

    /// Job the event concerns, if any.
    pub job_id: Option<JobId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl RouterEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            worker_address: None,
            job_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_worker(mut self, address: impl Into<WorkerAddress>) -> Self {
        self.worker_address = Some(address.into());
        self
    }

    pub fn with_job(mut self, job_id: impl Into<JobId>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Capacity used by [`EventBus::default`]. A listener that falls this many
/// events behind skips ahead and sees `RecvError::Lagged`.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out of [`RouterEvent`]s to every listener subscribed at send time.
///
/// ```rust
/// use asr_events::bus::{EventBus, RouterEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// assert_eq!(bus.publish(RouterEvent::new("epoch.reset")), 1);
/// assert_eq!(rx.try_recv().map(|e| e.event_type).ok().as_deref(), Some("epoch.reset"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<RouterEvent>,
}

impl EventBus {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Send `event` to the current listeners and return how many got it.
    /// With no listeners the event is dropped and `0` is returned.
    pub fn publish(&self, event: RouterEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
