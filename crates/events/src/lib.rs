//! Router event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`RouterEvent`]: the event envelope.
//! - [`EventLogger`]: background service that mirrors events into `tracing`.
//! - [`names`]: the event type names the router publishes.

pub mod bus;
pub mod logger;
pub mod names;

pub use bus::{EventBus, RouterEvent};
pub use logger::EventLogger;
