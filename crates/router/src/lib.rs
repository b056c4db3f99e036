//! Auto-Selection Router: picks one worker from the fleet for each job.
//!
//! - [`WorkerRegistry`]: the set of known workers, keyed by address.
//! - [`SelectionPipeline`]: filter, score, rank, prune, explore, sample.
//! - [`QuotaEpochManager`]: per-epoch quota charges and resets.
//! - [`AsrRouter`]: the facade tying them together, with events and tracing.

pub mod error;
pub mod pipeline;
pub mod quota;
pub mod registry;
pub mod router;

pub use error::SelectionError;
pub use pipeline::{Selection, SelectionPipeline, Shortlist};
pub use quota::QuotaEpochManager;
pub use registry::{RegistrySnapshot, WorkerRegistry};
pub use router::AsrRouter;
