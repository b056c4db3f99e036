//! Event type names published by the router.

/// A worker was inserted into (or replaced in) the registry.
pub const WORKER_REGISTERED: &str = "worker.registered";

/// A worker was removed from the registry.
pub const WORKER_REMOVED: &str = "worker.removed";

/// A job was assigned to a worker.
pub const JOB_ASSIGNED: &str = "job.assigned";

/// A selection produced no worker.
pub const JOB_UNASSIGNED: &str = "job.unassigned";

/// Every worker's quota was reset at an epoch boundary.
pub const EPOCH_RESET: &str = "epoch.reset";
