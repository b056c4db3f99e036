//! Per-epoch quota bookkeeping.
//!
//! Each consuming selection charges the winner `1 / N`, where N is the size of
//! the whole registry at the time of the call (not the eligible or top-K set).
//! The epoch scheduler calls [`QuotaEpochManager::reset_epoch`] at every
//! boundary; there is no internal timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::registry::WorkerRegistry;

pub struct QuotaEpochManager {
    registry: Arc<WorkerRegistry>,
    epoch: AtomicU64,
}

impl QuotaEpochManager {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self {
            registry,
            epoch: AtomicU64::new(0),
        }
    }

    /// Charge the winner of a selection.
    ///
    /// Returns the worker's new `quota_used`, or `None` if `registry_size` is
    /// zero or the worker was removed after the snapshot was taken.
    pub fn record_selection(&self, address: &str, registry_size: usize) -> Option<f64> {
        if registry_size == 0 {
            return None;
        }
        let charge = 1.0 / registry_size as f64;
        let quota_used = self.registry.add_quota(address, charge);
        if quota_used.is_none() {
            tracing::warn!(
                worker = address,
                "Selected worker left the registry before its quota was charged"
            );
        }
        quota_used
    }

    /// Zero every worker's quota and advance the epoch counter.
    ///
    /// Returns the number of workers reset.
    pub fn reset_epoch(&self) -> usize {
        let reset = self.registry.reset_quotas();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(epoch, workers = reset, "Epoch quotas reset");
        reset
    }

    /// Number of resets performed since construction.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}
