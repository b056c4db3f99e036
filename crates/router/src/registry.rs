//! Worker registry: the router's only shared mutable state.
//!
//! Workers are kept in registration order so that snapshots, and therefore
//! tie-breaking during ranking, are deterministic. Every mutation takes the
//! write lock; selections work on an owned [`RegistrySnapshot`].

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use asr_core::error::CoreError;
use asr_core::types::WorkerAddress;
use asr_core::worker::{
    validate_performance, validate_worker, Worker, WorkerPerformance, WorkerStatus,
};
use indexmap::IndexMap;

const ENTITY: &str = "worker";

/// Point-in-time copy of the registry, in registration order.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    workers: Vec<Worker>,
}

impl RegistrySnapshot {
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct WorkerRegistry {
    workers: RwLock<IndexMap<WorkerAddress, Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write leaves the map consistent, so poisoning is recovered.
    fn read(&self) -> RwLockReadGuard<'_, IndexMap<WorkerAddress, Worker>> {
        self.workers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<WorkerAddress, Worker>> {
        self.workers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a worker, replacing any entry with the same address.
    ///
    /// A replaced worker keeps its original position. Returns the previous
    /// entry, if there was one.
    pub fn register(&self, worker: Worker) -> Result<Option<Worker>, CoreError> {
        validate_worker(&worker)?;
        Ok(self.write().insert(worker.address.clone(), worker))
    }

    /// Remove a worker. Unknown addresses are a no-op.
    pub fn remove(&self, address: &str) -> Option<Worker> {
        self.write().shift_remove(address)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            workers: self.read().values().cloned().collect(),
        }
    }

    pub fn get(&self, address: &str) -> Option<Worker> {
        self.read().get(address).cloned()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.read().contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // -- Out-of-band updates --------------------------------------------------

    /// Replace a worker's performance figures (telemetry feed).
    pub fn update_performance(
        &self,
        address: &str,
        performance: WorkerPerformance,
    ) -> Result<(), CoreError> {
        validate_performance(&performance)?;
        self.with_worker(address, |worker| worker.performance = performance)
    }

    pub fn set_status(&self, address: &str, status: WorkerStatus) -> Result<(), CoreError> {
        self.with_worker(address, |worker| worker.status = status)
    }

    pub fn set_newcomer(&self, address: &str, is_newcomer: bool) -> Result<(), CoreError> {
        self.with_worker(address, |worker| worker.is_newcomer = is_newcomer)
    }

    fn with_worker<F>(&self, address: &str, update: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Worker),
    {
        let mut workers = self.write();
        let worker = workers.get_mut(address).ok_or_else(|| CoreError::NotFound {
            entity: ENTITY,
            id: address.to_string(),
        })?;
        update(worker);
        Ok(())
    }

    // -- Quota ----------------------------------------------------------------

    /// Add `amount` to a worker's `quota_used`, returning the new value.
    /// `None` if the worker is no longer registered.
    pub fn add_quota(&self, address: &str, amount: f64) -> Option<f64> {
        let mut workers = self.write();
        let worker = workers.get_mut(address)?;
        worker.quota_used += amount;
        Some(worker.quota_used)
    }

    /// Zero every worker's `quota_used`. Returns the number of workers reset.
    pub fn reset_quotas(&self) -> usize {
        let mut workers = self.write();
        for worker in workers.values_mut() {
            worker.quota_used = 0.0;
        }
        workers.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
