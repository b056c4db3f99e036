//! The Auto-Selection Router facade.
//!
//! [`AsrRouter`] owns the registry, the quota manager, the random source and
//! an event bus. A selection snapshots the registry, runs the
//! [`SelectionPipeline`] against the snapshot and, for quota-consuming picks,
//! charges the winner through the [`QuotaEpochManager`].

use std::sync::{Arc, Mutex, PoisonError};

use asr_core::config::RouterConfig;
use asr_core::error::CoreError;
use asr_core::random::RandomSource;
use asr_core::worker::{Job, Worker};
use asr_events::{names, EventBus, RouterEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::broadcast;

use crate::error::SelectionError;
use crate::pipeline::{Selection, SelectionPipeline};
use crate::quota::QuotaEpochManager;
use crate::registry::WorkerRegistry;

pub struct AsrRouter<R = StdRng> {
    config: RouterConfig,
    registry: Arc<WorkerRegistry>,
    quotas: QuotaEpochManager,
    rng: Mutex<R>,
    events: Arc<EventBus>,
}

impl AsrRouter<StdRng> {
    /// Create a router with an OS-seeded random source.
    pub fn new(config: RouterConfig) -> Result<Self, CoreError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: RandomSource> AsrRouter<R> {
    /// Create a router with an explicit random source. The configuration is
    /// validated here and treated as trusted afterwards.
    pub fn with_rng(config: RouterConfig, rng: R) -> Result<Self, CoreError> {
        config.validate()?;
        let registry = Arc::new(WorkerRegistry::new());
        Ok(Self {
            quotas: QuotaEpochManager::new(Arc::clone(&registry)),
            registry,
            config,
            rng: Mutex::new(rng),
            events: Arc::new(EventBus::default()),
        })
    }

    /// Publish events on a shared bus instead of the router's own.
    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The registry, for the telemetry feed and status updates.
    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    // -- Registry -------------------------------------------------------------

    pub fn register_worker(&self, worker: Worker) -> Result<(), CoreError> {
        let address = worker.address.clone();
        let replaced = self.registry.register(worker)?.is_some();
        tracing::debug!(worker = %address, replaced, "Worker registered");
        self.events.publish(
            RouterEvent::new(names::WORKER_REGISTERED)
                .with_worker(address)
                .with_payload(json!({ "replaced": replaced })),
        );
        Ok(())
    }

    /// Returns `true` if a worker was removed.
    pub fn remove_worker(&self, address: &str) -> bool {
        let removed = self.registry.remove(address).is_some();
        if removed {
            tracing::debug!(worker = address, "Worker removed");
            self.events
                .publish(RouterEvent::new(names::WORKER_REMOVED).with_worker(address));
        }
        removed
    }

    // -- Selection ------------------------------------------------------------

    /// Pick a worker for `job`, reporting why when none qualifies.
    pub fn select(&self, job: &Job, vrf_seed: &[u8]) -> Result<Selection, SelectionError> {
        let snapshot = self.registry.snapshot();

        let pipeline = SelectionPipeline::new(&self.config);

        // Only the final pick draws randomness, so only it holds the rng lock.
        let outcome = pipeline.shortlist(&snapshot, job).and_then(|shortlist| {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            pipeline.pick(&shortlist, job, vrf_seed, &mut *rng)
        });

        let mut selection = match outcome {
            Ok(selection) => selection,
            Err(err) => {
                tracing::warn!(
                    job_id = %job.job_id,
                    registry_size = snapshot.len(),
                    error = %err,
                    "No worker selected"
                );
                self.events.publish(
                    RouterEvent::new(names::JOB_UNASSIGNED)
                        .with_job(job.job_id.clone())
                        .with_payload(json!({ "reason": err.to_string() })),
                );
                return Err(err);
            }
        };

        if selection.method.consumes_quota() {
            if let Some(quota_used) = self
                .quotas
                .record_selection(&selection.worker.address, selection.registry_size)
            {
                selection.worker.quota_used = quota_used;
            }
        }

        tracing::info!(
            job_id = %job.job_id,
            worker = %selection.worker.address,
            method = selection.method.as_str(),
            total_score = selection.total_score,
            candidates = selection.candidate_count,
            quota_used = selection.worker.quota_used,
            "Worker selected"
        );
        self.events.publish(
            RouterEvent::new(names::JOB_ASSIGNED)
                .with_worker(selection.worker.address.clone())
                .with_job(job.job_id.clone())
                .with_payload(json!({
                    "method": selection.method,
                    "total_score": selection.total_score,
                    "quota_used": selection.worker.quota_used,
                    "eligible": selection.eligible_count,
                    "candidates": selection.candidate_count,
                })),
        );

        Ok(selection)
    }

    /// Pick a worker for `job`, or `None` if no worker qualifies.
    pub fn select_worker(&self, job: &Job, vrf_seed: &[u8]) -> Option<Worker> {
        self.select(job, vrf_seed)
            .ok()
            .map(|selection| selection.worker)
    }

    // -- Epochs ---------------------------------------------------------------

    /// Zero every worker's quota. Returns the number of workers reset.
    pub fn reset_epoch_quotas(&self) -> usize {
        let reset = self.quotas.reset_epoch();
        self.events.publish(
            RouterEvent::new(names::EPOCH_RESET)
                .with_payload(json!({ "epoch": self.quotas.epoch(), "workers": reset })),
        );
        reset
    }

    pub fn epoch(&self) -> u64 {
        self.quotas.epoch()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
