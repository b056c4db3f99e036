//! Eligibility filter: which workers may legally run a given job.
//!
//! All four checks are conjunctive. [`check_eligibility`] reports the first
//! failing check so callers can log why a worker was skipped.

use std::fmt;

use crate::config::RouterConfig;
use crate::worker::{Job, JobSpecs, Worker, WorkerSpecs, WorkerStatus};

/// The reason a worker was excluded from a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NotActive(WorkerStatus),
    QuotaExhausted,
    HardwareMismatch,
    RegionMismatch,
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActive(status) => write!(f, "status is {}", status.as_str()),
            Self::QuotaExhausted => f.write_str("quota exhausted"),
            Self::HardwareMismatch => f.write_str("no matching GPU"),
            Self::RegionMismatch => f.write_str("region mismatch"),
        }
    }
}

/// Run the checks in order: status, quota, hardware, region.
pub fn check_eligibility(
    worker: &Worker,
    job: &Job,
    config: &RouterConfig,
) -> Result<(), Ineligibility> {
    if !worker.is_active() {
        return Err(Ineligibility::NotActive(worker.status));
    }
    if worker.quota_used >= config.max_quota {
        return Err(Ineligibility::QuotaExhausted);
    }
    if !meets_hardware_requirements(&worker.specs, &job.specs) {
        return Err(Ineligibility::HardwareMismatch);
    }
    if !region_matches(&worker.specs, &job.specs) {
        return Err(Ineligibility::RegionMismatch);
    }
    Ok(())
}

pub fn is_eligible(worker: &Worker, job: &Job, config: &RouterConfig) -> bool {
    check_eligibility(worker, job, config).is_ok()
}

/// A job without a GPU request matches any hardware. Otherwise the worker
/// needs one GPU of the requested model with at least the requested VRAM;
/// a descriptor without a VRAM figure never qualifies.
pub fn meets_hardware_requirements(worker: &WorkerSpecs, job: &JobSpecs) -> bool {
    let Some(model) = job.requested_gpu() else {
        return true;
    };
    worker
        .gpus
        .iter()
        .any(|gpu| gpu.model == model && gpu.vram.is_some_and(|vram| vram >= job.vram))
}

/// A job without a region accepts any region.
pub fn region_matches(worker: &WorkerSpecs, job: &JobSpecs) -> bool {
    match job.requested_region() {
        Some(region) => worker.region == region,
        None => true,
    }
}

/// Outcome of filtering a fleet for one job.
#[derive(Debug, Default)]
pub struct EligibleSet<'a> {
    /// Eligible workers, in input order.
    pub eligible: Vec<&'a Worker>,
    /// Excluded workers with the first check each one failed.
    pub rejected: Vec<(&'a Worker, Ineligibility)>,
}

/// Split `workers` into eligible and rejected, preserving input order.
pub fn filter_eligible<'a>(
    workers: &'a [Worker],
    job: &Job,
    config: &RouterConfig,
) -> EligibleSet<'a> {
    let mut set = EligibleSet::default();
    for worker in workers {
        match check_eligibility(worker, job, config) {
            Ok(()) => set.eligible.push(worker),
            Err(reason) => set.rejected.push((worker, reason)),
        }
    }
    set
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
