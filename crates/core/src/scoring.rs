//! Scoring engine: suitability, performance and fairness factors.
//!
//! Each factor is non-negative, so their product (`total_score`) is too.

use crate::config::RouterConfig;
use crate::worker::{Job, Worker, WorkerPerformance};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Suitability multiplier when the worker owns a GPU of the requested model.
pub const GPU_MATCH_BONUS: f64 = 1.2;

/// Suitability multiplier when the worker sits in the requested region.
pub const REGION_MATCH_BONUS: f64 = 1.1;

/// Upper bound on suitability.
pub const MAX_SUITABILITY: f64 = 2.0;

/// Performance assigned to workers without job history.
pub const NEUTRAL_PERFORMANCE: f64 = 0.5;

pub const WEIGHT_POPC_PASS_RATE: f64 = 0.4;
pub const WEIGHT_DA_RELIABILITY: f64 = 0.3;
pub const WEIGHT_UPTIME: f64 = 0.3;

/// Quota ratio above which the linear fairness penalty applies.
pub const QUOTA_PENALTY_THRESHOLD: f64 = 0.8;

// ---------------------------------------------------------------------------
// WorkerScore
// ---------------------------------------------------------------------------

/// The score breakdown of one worker for one job. Built fresh per selection.
#[derive(Debug, Clone, Copy)]
pub struct WorkerScore<'a> {
    pub worker: &'a Worker,
    pub suitability: f64,
    pub performance: f64,
    pub fairness: f64,
    pub total_score: f64,
}

pub fn score_worker<'a>(worker: &'a Worker, job: &Job, config: &RouterConfig) -> WorkerScore<'a> {
    let suitability = suitability(worker, job);
    let performance = performance(&worker.performance);
    let fairness = fairness(worker, config);
    WorkerScore {
        worker,
        suitability,
        performance,
        fairness,
        total_score: suitability * performance * fairness,
    }
}

/// Score every worker, preserving input order.
pub fn score_all<'a>(
    workers: &[&'a Worker],
    job: &Job,
    config: &RouterConfig,
) -> Vec<WorkerScore<'a>> {
    workers
        .iter()
        .map(|worker| score_worker(worker, job, config))
        .collect()
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

/// How well the worker matches the job, in `(0.0, MAX_SUITABILITY]`.
pub fn suitability(worker: &Worker, job: &Job) -> f64 {
    let mut suitability = 1.0;

    if let Some(model) = job.specs.requested_gpu() {
        if worker.specs.gpus.iter().any(|gpu| gpu.model == model) {
            suitability *= GPU_MATCH_BONUS;
        }
    }

    if let Some(region) = job.specs.requested_region() {
        if worker.specs.region == region {
            suitability *= REGION_MATCH_BONUS;
        }
    }

    f64::min(suitability, MAX_SUITABILITY)
}

/// Weighted reliability, or [`NEUTRAL_PERFORMANCE`] for untested workers.
pub fn performance(perf: &WorkerPerformance) -> f64 {
    if perf.total_jobs == 0 {
        return NEUTRAL_PERFORMANCE;
    }
    WEIGHT_POPC_PASS_RATE * perf.popc_pass_rate
        + WEIGHT_DA_RELIABILITY * perf.da_reliability
        + WEIGHT_UPTIME * perf.uptime
}

/// Quota penalty and newcomer boost.
///
/// Above [`QUOTA_PENALTY_THRESHOLD`] the factor falls linearly to zero as
/// `quota_used` approaches `max_quota`.
pub fn fairness(worker: &Worker, config: &RouterConfig) -> f64 {
    let mut fairness = 1.0;

    let quota_ratio = worker.quota_used / config.max_quota;
    if quota_ratio > QUOTA_PENALTY_THRESHOLD {
        fairness *= (1.0 - quota_ratio).max(0.0);
    }

    if worker.is_newcomer {
        fairness *= 1.0 + config.newcomer_boost;
    }

    fairness
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{GpuSpec, JobSpecs, WorkerSpecs};

    const RTX_4090: &str = "NVIDIA RTX 4090";

    fn worker_with(gpus: Vec<GpuSpec>, region: &str) -> Worker {
        Worker::new(
            "0x1234",
            WorkerSpecs {
                gpus,
                region: region.to_string(),
            },
        )
    }

    fn job(gpu: Option<&str>, region: Option<&str>) -> Job {
        Job::new(
            "job",
            JobSpecs {
                gpu: gpu.map(str::to_string),
                vram: 24,
                region: region.map(str::to_string),
            },
        )
    }

    fn config() -> RouterConfig {
        RouterConfig {
            max_quota: 0.15,
            newcomer_boost: 0.1,
            ..Default::default()
        }
    }

    // -- suitability ----------------------------------------------------------

    #[test]
    fn suitability_gpu_and_region_match() {
        let w = worker_with(vec![GpuSpec::new(RTX_4090, 24)], "us-west");
        let s = suitability(&w, &job(Some(RTX_4090), Some("us-west")));
        assert!((s - 1.2 * 1.1).abs() < 1e-12);
    }

    #[test]
    fn suitability_gpu_match_only() {
        let w = worker_with(vec![GpuSpec::new(RTX_4090, 24)], "us-west");
        let s = suitability(&w, &job(Some(RTX_4090), None));
        assert!((s - 1.2).abs() < 1e-12);
    }

    #[test]
    fn suitability_region_match_only() {
        let w = worker_with(vec![], "us-west");
        let s = suitability(&w, &job(None, Some("us-west")));
        assert!((s - 1.1).abs() < 1e-12);
    }

    #[test]
    fn suitability_baseline_without_matches() {
        let w = worker_with(vec![GpuSpec::new("A10", 24)], "eu");
        assert_eq!(suitability(&w, &job(Some(RTX_4090), Some("us"))), 1.0);
    }

    #[test]
    fn suitability_stays_within_bounds() {
        let w = worker_with(
            vec![GpuSpec::new(RTX_4090, 24), GpuSpec::new(RTX_4090, 48)],
            "us-west",
        );
        for j in [
            job(None, None),
            job(Some(RTX_4090), None),
            job(Some(RTX_4090), Some("us-west")),
            job(Some("A100"), Some("eu")),
        ] {
            let s = suitability(&w, &j);
            assert!(s > 0.0 && s <= MAX_SUITABILITY, "suitability {s} out of bounds");
        }
    }

    // -- performance ----------------------------------------------------------

    #[test]
    fn performance_neutral_without_history() {
        let perf = WorkerPerformance {
            total_jobs: 0,
            popc_pass_rate: 1.0,
            da_reliability: 1.0,
            uptime: 1.0,
        };
        assert_eq!(performance(&perf), 0.5);
    }

    #[test]
    fn performance_weighted_sum() {
        let perf = WorkerPerformance {
            total_jobs: 50,
            popc_pass_rate: 0.80,
            da_reliability: 0.75,
            uptime: 0.85,
        };
        // 0.4 * 0.80 + 0.3 * 0.75 + 0.3 * 0.85 = 0.32 + 0.225 + 0.255 = 0.80
        assert!((performance(&perf) - 0.80).abs() < 1e-12);
    }

    // -- fairness -------------------------------------------------------------

    #[test]
    fn fairness_identity_for_low_quota() {
        let mut w = worker_with(vec![], "");
        w.quota_used = 0.05;
        assert_eq!(fairness(&w, &config()), 1.0);
    }

    #[test]
    fn fairness_identity_at_exact_threshold() {
        let mut w = worker_with(vec![], "");
        w.quota_used = 0.8;
        let cfg = RouterConfig {
            max_quota: 1.0,
            ..config()
        };
        assert_eq!(fairness(&w, &cfg), 1.0);
    }

    #[test]
    fn fairness_penalised_above_threshold() {
        let mut w = worker_with(vec![], "");
        w.quota_used = 0.9;
        let cfg = RouterConfig {
            max_quota: 1.0,
            ..config()
        };
        assert!((fairness(&w, &cfg) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn fairness_newcomer_boost() {
        let mut w = worker_with(vec![], "");
        w.quota_used = 0.05;
        w.is_newcomer = true;
        assert!((fairness(&w, &config()) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn fairness_never_negative_past_max_quota() {
        let mut w = worker_with(vec![], "");
        w.quota_used = 0.3;
        assert_eq!(fairness(&w, &config()), 0.0);
    }

    // -- score_worker ---------------------------------------------------------

    #[test]
    fn total_score_is_product_of_factors() {
        let mut w = worker_with(vec![GpuSpec::new(RTX_4090, 24)], "us-west");
        w.quota_used = 0.05;
        w.performance = WorkerPerformance {
            total_jobs: 100,
            popc_pass_rate: 0.95,
            da_reliability: 0.98,
            uptime: 0.99,
        };
        let j = job(Some(RTX_4090), Some("us-west"));
        let score = score_worker(&w, &j, &config());
        assert_eq!(score.worker.address, "0x1234");
        assert!(score.suitability > 0.0);
        assert!(score.performance > 0.0);
        assert!(score.fairness > 0.0);
        assert_eq!(
            score.total_score,
            score.suitability * score.performance * score.fairness
        );
    }
}
