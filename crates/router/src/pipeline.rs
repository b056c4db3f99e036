//! The selection pipeline: filter, score, rank, prune, explore, sample.
//!
//! Runs entirely against an owned [`RegistrySnapshot`], so concurrent
//! registry mutation cannot affect a selection in flight. The pipeline
//! itself has no side effects; charging quota is the caller's job.

use asr_core::config::RouterConfig;
use asr_core::eligibility::filter_eligible;
use asr_core::random::RandomSource;
use asr_core::scoring::{score_all, WorkerScore};
use asr_core::selection::{choose, prune, rank, SelectionMethod, SEED_BYTES};
use asr_core::worker::{Job, Worker};
use serde::Serialize;

use crate::error::SelectionError;
use crate::registry::RegistrySnapshot;

/// The outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// The winning worker. After a quota-consuming pick the router updates
    /// `quota_used` to the post-charge value.
    pub worker: Worker,
    pub method: SelectionMethod,
    pub suitability: f64,
    pub performance: f64,
    pub fairness: f64,
    pub total_score: f64,
    /// Workers in the snapshot; the quota charge is `1 / registry_size`.
    pub registry_size: usize,
    pub eligible_count: usize,
    pub candidate_count: usize,
}

/// Ranked, pruned candidates for one job, borrowed from a snapshot.
///
/// Building a shortlist needs no random source, so callers can do it
/// before taking any lock on one.
#[derive(Debug)]
pub struct Shortlist<'s> {
    candidates: Vec<WorkerScore<'s>>,
    registry_size: usize,
    eligible_count: usize,
}

impl<'s> Shortlist<'s> {
    /// Top-K candidates in ranked order.
    pub fn candidates(&self) -> &[WorkerScore<'s>] {
        &self.candidates
    }

    pub fn registry_size(&self) -> usize {
        self.registry_size
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible_count
    }
}

pub struct SelectionPipeline<'a> {
    config: &'a RouterConfig,
}

impl<'a> SelectionPipeline<'a> {
    pub fn new(config: &'a RouterConfig) -> Self {
        Self { config }
    }

    /// Filter, score, rank and prune.
    pub fn shortlist<'s>(
        &self,
        snapshot: &'s RegistrySnapshot,
        job: &Job,
    ) -> Result<Shortlist<'s>, SelectionError> {
        let set = filter_eligible(snapshot.workers(), job, self.config);
        for (worker, reason) in &set.rejected {
            tracing::debug!(
                job_id = %job.job_id,
                worker = %worker.address,
                %reason,
                "Worker ineligible"
            );
        }

        if set.eligible.is_empty() {
            return Err(SelectionError::NoEligibleWorkers {
                job_id: job.job_id.clone(),
            });
        }

        let mut candidates = score_all(&set.eligible, job, self.config);
        rank(&mut candidates);
        prune(&mut candidates, self.config.top_k);

        Ok(Shortlist {
            candidates,
            registry_size: snapshot.len(),
            eligible_count: set.eligible.len(),
        })
    }

    /// Explore or sample a winner from `shortlist`.
    pub fn pick<R: RandomSource + ?Sized>(
        &self,
        shortlist: &Shortlist<'_>,
        job: &Job,
        vrf_seed: &[u8],
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        if vrf_seed.len() < SEED_BYTES {
            tracing::warn!(
                job_id = %job.job_id,
                seed_len = vrf_seed.len(),
                expected = SEED_BYTES,
                "Short VRF seed, reading the bytes present"
            );
        }

        let candidates = shortlist.candidates();
        let pick = choose(candidates, self.config, vrf_seed, rng).ok_or_else(|| {
            SelectionError::NoCandidates {
                job_id: job.job_id.clone(),
            }
        })?;
        let winner = candidates[pick.index];

        if pick.method == SelectionMethod::Exploration {
            tracing::debug!(
                job_id = %job.job_id,
                worker = %winner.worker.address,
                "Exploring newcomer"
            );
        }

        Ok(Selection {
            worker: winner.worker.clone(),
            method: pick.method,
            suitability: winner.suitability,
            performance: winner.performance,
            fairness: winner.fairness,
            total_score: winner.total_score,
            registry_size: shortlist.registry_size,
            eligible_count: shortlist.eligible_count,
            candidate_count: candidates.len(),
        })
    }

    /// [`shortlist`](Self::shortlist) followed by [`pick`](Self::pick).
    pub fn run<R: RandomSource + ?Sized>(
        &self,
        snapshot: &RegistrySnapshot,
        job: &Job,
        vrf_seed: &[u8],
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        let shortlist = self.shortlist(snapshot, job)?;
        self.pick(&shortlist, job, vrf_seed, rng)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use asr_core::worker::{GpuSpec, JobSpecs, WorkerPerformance, WorkerSpecs, WorkerStatus};
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::registry::WorkerRegistry;

    const RTX_4090: &str = "NVIDIA RTX 4090";

    fn worker(address: &str, popc: f64) -> Worker {
        let mut w = Worker::new(
            address,
            WorkerSpecs {
                gpus: vec![GpuSpec::new(RTX_4090, 24)],
                region: "us-west".to_string(),
            },
        );
        w.performance = WorkerPerformance {
            total_jobs: 100,
            popc_pass_rate: popc,
            da_reliability: 0.95,
            uptime: 0.98,
        };
        w
    }

    fn job() -> Job {
        Job::new(
            "test-job",
            JobSpecs {
                gpu: Some(RTX_4090.to_string()),
                vram: 24,
                region: None,
            },
        )
    }

    fn snapshot_of(workers: Vec<Worker>) -> RegistrySnapshot {
        let registry = WorkerRegistry::new();
        for w in workers {
            registry.register(w).expect("valid worker");
        }
        registry.snapshot()
    }

    fn config(top_k: usize) -> RouterConfig {
        RouterConfig {
            top_k,
            exploration_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn zero_seed_selects_top_ranked() {
        let snapshot = snapshot_of(vec![
            worker("0x1", 0.91),
            worker("0x2", 0.99),
            worker("0x3", 0.95),
        ]);
        let cfg = config(3);
        let selection = SelectionPipeline::new(&cfg)
            .run(&snapshot, &job(), &[0u8; 8], &mut StdRng::seed_from_u64(1))
            .expect("a selection");
        assert_eq!(selection.worker.address, "0x2");
        assert_eq!(selection.method, SelectionMethod::Weighted);
        assert_eq!(selection.registry_size, 3);
        assert_eq!(selection.eligible_count, 3);
        assert_eq!(selection.candidate_count, 3);
    }

    #[test]
    fn max_seed_selects_last_of_top_k() {
        let snapshot = snapshot_of(vec![
            worker("0x1", 0.91),
            worker("0x2", 0.99),
            worker("0x3", 0.95),
            worker("0x4", 0.93),
        ]);
        let cfg = config(3);
        let selection = SelectionPipeline::new(&cfg)
            .run(&snapshot, &job(), &[0xFF; 8], &mut StdRng::seed_from_u64(1))
            .expect("a selection");
        // Ranked: 0x2, 0x3, 0x4, 0x1 -> top-3 ends with 0x4.
        assert_eq!(selection.worker.address, "0x4");
        assert_eq!(selection.candidate_count, 3);
    }

    #[test]
    fn ineligible_workers_are_skipped() {
        let mut inactive = worker("0x1", 0.99);
        inactive.status = WorkerStatus::Inactive;
        let snapshot = snapshot_of(vec![inactive, worker("0x2", 0.5)]);
        let cfg = config(5);
        let selection = SelectionPipeline::new(&cfg)
            .run(&snapshot, &job(), &[0u8; 8], &mut StdRng::seed_from_u64(1))
            .expect("a selection");
        assert_eq!(selection.worker.address, "0x2");
        assert_eq!(selection.eligible_count, 1);
        assert_eq!(selection.registry_size, 2);
    }

    #[test]
    fn empty_snapshot_has_no_eligible_workers() {
        let cfg = config(5);
        let result = SelectionPipeline::new(&cfg).run(
            &RegistrySnapshot::default(),
            &job(),
            &[0u8; 8],
            &mut StdRng::seed_from_u64(1),
        );
        assert_matches!(result, Err(SelectionError::NoEligibleWorkers { job_id }) if job_id == "test-job");
    }

    #[test]
    fn shortlist_ranks_and_prunes_without_a_random_source() {
        let mut inactive = worker("0x5", 0.99);
        inactive.status = WorkerStatus::Inactive;
        let snapshot = snapshot_of(vec![
            worker("0x1", 0.91),
            worker("0x2", 0.99),
            worker("0x3", 0.95),
            worker("0x4", 0.93),
            inactive,
        ]);
        let cfg = config(2);
        let shortlist = SelectionPipeline::new(&cfg)
            .shortlist(&snapshot, &job())
            .expect("a shortlist");
        let ranked: Vec<&str> = shortlist
            .candidates()
            .iter()
            .map(|c| c.worker.address.as_str())
            .collect();
        assert_eq!(ranked, vec!["0x2", "0x3"]);
        assert_eq!(shortlist.registry_size(), 5);
        assert_eq!(shortlist.eligible_count(), 4);
    }

    #[test]
    fn one_shortlist_serves_repeated_picks() {
        let snapshot = snapshot_of(vec![worker("0x1", 0.91), worker("0x2", 0.99)]);
        let cfg = config(5);
        let pipeline = SelectionPipeline::new(&cfg);
        let shortlist = pipeline.shortlist(&snapshot, &job()).expect("a shortlist");
        let mut rng = StdRng::seed_from_u64(3);

        let low = pipeline
            .pick(&shortlist, &job(), &[0u8; 8], &mut rng)
            .expect("a selection");
        let high = pipeline
            .pick(&shortlist, &job(), &[0xFF; 8], &mut rng)
            .expect("a selection");
        assert_eq!(low.worker.address, "0x2");
        assert_eq!(high.worker.address, "0x1");
        assert_eq!(high.candidate_count, 2);
    }

    #[test]
    fn same_inputs_give_same_winner() {
        let snapshot = snapshot_of(
            (1..=5)
                .map(|i| worker(&format!("0x{i}"), 0.9 + f64::from(i) / 100.0))
                .collect(),
        );
        let cfg = config(3);
        let seed = [0x12, 0x34, 0x56, 0x78, 0x90, 0xab, 0xcd, 0xef];
        let first = SelectionPipeline::new(&cfg)
            .run(&snapshot, &job(), &seed, &mut StdRng::seed_from_u64(1))
            .expect("a selection");
        for s in 2..10 {
            let again = SelectionPipeline::new(&cfg)
                .run(&snapshot, &job(), &seed, &mut StdRng::seed_from_u64(s))
                .expect("a selection");
            assert_eq!(again.worker.address, first.worker.address);
        }
    }
}
