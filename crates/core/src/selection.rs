//! Ranking, top-K pruning, exploration and VRF-weighted sampling.
//!
//! These are the pure stages of the selection pipeline. Given the same
//! scores, seed and random draws they always produce the same pick.

use serde::{Deserialize, Serialize};

use crate::config::RouterConfig;
use crate::random::RandomSource;
use crate::scoring::WorkerScore;

/// Number of seed bytes folded into the sampling fraction.
pub const SEED_BYTES: usize = 8;

/// Which branch of the pipeline produced the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Epsilon-greedy branch: a newcomer picked uniformly from the top-K.
    Exploration,
    /// VRF-seeded cumulative-weight walk.
    Weighted,
    /// All top-K scores were zero; uniform pick.
    ZeroWeightFallback,
    /// Anti-collusion sampling disabled; uniform pick.
    Uniform,
}

impl SelectionMethod {
    /// Exploration picks do not consume epoch quota.
    pub fn consumes_quota(self) -> bool {
        !matches!(self, Self::Exploration)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exploration => "exploration",
            Self::Weighted => "weighted",
            Self::ZeroWeightFallback => "zero_weight_fallback",
            Self::Uniform => "uniform",
        }
    }
}

/// Index into the top-K set plus the branch that chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub index: usize,
    pub method: SelectionMethod,
}

// ---------------------------------------------------------------------------
// Rank / prune
// ---------------------------------------------------------------------------

/// Sort by `total_score` descending. The sort is stable, so equal scores
/// keep their input order.
pub fn rank(scores: &mut [WorkerScore<'_>]) {
    scores.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
}

/// Keep the first `top_k` entries.
pub fn prune(scores: &mut Vec<WorkerScore<'_>>, top_k: usize) {
    scores.truncate(top_k);
}

// ---------------------------------------------------------------------------
// Seeded sampling
// ---------------------------------------------------------------------------

/// Map a VRF seed to a fraction in `[0.0, 1.0]`.
///
/// The first eight bytes are read as a big-endian `u64` and divided once by
/// `u64::MAX`. A seed shorter than eight bytes is read as the big-endian
/// integer of the bytes present.
pub fn seed_fraction(seed: &[u8]) -> f64 {
    let take = seed.len().min(SEED_BYTES);
    let mut buf = [0u8; SEED_BYTES];
    buf[SEED_BYTES - take..].copy_from_slice(&seed[..take]);
    u64::from_be_bytes(buf) as f64 / u64::MAX as f64
}

/// Sum of `total_score` in ranked order.
pub fn total_weight(candidates: &[WorkerScore<'_>]) -> f64 {
    candidates
        .iter()
        .fold(0.0, |acc, candidate| acc + candidate.total_score)
}

/// Walk the candidates accumulating scores and return the first index whose
/// cumulative score reaches `fraction * total_weight`. Falls back to the
/// top-ranked candidate if rounding leaves the threshold unreached.
pub fn weighted_index(candidates: &[WorkerScore<'_>], fraction: f64) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let threshold = fraction * total_weight(candidates);

    let mut cumulative = 0.0;
    for (index, candidate) in candidates.iter().enumerate() {
        cumulative += candidate.total_score;
        if cumulative >= threshold {
            return Some(index);
        }
    }
    Some(0)
}

/// Indices of newcomers within the candidate set.
pub fn newcomer_indices(candidates: &[WorkerScore<'_>]) -> Vec<usize> {
    candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.worker.is_newcomer)
        .map(|(index, _)| index)
        .collect()
}

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// Choose the winner among ranked, pruned candidates.
///
/// Always draws one exploration value from `rng`. If it falls below
/// `exploration_rate` and newcomers are present, one of them is picked
/// uniformly. Otherwise the seeded weighted walk runs (or a uniform pick when
/// anti-collusion sampling is disabled or every score is zero).
pub fn choose<R: RandomSource + ?Sized>(
    candidates: &[WorkerScore<'_>],
    config: &RouterConfig,
    vrf_seed: &[u8],
    rng: &mut R,
) -> Option<Pick> {
    if candidates.is_empty() {
        return None;
    }

    if rng.next_unit() < config.exploration_rate {
        let newcomers = newcomer_indices(candidates);
        if !newcomers.is_empty() {
            let index = newcomers[rng.pick_index(newcomers.len())];
            return Some(Pick {
                index,
                method: SelectionMethod::Exploration,
            });
        }
    }

    if !config.anti_collusion_enabled {
        return Some(Pick {
            index: rng.pick_index(candidates.len()),
            method: SelectionMethod::Uniform,
        });
    }

    if total_weight(candidates) == 0.0 {
        return Some(Pick {
            index: rng.pick_index(candidates.len()),
            method: SelectionMethod::ZeroWeightFallback,
        });
    }

    weighted_index(candidates, seed_fraction(vrf_seed)).map(|index| Pick {
        index,
        method: SelectionMethod::Weighted,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
