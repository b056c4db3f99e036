//! Worker and job domain types, plus registration-time validation.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, WorkerAddress};

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// A single GPU descriptor advertised by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSpec {
    pub model: String,
    /// VRAM in GB. `None` marks a malformed descriptor, which never
    /// satisfies a VRAM requirement.
    #[serde(default)]
    pub vram: Option<u32>,
    #[serde(default = "default_gpu_count")]
    pub count: u32,
}

fn default_gpu_count() -> u32 {
    1
}

impl GpuSpec {
    pub fn new(model: impl Into<String>, vram: u32) -> Self {
        Self {
            model: model.into(),
            vram: Some(vram),
            count: 1,
        }
    }
}

/// Hardware and placement capabilities of a worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpecs {
    #[serde(default)]
    pub gpus: Vec<GpuSpec>,
    #[serde(default)]
    pub region: String,
}

/// Lifecycle status of a worker. Only `Active` workers receive jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Slashed,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Slashed => "slashed",
        }
    }
}

/// Historical performance, reported out of band by the telemetry feed.
///
/// The three rates are fractions in `0.0..=1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerPerformance {
    pub total_jobs: u64,
    pub popc_pass_rate: f64,
    pub da_reliability: f64,
    pub uptime: f64,
}

/// A compute provider known to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub address: WorkerAddress,
    #[serde(default)]
    pub specs: WorkerSpecs,
    #[serde(default)]
    pub status: WorkerStatus,
    /// Share of the epoch quota consumed so far.
    #[serde(default)]
    pub quota_used: f64,
    #[serde(default)]
    pub is_newcomer: bool,
    #[serde(default)]
    pub performance: WorkerPerformance,
}

impl Worker {
    /// Create an active, established worker with no quota consumed and no
    /// job history.
    pub fn new(address: impl Into<WorkerAddress>, specs: WorkerSpecs) -> Self {
        Self {
            address: address.into(),
            specs,
            status: WorkerStatus::Active,
            quota_used: 0.0,
            is_newcomer: false,
            performance: WorkerPerformance::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WorkerStatus::Active
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Hardware and placement requirements of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSpecs {
    #[serde(default)]
    pub gpu: Option<String>,
    /// Minimum VRAM in GB on the requested GPU model.
    #[serde(default)]
    pub vram: u32,
    #[serde(default)]
    pub region: Option<String>,
}

impl JobSpecs {
    /// The requested GPU model, treating an empty string as unset.
    pub fn requested_gpu(&self) -> Option<&str> {
        self.gpu.as_deref().filter(|g| !g.is_empty())
    }

    /// The requested region, treating an empty string as "any region".
    pub fn requested_region(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    #[serde(default)]
    pub specs: JobSpecs,
}

impl Job {
    pub fn new(job_id: impl Into<JobId>, specs: JobSpecs) -> Self {
        Self {
            job_id: job_id.into(),
            specs,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a worker before it enters the registry.
///
/// Rules:
/// - Address must not be empty.
/// - `quota_used` must be finite and non-negative.
/// - Performance rates must be fractions (see [`validate_performance`]).
pub fn validate_worker(worker: &Worker) -> Result<(), CoreError> {
    if worker.address.trim().is_empty() {
        return Err(CoreError::Validation(
            "Worker address must not be empty".to_string(),
        ));
    }
    if !worker.quota_used.is_finite() || worker.quota_used < 0.0 {
        return Err(CoreError::Validation(format!(
            "Worker {} has invalid quota_used {}",
            worker.address, worker.quota_used
        )));
    }
    validate_performance(&worker.performance)
}

/// Validate a performance report: every rate must lie in `0.0..=1.0`.
pub fn validate_performance(perf: &WorkerPerformance) -> Result<(), CoreError> {
    let rates = [
        ("popc_pass_rate", perf.popc_pass_rate),
        ("da_reliability", perf.da_reliability),
        ("uptime", perf.uptime),
    ];
    for (name, value) in rates {
        if !(0.0..=1.0).contains(&value) {
            return Err(CoreError::Validation(format!(
                "{name} must be within 0.0..=1.0, got {value}"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
