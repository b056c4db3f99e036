#![allow(dead_code)]

use asr_core::config::RouterConfig;
use asr_core::worker::{GpuSpec, Job, JobSpecs, Worker, WorkerPerformance, WorkerSpecs};
use asr_router::AsrRouter;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const RTX_4090: &str = "NVIDIA RTX 4090";

/// Build a router with a fixed-seed random source.
pub fn test_router(config: RouterConfig) -> AsrRouter {
    AsrRouter::with_rng(config, StdRng::seed_from_u64(0xA5A5)).expect("valid test config")
}

/// Config with exploration disabled so selections depend only on the seed.
pub fn deterministic_config(top_k: usize) -> RouterConfig {
    RouterConfig {
        top_k,
        exploration_rate: 0.0,
        ..Default::default()
    }
}

/// An active RTX 4090 worker in `us-west` with a track record.
pub fn gpu_worker(address: &str, popc_pass_rate: f64) -> Worker {
    let mut worker = Worker::new(
        address,
        WorkerSpecs {
            gpus: vec![GpuSpec::new(RTX_4090, 24)],
            region: "us-west".to_string(),
        },
    );
    worker.performance = WorkerPerformance {
        total_jobs: 100,
        popc_pass_rate,
        da_reliability: 0.95,
        uptime: 0.98,
    };
    worker
}

pub fn gpu_job(job_id: &str) -> Job {
    Job::new(
        job_id,
        JobSpecs {
            gpu: Some(RTX_4090.to_string()),
            vram: 24,
            region: None,
        },
    )
}
