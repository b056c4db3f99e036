use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use asr_core::config::RouterConfig;
use asr_core::worker::{Job, Worker};
use asr_events::{EventBus, EventLogger};
use asr_router::AsrRouter;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One line of the request file: the job and the VRF seed produced for it.
#[derive(Debug, Deserialize)]
struct DispatchRequest {
    job: Job,
    vrf_seed: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct Assignment<'a> {
    job_id: &'a str,
    worker: Option<&'a str>,
    method: Option<&'static str>,
    total_score: Option<f64>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asr_router=debug,asr_events=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = RouterConfig::from_env().context("Invalid router configuration")?;
    tracing::info!(
        top_k = config.top_k,
        max_quota = config.max_quota,
        exploration_rate = config.exploration_rate,
        anti_collusion = config.anti_collusion_enabled,
        "Loaded router configuration"
    );

    let fleet_path = std::env::var("ASR_FLEET_PATH").context("ASR_FLEET_PATH must be set")?;
    let requests_path =
        std::env::var("ASR_REQUESTS_PATH").context("ASR_REQUESTS_PATH must be set")?;
    let jobs_per_epoch: Option<usize> = std::env::var("ASR_JOBS_PER_EPOCH")
        .ok()
        .map(|raw| raw.parse::<usize>())
        .transpose()
        .context("ASR_JOBS_PER_EPOCH must be a positive integer")?
        .filter(|n| *n > 0);

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));

    // --- Router ---
    let router = AsrRouter::new(config)?.with_event_bus(Arc::clone(&event_bus));

    let fleet: Vec<Worker> = read_json(Path::new(&fleet_path))?;
    for worker in fleet {
        let address = worker.address.clone();
        if let Err(e) = router.register_worker(worker) {
            tracing::warn!(worker = %address, error = %e, "Skipping invalid worker");
        }
    }
    tracing::info!(workers = router.registry().len(), "Fleet registered");

    // --- Dispatch ---
    let requests: Vec<DispatchRequest> = read_json(Path::new(&requests_path))?;
    for (n, request) in requests.iter().enumerate() {
        if let Some(per_epoch) = jobs_per_epoch {
            if n > 0 && n % per_epoch == 0 {
                router.reset_epoch_quotas();
            }
        }

        let line = match router.select(&request.job, &request.vrf_seed) {
            Ok(selection) => serde_json::to_string(&Assignment {
                job_id: &request.job.job_id,
                worker: Some(selection.worker.address.as_str()),
                method: Some(selection.method.as_str()),
                total_score: Some(selection.total_score),
                error: None,
            })?,
            Err(e) => serde_json::to_string(&Assignment {
                job_id: &request.job.job_id,
                worker: None,
                method: None,
                total_score: None,
                error: Some(e.to_string()),
            })?,
        };
        println!("{line}");
    }

    // Dropping the router and our bus handle closes the channel.
    drop(router);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;

    tracing::info!(dispatched = requests.len(), "Dispatch complete");
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
