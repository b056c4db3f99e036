use asr_core::types::JobId;

/// Why a selection produced no worker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("No eligible workers for job {job_id}")]
    NoEligibleWorkers { job_id: JobId },

    #[error("No candidates left after top-K pruning for job {job_id}")]
    NoCandidates { job_id: JobId },
}
