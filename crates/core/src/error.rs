use crate::types::WorkerAddress;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound {
        entity: &'static str,
        id: WorkerAddress,
    },

    #[error("Validation failed: {0}")]
    Validation(String),
}
