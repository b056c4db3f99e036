/// Workers are keyed by their on-chain address, kept in its textual form.
pub type WorkerAddress = String;

/// Job identifiers are opaque strings assigned by the submission path.
pub type JobId = String;
