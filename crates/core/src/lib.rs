//! Pure domain logic for the Auto-Selection Router (ASR).
//!
//! Everything in this crate is free of I/O and shared state: worker and job
//! types, router configuration, the eligibility filter, the scoring engine
//! and the sampling primitives used by the selection pipeline. The stateful
//! pieces (registry, quota bookkeeping, the router facade) live in
//! `asr-router`.

pub mod config;
pub mod eligibility;
pub mod error;
pub mod random;
pub mod scoring;
pub mod selection;
pub mod types;
pub mod worker;
