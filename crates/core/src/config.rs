//! Router configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_QUOTA: f64 = 1.0;
pub const DEFAULT_EXPLORATION_RATE: f64 = 0.05;
pub const DEFAULT_NEWCOMER_BOOST: f64 = 0.2;
pub const DEFAULT_ANTI_COLLUSION_ENABLED: bool = true;

/// Tuning parameters of the selection pipeline.
///
/// Validated once when the router is constructed; the pipeline assumes the
/// invariants checked by [`RouterConfig::validate`] hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of top-ranked candidates kept for exploration and sampling.
    pub top_k: usize,
    /// Per-epoch quota ceiling. Workers at or above it are ineligible.
    pub max_quota: f64,
    /// Probability of picking a newcomer from the top-K instead of sampling.
    pub exploration_rate: f64,
    /// Fairness multiplier bonus for newcomers (`1 + newcomer_boost`).
    pub newcomer_boost: f64,
    /// When `true`, the winner is drawn with the VRF-seeded weighted walk.
    /// When `false`, the winner is drawn uniformly from the top-K.
    pub anti_collusion_enabled: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_quota: DEFAULT_MAX_QUOTA,
            exploration_rate: DEFAULT_EXPLORATION_RATE,
            newcomer_boost: DEFAULT_NEWCOMER_BOOST,
            anti_collusion_enabled: DEFAULT_ANTI_COLLUSION_ENABLED,
        }
    }
}

impl RouterConfig {
    /// Check the numeric ranges of every option.
    ///
    /// Rules:
    /// - `top_k >= 1`
    /// - `max_quota` finite and `> 0`
    /// - `exploration_rate` within `0.0..=1.0`
    /// - `newcomer_boost` finite and `>= 0`
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.top_k == 0 {
            return Err(CoreError::Validation(
                "top_k must be at least 1".to_string(),
            ));
        }
        if !self.max_quota.is_finite() || self.max_quota <= 0.0 {
            return Err(CoreError::Validation(format!(
                "max_quota must be a positive number, got {}",
                self.max_quota
            )));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(CoreError::Validation(format!(
                "exploration_rate must be within 0.0..=1.0, got {}",
                self.exploration_rate
            )));
        }
        if !self.newcomer_boost.is_finite() || self.newcomer_boost < 0.0 {
            return Err(CoreError::Validation(format!(
                "newcomer_boost must be non-negative, got {}",
                self.newcomer_boost
            )));
        }
        Ok(())
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `ASR_TOP_K`                  | `5`     |
    /// | `ASR_MAX_QUOTA`              | `1.0`   |
    /// | `ASR_EXPLORATION_RATE`       | `0.05`  |
    /// | `ASR_NEWCOMER_BOOST`         | `0.2`   |
    /// | `ASR_ANTI_COLLUSION_ENABLED` | `true`  |
    ///
    /// The result is validated before it is returned.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through
    /// `lookup`, so callers can supply any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            top_k: parse_var(&lookup, "ASR_TOP_K", DEFAULT_TOP_K)?,
            max_quota: parse_var(&lookup, "ASR_MAX_QUOTA", DEFAULT_MAX_QUOTA)?,
            exploration_rate: parse_var(
                &lookup,
                "ASR_EXPLORATION_RATE",
                DEFAULT_EXPLORATION_RATE,
            )?,
            newcomer_boost: parse_var(&lookup, "ASR_NEWCOMER_BOOST", DEFAULT_NEWCOMER_BOOST)?,
            anti_collusion_enabled: parse_var(
                &lookup,
                "ASR_ANTI_COLLUSION_ENABLED",
                DEFAULT_ANTI_COLLUSION_ENABLED,
            )?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CoreError::Validation(format!("{key} is not valid: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
