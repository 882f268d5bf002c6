//! Sampler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default sampling interval: ten minutes.
const DEFAULT_INTERVAL_MS: u64 = 600_000;

/// Configuration for a [`Sampler`](crate::Sampler).
///
/// Immutable once the sampler is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Opaque labels attached to every snapshot.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Sampling interval in milliseconds. Must be positive.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Start periodic sampling as soon as the sampler is constructed.
    #[serde(default)]
    pub auto_start: bool,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
            auto_start: false,
        }
    }
}

impl SamplerConfig {
    /// Sampling interval as a [`Duration`].
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
