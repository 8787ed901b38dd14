//! Ingestion job configuration.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for the ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Lower bound of the randomized pause before each listing page (milliseconds).
    #[serde(default = "default_backoff_min")]
    pub backoff_min_ms: u64,

    /// Upper bound of the randomized pause before each listing page (milliseconds).
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    /// Skip "General Information" extraction; entries keep only listing values.
    #[serde(default)]
    pub skip_metadata: bool,
}

fn default_backoff_min() -> u64 {
    1000 // 1 second
}

fn default_backoff_max() -> u64 {
    10_000 // 10 seconds
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            backoff_min_ms: default_backoff_min(),
            backoff_max_ms: default_backoff_max(),
            skip_metadata: false,
        }
    }
}

impl IngestConfig {
    /// Pick a pause uniformly from `[backoff_min_ms, backoff_max_ms]`.
    pub fn backoff(&self) -> Duration {
        let (min, max) = if self.backoff_min_ms <= self.backoff_max_ms {
            (self.backoff_min_ms, self.backoff_max_ms)
        } else {
            (self.backoff_max_ms, self.backoff_min_ms)
        };

        if min == max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}
