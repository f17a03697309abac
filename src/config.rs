//! Runtime configuration for pools and recomputation policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Smallest worker count a pool is built with when sizing is left to hardware.
pub const MIN_WORKERS: usize = 5;

/// Number of hardware threads, falling back to 1 when it cannot be queried.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Explicit worker count. `None` uses `max(hardware + 1, MIN_WORKERS)`.
    pub workers: Option<usize>,
    pub thread_name: String,
}

impl PoolConfig {
    pub fn named(thread_name: impl Into<String>) -> Self {
        Self {
            workers: None,
            thread_name: thread_name.into(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn resolved_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| (hardware_concurrency() + 1).max(MIN_WORKERS))
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::named("chart-worker")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Skip slot refresh for elements that were not mutated since the last frame.
    pub lazy_recomputing: bool,
    pub primary: PoolConfig,
    pub secondary: PoolConfig,
    /// Number of interleaved slices per fan-out job. `None` uses hardware concurrency.
    pub fan_out_width: Option<usize>,
    /// Upper bound for draw-time reads. `None` blocks until the task completes.
    pub read_timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lazy_recomputing: true,
            primary: PoolConfig::named("chart-primary"),
            secondary: PoolConfig::named("chart-secondary"),
            fan_out_width: None,
            read_timeout_ms: None,
        }
    }
}

impl CacheConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CacheError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (label, pool) in [("primary", &self.primary), ("secondary", &self.secondary)] {
            if pool.workers == Some(0) {
                return Err(CacheError::Config(format!(
                    "{label} pool needs at least one worker"
                )));
            }
        }
        if self.fan_out_width == Some(0) {
            return Err(CacheError::Config("fan_out_width must be at least 1".into()));
        }
        Ok(())
    }

    pub fn resolved_fan_out_width(&self) -> usize {
        self.fan_out_width.unwrap_or_else(hardware_concurrency).max(1)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}
