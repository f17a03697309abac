//! Top-level owner of the worker pools.
//!
//! Every element receives a `&ChartContext` during `prepare` and builds its
//! slots from it; nothing in the crate reaches for a global pool.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::compute::{ArraySlot, ComputeSlot, PoolKind, WorkerPool};
use crate::config::CacheConfig;
use crate::dirty::{DirtyCounter, Recomputable};
use crate::error::Result;

#[derive(Debug)]
pub struct ChartContext {
    config: CacheConfig,
    primary: Arc<WorkerPool>,
    secondary: Arc<WorkerPool>,
    fan_out_width: usize,
}

impl ChartContext {
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let primary = Arc::new(WorkerPool::new(PoolKind::Primary, &config.primary)?);
        let secondary = Arc::new(WorkerPool::new(PoolKind::Secondary, &config.secondary)?);
        let fan_out_width = config.resolved_fan_out_width();
        Ok(Self {
            config,
            primary,
            secondary,
            fan_out_width,
        })
    }

    /// Builds a context from a JSON document, for application bootstrap.
    pub fn from_json(json: &str) -> eyre::Result<Self> {
        use eyre::WrapErr;
        let config = CacheConfig::from_json(json).wrap_err("parsing cache configuration")?;
        Self::new(config).wrap_err("starting worker pools")
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn pool(&self, kind: PoolKind) -> &Arc<WorkerPool> {
        match kind {
            PoolKind::Primary => &self.primary,
            PoolKind::Secondary => &self.secondary,
        }
    }

    pub fn fan_out_width(&self) -> usize {
        self.fan_out_width
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.config.read_timeout()
    }

    pub fn slot<T: Send + Sync + 'static>(&self, name: &str, kind: PoolKind) -> ComputeSlot<T> {
        ComputeSlot::new(name, self.pool(kind).clone())
    }

    pub fn array_slot<V: Send + Sync + 'static>(
        &self,
        name: &str,
        kind: PoolKind,
        cardinality: usize,
    ) -> ArraySlot<V> {
        ArraySlot::with_cardinality(name, self.pool(kind).clone(), self.fan_out_width, cardinality)
    }

    /// Whether an element with this dirty state must refresh its slots this frame.
    pub fn should_refresh(&self, dirty: &DirtyCounter) -> bool {
        !self.config.lazy_recomputing || dirty.needs_recompute()
    }

    /// Reads a slot, honoring the configured read timeout.
    pub fn read<T: Send + Sync + 'static>(&self, slot: &ComputeSlot<T>) -> Result<Arc<T>> {
        match self.read_timeout() {
            Some(timeout) => slot.read_timeout(timeout),
            None => slot.read(),
        }
    }

    /// Stops both pools and joins their threads.
    ///
    /// Returns `false` if a pool was still referenced (e.g. by a live element's
    /// slot); its threads then exit once the last reference is dropped.
    pub fn shutdown(self) -> bool {
        let mut joined = true;
        for pool in [self.primary, self.secondary] {
            match Arc::try_unwrap(pool) {
                Ok(pool) => pool.shutdown(),
                Err(shared) => {
                    debug!(pool = %shared.kind(), "pool still referenced at shutdown");
                    joined = false;
                }
            }
        }
        joined
    }
}
