use std::sync::Arc;

use crate::compute::{ArraySlot, ComputeSlot, Mapper, PoolKind};
use crate::context::ChartContext;
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::{CacheError, Result};

/// Data array plus an elementwise mapper, with the mapped values cached in a slot.
///
/// This is the shared building block of the concrete elements: setters mark
/// the series dirty and `prepare` fans the mapper out over the data when needed.
pub struct MappedSeries<D, V> {
    name: String,
    data: Option<Arc<[D]>>,
    mapper: Option<Mapper<D, V>>,
    values: ArraySlot<V>,
    dirty: DirtyCounter,
}

impl<D, V> MappedSeries<D, V>
where
    D: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(ctx: &ChartContext, name: impl Into<String>) -> Self {
        Self::on_pool(ctx, name, PoolKind::Primary)
    }

    pub fn on_pool(ctx: &ChartContext, name: impl Into<String>, kind: PoolKind) -> Self {
        let name = name.into();
        let values = ctx.array_slot(&format!("{name}.values"), kind, 0);
        Self {
            name,
            data: None,
            mapper: None,
            values,
            dirty: DirtyCounter::new(),
        }
    }

    /// Builds a series whose slot is already sized for `data`.
    pub fn with_data(ctx: &ChartContext, name: impl Into<String>, data: impl Into<Arc<[D]>>) -> Self {
        let mut series = Self::new(ctx, name);
        series.set_data(data);
        series
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_data(&mut self, data: impl Into<Arc<[D]>>) {
        let data = data.into();
        self.values.resize(data.len());
        self.data = Some(data);
        self.mark_dirty();
    }

    pub fn set_mapper(&mut self, mapper: Mapper<D, V>) {
        self.mapper = Some(mapper);
        self.mark_dirty();
    }

    pub fn data(&self) -> Result<&Arc<[D]>> {
        self.data
            .as_ref()
            .ok_or_else(|| CacheError::missing_input(&self.name, "data"))
    }

    pub fn len(&self) -> usize {
        self.values.cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dispatches a recompute if the series changed (or lazy recomputing is off).
    /// Returns whether a recompute was dispatched.
    pub fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        if !ctx.should_refresh(&self.dirty) {
            return Ok(false);
        }
        let data = self.data()?.clone();
        let mapper = self
            .mapper
            .clone()
            .ok_or_else(|| CacheError::missing_input(&self.name, "mapper"))?;
        self.values.recompute_map(data, mapper);
        self.reset();
        Ok(true)
    }

    pub fn slot(&self) -> &ComputeSlot<Vec<V>> {
        self.values.as_slot()
    }

    /// Blocking read of the mapped values.
    pub fn read(&self, ctx: &ChartContext) -> Result<Arc<Vec<V>>> {
        ctx.read(self.slot())
    }
}

impl<D, V> TracksDirty for MappedSeries<D, V> {
    fn dirty_counter(&self) -> &DirtyCounter {
        &self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }
}
