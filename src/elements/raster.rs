//! Heatmap cells rasterized into an RGBA bitmap layer.

use glam::{DVec2, Vec2};
use std::sync::Arc;

use super::ChartElement;
use crate::canvas::Canvas;
use crate::compute::{fan_out, ComputeSlot, ComputeTask, PoolKind};
use crate::context::ChartContext;
use crate::data_types::{HeatmapCell, RasterConfig};
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::{CacheError, Result};
use crate::transform::PlotTransform;

pub type Pixel = [u8; 4];

pub struct RasterLayer {
    name: String,
    config: RasterConfig,
    cells: Option<Arc<[HeatmapCell]>>,
    transform: Option<PlotTransform>,
    bitmap: ComputeSlot<Vec<Pixel>>,
    dirty: DirtyCounter,
}

fn contains(cell: &HeatmapCell, p: DVec2) -> bool {
    let (hw, hh) = (cell.width / 2.0, cell.height / 2.0);
    p.x >= cell.x - hw && p.x < cell.x + hw && p.y >= cell.y - hh && p.y < cell.y + hh
}

/// Colors one bitmap row. The last cell containing a pixel center wins.
fn rasterize_row(
    row: usize,
    cells: &[HeatmapCell],
    transform: &PlotTransform,
    config: &RasterConfig,
) -> Vec<Pixel> {
    let transparent = [0u8; 4];
    (0..config.width as usize)
        .map(|col| {
            let center = transform.origin + Vec2::new(col as f32 + 0.5, row as f32 + 0.5);
            let p = transform.screen_to_data(center);
            cells
                .iter()
                .rev()
                .find(|c| contains(c, p))
                .map(|c| config.low.mix(config.high, c.value).to_rgba8())
                .unwrap_or(transparent)
        })
        .collect()
}

impl RasterLayer {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, cells: Vec<HeatmapCell>) -> Self {
        let name = name.into();
        Self {
            bitmap: ctx.slot(&format!("{name}.bitmap"), PoolKind::Primary),
            name,
            config: RasterConfig::default(),
            cells: Some(cells.into()),
            transform: None,
            dirty: DirtyCounter::dirty(),
        }
    }

    pub fn set_cells(&mut self, cells: Vec<HeatmapCell>) {
        self.cells = Some(cells.into());
        self.mark_dirty();
    }

    pub fn set_transform(&mut self, transform: PlotTransform) {
        self.transform = Some(transform);
        self.mark_dirty();
    }

    pub fn set_config(&mut self, config: RasterConfig) {
        self.config = config;
        self.mark_dirty();
    }

    pub fn bitmap(&self, ctx: &ChartContext) -> Result<Arc<Vec<Pixel>>> {
        ctx.read(&self.bitmap)
    }
}

impl TracksDirty for RasterLayer {
    fn dirty_counter(&self) -> &DirtyCounter {
        &self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }
}

impl ChartElement for RasterLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        if !ctx.should_refresh(&self.dirty) {
            return Ok(false);
        }
        let cells = self
            .cells
            .clone()
            .ok_or_else(|| CacheError::missing_input(&self.name, "cells"))?;
        let transform = self
            .transform
            .ok_or_else(|| CacheError::missing_input(&self.name, "transform"))?;
        let config = self.config.clone();
        let pool = self.bitmap.pool().clone();
        let width = ctx.fan_out_width();

        // One fan-out slice per group of rows; rows are woven back in order.
        self.bitmap.recompute(ComputeTask::fallible(
            format!("{}:rasterize", self.name),
            move || {
                let rows = fan_out(&pool, width, config.height as usize, |row| {
                    rasterize_row(row, &cells, &transform, &config)
                })?;
                Ok(rows.into_iter().flatten().collect())
            },
        ));
        self.reset();
        Ok(true)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let bitmap = ctx.read(&self.bitmap)?;
        let origin = self.transform.map(|t| t.origin).unwrap_or(Vec2::ZERO);
        canvas.image(
            origin,
            self.config.width,
            self.config.height,
            bytemuck::cast_slice(bitmap.as_slice()),
        );
        Ok(())
    }
}
