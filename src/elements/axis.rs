use glam::Vec2;
use std::sync::Arc;

use super::ChartElement;
use crate::canvas::Canvas;
use crate::compute::{ComputeSlot, ComputeTask, PoolKind};
use crate::context::ChartContext;
use crate::data_types::{AxisConfig, AxisEdge};
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::Result;
use crate::scales::ChartScale;

/// A tick value and its offset along the axis, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub offset: f32,
}

/// Axis with cached ticks and labels. Labels are formatted from the tick
/// slot, so their task runs on the secondary pool.
pub struct AxisElement {
    name: String,
    config: AxisConfig,
    scale: ChartScale,
    /// Screen position where the axis line starts.
    origin: Vec2,
    ticks: ComputeSlot<Vec<Tick>>,
    labels: ComputeSlot<Vec<String>>,
    dirty: DirtyCounter,
}

impl AxisElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, scale: ChartScale) -> Self {
        let name = name.into();
        Self {
            ticks: ctx.slot(&format!("{name}.ticks"), PoolKind::Primary),
            labels: ctx.slot(&format!("{name}.labels"), PoolKind::Secondary),
            name,
            config: AxisConfig::default(),
            scale,
            origin: Vec2::ZERO,
            dirty: DirtyCounter::dirty(),
        }
    }

    pub fn set_scale(&mut self, scale: ChartScale) {
        self.scale = scale;
        self.mark_dirty();
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn set_config(&mut self, config: AxisConfig) {
        self.config = config;
        self.mark_dirty();
    }

    pub fn ticks(&self, ctx: &ChartContext) -> Result<Arc<Vec<Tick>>> {
        ctx.read(&self.ticks)
    }

    pub fn labels(&self, ctx: &ChartContext) -> Result<Arc<Vec<String>>> {
        ctx.read(&self.labels)
    }

    fn along(&self, offset: f32) -> Vec2 {
        if self.config.edge.is_horizontal() {
            self.origin + Vec2::new(offset, 0.0)
        } else {
            self.origin + Vec2::new(0.0, offset)
        }
    }

    /// Unit vector pointing away from the plot area.
    fn outward(&self) -> Vec2 {
        match self.config.edge {
            AxisEdge::Bottom => Vec2::Y,
            AxisEdge::Top => Vec2::NEG_Y,
            AxisEdge::Left => Vec2::NEG_X,
            AxisEdge::Right => Vec2::X,
        }
    }
}

impl TracksDirty for AxisElement {
    fn dirty_counter(&self) -> &DirtyCounter {
        &self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }
}

impl ChartElement for AxisElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        if !ctx.should_refresh(&self.dirty) {
            return Ok(false);
        }
        let scale = self.scale;
        let count = self.config.tick_count;
        self.ticks.recompute(ComputeTask::new(format!("{}:ticks", self.name), move || {
            let (r0, r1) = scale.range();
            let (lo, hi) = (r0.min(r1) - 0.5, r0.max(r1) + 0.5);
            scale
                .ticks(count)
                .into_iter()
                .map(|value| Tick {
                    value,
                    offset: scale.map(value),
                })
                .filter(|t| t.offset >= lo && t.offset <= hi)
                .collect()
        }));

        let ticks = self.ticks.clone();
        let format = self.config.format;
        self.labels.recompute(ComputeTask::fallible(
            format!("{}:labels", self.name),
            move || {
                Ok(ticks
                    .read()?
                    .iter()
                    .map(|t| scale.format_tick(t.value, &format))
                    .collect())
            },
        ));

        self.reset();
        Ok(true)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let (r0, r1) = self.scale.range();
        canvas.polyline(&[self.along(r0), self.along(r1)], self.config.color, 1.0);

        let ticks = ctx.read(&self.ticks)?;
        let labels = ctx.read(&self.labels)?;
        let out = self.outward() * self.config.tick_length;
        for (tick, label) in ticks.iter().zip(labels.iter()) {
            let base = self.along(tick.offset);
            canvas.polyline(&[base, base + out], self.config.color, 1.0);
            canvas.text(base + out * 2.0, label, self.config.color);
        }
        Ok(())
    }
}
