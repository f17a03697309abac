//! Pie / donut slices.

use glam::Vec2;
use std::f32::consts::TAU;
use std::sync::Arc;

use super::ChartElement;
use crate::canvas::Canvas;
use crate::compute::{ComputeSlot, ComputeTask, PoolKind};
use crate::context::ChartContext;
use crate::data_types::ArcConfig;
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::Result;

/// Start angle and sweep of one slice, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceAngles {
    pub start: f32,
    pub sweep: f32,
}

impl SliceAngles {
    pub fn mid(&self) -> f32 {
        self.start + self.sweep / 2.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SliceLabel {
    pub at: Vec2,
    pub text: String,
}

pub struct ArcElement {
    name: String,
    config: ArcConfig,
    values: Arc<[f64]>,
    center: Vec2,
    radius: f32,
    angles: ComputeSlot<Vec<SliceAngles>>,
    labels: ComputeSlot<Vec<SliceLabel>>,
    dirty: DirtyCounter,
}

/// Slice angles proportional to `values`. Negative values count as zero;
/// an all-zero input yields zero sweeps.
pub fn slice_angles(values: &[f64], start_angle: f32) -> Vec<SliceAngles> {
    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    let mut start = start_angle;
    values
        .iter()
        .map(|v| {
            let sweep = if total > 0.0 {
                (v.max(0.0) / total) as f32 * TAU
            } else {
                0.0
            };
            let slice = SliceAngles { start, sweep };
            start += sweep;
            slice
        })
        .collect()
}

fn slice_labels(angles: &[SliceAngles], center: Vec2, label_radius: f32) -> Vec<SliceLabel> {
    angles
        .iter()
        .map(|a| {
            let mid = a.mid();
            SliceLabel {
                // Clockwise from 12 o'clock, screen Y pointing down.
                at: center + Vec2::new(mid.sin(), -mid.cos()) * label_radius,
                text: format!("{:.1}%", a.sweep / TAU * 100.0),
            }
        })
        .collect()
}

impl ArcElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, values: Vec<f64>) -> Self {
        let name = name.into();
        Self {
            angles: ctx.slot(&format!("{name}.angles"), PoolKind::Primary),
            labels: ctx.slot(&format!("{name}.labels"), PoolKind::Secondary),
            name,
            config: ArcConfig::default(),
            values: values.into(),
            center: Vec2::ZERO,
            radius: 0.0,
            dirty: DirtyCounter::dirty(),
        }
    }

    pub fn set_values(&mut self, values: Vec<f64>) {
        self.values = values.into();
        self.mark_dirty();
    }

    pub fn set_geometry(&mut self, center: Vec2, radius: f32) {
        self.center = center;
        self.radius = radius;
        self.mark_dirty();
    }

    pub fn set_config(&mut self, config: ArcConfig) {
        self.config = config;
        self.mark_dirty();
    }

    pub fn angles(&self, ctx: &ChartContext) -> Result<Arc<Vec<SliceAngles>>> {
        ctx.read(&self.angles)
    }

    pub fn labels(&self, ctx: &ChartContext) -> Result<Arc<Vec<SliceLabel>>> {
        ctx.read(&self.labels)
    }
}

impl TracksDirty for ArcElement {
    fn dirty_counter(&self) -> &DirtyCounter {
        &self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }
}

impl ChartElement for ArcElement {
    fn name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        if !ctx.should_refresh(&self.dirty) {
            return Ok(false);
        }
        let values = self.values.clone();

        let start_angle = self.config.start_angle;
        self.angles.recompute(ComputeTask::new(
            format!("{}:angles", self.name),
            move || slice_angles(&values, start_angle),
        ));

        let angles = self.angles.clone();
        let center = self.center;
        let label_radius = self.radius * self.config.label_radius_pct;
        self.labels.recompute(ComputeTask::fallible(
            format!("{}:labels", self.name),
            move || Ok(slice_labels(&angles.read()?, center, label_radius)),
        ));

        self.reset();
        Ok(true)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let angles = ctx.read(&self.angles)?;
        let palette = &self.config.colors;
        for (i, slice) in angles.iter().enumerate() {
            if slice.sweep <= 0.0 || palette.is_empty() {
                continue;
            }
            let fill = palette[i % palette.len()];
            canvas.arc(self.center, self.radius, slice.start, slice.sweep, fill);
        }

        let labels = ctx.read(&self.labels)?;
        for (label, slice) in labels.iter().zip(angles.iter()) {
            if slice.sweep > 0.0 {
                canvas.text(label.at, &label.text, self.config.label_color);
            }
        }
        Ok(())
    }
}
