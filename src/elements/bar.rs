use glam::Vec2;
use std::sync::Arc;

use super::series::MappedSeries;
use super::ChartElement;
use crate::canvas::{Canvas, Rect};
use crate::compute::mapper;
use crate::context::ChartContext;
use crate::data_types::{BarPlotConfig, PlotPoint};
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::{CacheError, Result};
use crate::transform::PlotTransform;

/// Bar plot type
pub struct BarElement {
    config: BarPlotConfig,
    transform: Option<PlotTransform>,
    /// Per-bar baselines (stacking). Falls back to `config.baseline`.
    baselines: Option<Arc<[f64]>>,
    spacing: f64,
    series: MappedSeries<PlotPoint, Rect>,
}

/// Smallest positive X distance between consecutive points, 1.0 if there is none.
fn suggested_x_spacing(data: &[PlotPoint]) -> f64 {
    let min = data
        .windows(2)
        .map(|w| (w[1].x - w[0].x).abs())
        .filter(|s| *s > f64::EPSILON)
        .fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        min
    } else {
        1.0
    }
}

/// Screen rectangle of one bar. Both edges are snapped to whole pixels so
/// adjacent bars touch without gaps or 1px overlaps.
fn bar_rect(
    point: &PlotPoint,
    baseline: f64,
    spacing: f64,
    width_pct: f64,
    transform: &PlotTransform,
) -> Rect {
    let half = spacing * width_pct / 2.0;
    let px_start = transform.x_data_to_screen(point.x - half).round();
    let px_end = transform.x_data_to_screen(point.x + half).round();
    let y_top = transform.y_data_to_screen(point.y);
    let y_base = transform.y_data_to_screen(baseline);

    Rect::new(
        Vec2::new(px_start.min(px_end), y_top.min(y_base)),
        Vec2::new(
            (px_end - px_start).abs().max(1.0),
            (y_base - y_top).abs().max(1.0),
        ),
    )
}

impl BarElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, data: Vec<PlotPoint>) -> Self {
        let spacing = suggested_x_spacing(&data);
        Self {
            config: BarPlotConfig::default(),
            transform: None,
            baselines: None,
            spacing,
            series: MappedSeries::with_data(ctx, name, data),
        }
    }

    pub fn set_data(&mut self, data: Vec<PlotPoint>) {
        self.spacing = suggested_x_spacing(&data);
        self.series.set_data(data);
    }

    pub fn set_transform(&mut self, transform: PlotTransform) {
        self.transform = Some(transform);
        self.mark_dirty();
    }

    pub fn set_config(&mut self, config: BarPlotConfig) {
        self.config = config;
        self.mark_dirty();
    }

    pub fn set_baselines(&mut self, baselines: Option<Vec<f64>>) {
        self.baselines = baselines.map(Arc::from);
        self.mark_dirty();
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn rects(&self, ctx: &ChartContext) -> Result<Arc<Vec<Rect>>> {
        self.series.read(ctx)
    }
}

impl TracksDirty for BarElement {
    fn dirty_counter(&self) -> &DirtyCounter {
        self.series.dirty_counter()
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        self.series.dirty_counter_mut()
    }
}

impl ChartElement for BarElement {
    fn name(&self) -> &str {
        self.series.name()
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        if !ctx.should_refresh(self.dirty_counter()) {
            return Ok(false);
        }
        let transform = self
            .transform
            .ok_or_else(|| CacheError::missing_input(self.series.name(), "transform"))?;
        let spacing = self.spacing;
        let width_pct = self.config.bar_width_pct.clamp(0.0, 1.0) as f64;
        let default_baseline = self.config.baseline;
        let baselines = self.baselines.clone();

        self.series.set_mapper(mapper(move |p: &PlotPoint, i, _| {
            let baseline = baselines
                .as_ref()
                .and_then(|b| b.get(i).copied())
                .unwrap_or(default_baseline);
            bar_rect(p, baseline, spacing, width_pct, &transform)
        }));
        self.series.prepare(ctx)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        for rect in self.series.read(ctx)?.iter() {
            canvas.rect(*rect, self.config.color);
        }
        Ok(())
    }
}
