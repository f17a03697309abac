use glam::{DVec2, Vec2};
use std::sync::Arc;

use super::series::MappedSeries;
use super::ChartElement;
use crate::canvas::{Canvas, Rect};
use crate::compute::mapper;
use crate::context::ChartContext;
use crate::data_types::{BoxPlotConfig, BoxStats, SampleGroup};
use crate::dirty::{DirtyCounter, TracksDirty};
use crate::error::{CacheError, Result};
use crate::transform::PlotTransform;

/// Box plot over labeled sample groups. Group `i` is drawn centered on x = i.
///
/// Only the summaries are cached; the transform is applied at draw time, so
/// changing it does not dirty the element.
pub struct BoxPlotElement {
    config: BoxPlotConfig,
    transform: Option<PlotTransform>,
    stats: MappedSeries<SampleGroup, Option<BoxStats>>,
}

/// Linear-interpolated quantile of sorted, NaN-free samples.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Five-number summary, `None` for groups without finite samples.
pub fn box_stats(samples: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(BoxStats {
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

impl BoxPlotElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, groups: Vec<SampleGroup>) -> Self {
        let mut stats = MappedSeries::with_data(ctx, name, groups);
        stats.set_mapper(mapper(|g: &SampleGroup, _, _| box_stats(&g.samples)));
        Self {
            config: BoxPlotConfig::default(),
            transform: None,
            stats,
        }
    }

    pub fn set_groups(&mut self, groups: Vec<SampleGroup>) {
        self.stats.set_data(groups);
    }

    pub fn set_transform(&mut self, transform: PlotTransform) {
        self.transform = Some(transform);
    }

    pub fn set_config(&mut self, config: BoxPlotConfig) {
        self.config = config;
    }

    pub fn stats(&self, ctx: &ChartContext) -> Result<Arc<Vec<Option<BoxStats>>>> {
        self.stats.read(ctx)
    }
}

impl TracksDirty for BoxPlotElement {
    fn dirty_counter(&self) -> &DirtyCounter {
        self.stats.dirty_counter()
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        self.stats.dirty_counter_mut()
    }
}

impl ChartElement for BoxPlotElement {
    fn name(&self) -> &str {
        self.stats.name()
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        self.stats.prepare(ctx)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let transform = self
            .transform
            .ok_or_else(|| CacheError::missing_input(self.stats.name(), "transform"))?;
        let stats = self.stats.read(ctx)?;
        let half = self.config.box_width_pct.clamp(0.0, 1.0) as f64 / 2.0;
        let at = |x: f64, y: f64| -> Vec2 { transform.data_to_screen(DVec2::new(x, y)) };

        for (i, s) in stats.iter().enumerate() {
            let Some(s) = s else { continue };
            let x = i as f64;

            canvas.polyline(&[at(x, s.min), at(x, s.q1)], self.config.whisker_color, 1.0);
            canvas.polyline(&[at(x, s.q3), at(x, s.max)], self.config.whisker_color, 1.0);
            canvas.rect(
                Rect::from_corners(at(x - half, s.q3), at(x + half, s.q1)),
                self.config.box_color,
            );
            canvas.polyline(
                &[at(x - half, s.median), at(x + half, s.median)],
                self.config.whisker_color,
                2.0,
            );
        }
        Ok(())
    }
}
