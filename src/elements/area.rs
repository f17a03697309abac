// Area plot implementation

use glam::Vec2;

use super::line::screen_mapper;
use super::series::MappedSeries;
use super::ChartElement;
use crate::canvas::Canvas;
use crate::compute::{ComputeSlot, ComputeTask, PoolKind};
use crate::context::ChartContext;
use crate::data_types::{AreaPlotConfig, PlotPoint};
use crate::dirty::{DirtyCounter, Recomputable, TracksDirty};
use crate::error::{CacheError, Result};
use crate::transform::PlotTransform;

/// Area plot type: a line plus the polygon closing it against a baseline.
///
/// The outline task waits on the coordinate slot, so it runs on the secondary pool.
/// Style changes only invalidate the outline; data and transform changes
/// invalidate both slots.
pub struct AreaElement {
    config: AreaPlotConfig,
    transform: Option<PlotTransform>,
    series: MappedSeries<PlotPoint, Vec2>,
    outline: ComputeSlot<Vec<Vec2>>,
    outline_dirty: DirtyCounter,
}

impl AreaElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, data: Vec<PlotPoint>) -> Self {
        let series = MappedSeries::with_data(ctx, name, data);
        let outline = ctx.slot(&format!("{}.outline", series.name()), PoolKind::Secondary);
        Self {
            config: AreaPlotConfig::default(),
            transform: None,
            series,
            outline,
            outline_dirty: DirtyCounter::new(),
        }
    }

    pub fn set_data(&mut self, data: Vec<PlotPoint>) {
        self.series.set_data(data);
    }

    pub fn set_transform(&mut self, transform: PlotTransform) {
        self.transform = Some(transform);
        self.series.set_mapper(screen_mapper(transform));
    }

    pub fn set_config(&mut self, config: AreaPlotConfig) {
        self.config = config;
        self.outline_dirty.mark_dirty();
    }

    pub fn outline(&self, ctx: &ChartContext) -> Result<std::sync::Arc<Vec<Vec2>>> {
        ctx.read(&self.outline)
    }
}

/// Closes a screen-space polyline down to `baseline_y`. Fewer than two points yield nothing.
fn close_to_baseline(coords: &[Vec2], baseline_y: f32) -> Vec<Vec2> {
    let (Some(first), Some(last)) = (coords.first(), coords.last()) else {
        return Vec::new();
    };
    if coords.len() < 2 {
        return Vec::new();
    }
    let mut polygon = Vec::with_capacity(coords.len() + 2);
    polygon.push(Vec2::new(first.x, baseline_y));
    polygon.extend_from_slice(coords);
    polygon.push(Vec2::new(last.x, baseline_y));
    polygon
}

impl Recomputable for AreaElement {
    fn mark_dirty(&mut self) {
        self.series.mark_dirty();
    }

    fn needs_recompute(&self) -> bool {
        self.series.needs_recompute() || self.outline_dirty.needs_recompute()
    }

    fn reset(&mut self) {
        self.series.reset();
        self.outline_dirty.reset();
    }
}

impl ChartElement for AreaElement {
    fn name(&self) -> &str {
        self.series.name()
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        let refresh_coords = ctx.should_refresh(self.series.dirty_counter());
        if !refresh_coords && !self.outline_dirty.needs_recompute() {
            return Ok(false);
        }
        let transform = self
            .transform
            .ok_or_else(|| CacheError::missing_input(self.series.name(), "transform"))?;
        if refresh_coords {
            self.series.prepare(ctx)?;
        }

        let coords = self.series.slot().clone();
        let baseline_y = transform.y_data_to_screen(self.config.baseline);
        self.outline.recompute(ComputeTask::fallible(
            format!("{}:outline", self.series.name()),
            move || Ok(close_to_baseline(&coords.read()?, baseline_y)),
        ));
        self.outline_dirty.reset();
        Ok(true)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let outline = ctx.read(&self.outline)?;
        if outline.is_empty() {
            return Ok(());
        }
        canvas.polygon(&outline, self.config.fill_color);

        let coords = self.series.read(ctx)?;
        canvas.polyline(&coords, self.config.line_color, self.config.line_width);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, PoolConfig};

    fn context() -> ChartContext {
        ChartContext::new(CacheConfig {
            primary: PoolConfig::named("area-primary").with_workers(2),
            secondary: PoolConfig::named("area-secondary").with_workers(2),
            fan_out_width: Some(2),
            ..CacheConfig::default()
        })
        .unwrap()
    }

    fn generations(area: &AreaElement) -> (u64, u64) {
        (area.series.slot().generation(), area.outline.generation())
    }

    #[test]
    fn style_change_refreshes_only_outline() {
        let ctx = context();
        let mut area = AreaElement::new(
            &ctx,
            "area",
            vec![PlotPoint::new(0.0, 5.0), PlotPoint::new(10.0, 5.0)],
        );
        area.set_transform(PlotTransform::linear((0.0, 10.0), (0.0, 10.0), 100.0, 100.0));
        assert!(area.prepare(&ctx).unwrap());
        assert_eq!(generations(&area), (1, 1));
        assert!(!area.prepare(&ctx).unwrap());

        area.set_config(AreaPlotConfig {
            baseline: 5.0,
            ..AreaPlotConfig::default()
        });
        assert!(area.needs_recompute());
        assert!(area.prepare(&ctx).unwrap());
        assert_eq!(generations(&area), (1, 2));
        assert!(!area.needs_recompute());
        assert_eq!(area.outline(&ctx).unwrap().first(), Some(&Vec2::new(0.0, 50.0)));

        area.set_data(vec![PlotPoint::new(0.0, 1.0), PlotPoint::new(10.0, 2.0)]);
        assert!(area.prepare(&ctx).unwrap());
        assert_eq!(generations(&area), (2, 3));
    }

    #[test]
    fn closes_polygon_on_baseline() {
        let coords = [Vec2::new(0.0, 5.0), Vec2::new(10.0, 2.0)];
        let polygon = close_to_baseline(&coords, 20.0);
        assert_eq!(
            polygon,
            vec![
                Vec2::new(0.0, 20.0),
                Vec2::new(0.0, 5.0),
                Vec2::new(10.0, 2.0),
                Vec2::new(10.0, 20.0)
            ]
        );
        assert!(close_to_baseline(&coords[..1], 20.0).is_empty());
    }
}
