use glam::{DVec2, Vec2};

use super::series::MappedSeries;
use super::ChartElement;
use crate::canvas::Canvas;
use crate::compute::{mapper, Mapper};
use crate::context::ChartContext;
use crate::data_types::{LinePlotConfig, PlotPoint};
use crate::dirty::{DirtyCounter, TracksDirty};
use crate::error::Result;
use crate::transform::PlotTransform;

/// Projects data points to screen coordinates with `transform`.
pub(crate) fn screen_mapper(transform: PlotTransform) -> Mapper<PlotPoint, Vec2> {
    mapper(move |p: &PlotPoint, _, _| transform.data_to_screen(DVec2::new(p.x, p.y)))
}

/// Line plot type
pub struct LineElement {
    pub config: LinePlotConfig,
    series: MappedSeries<PlotPoint, Vec2>,
}

impl LineElement {
    pub fn new(ctx: &ChartContext, name: impl Into<String>, data: Vec<PlotPoint>) -> Self {
        Self {
            config: LinePlotConfig::default(),
            series: MappedSeries::with_data(ctx, name, data),
        }
    }

    pub fn set_data(&mut self, data: Vec<PlotPoint>) {
        self.series.set_data(data);
    }

    pub fn set_transform(&mut self, transform: PlotTransform) {
        self.series.set_mapper(screen_mapper(transform));
    }

    pub fn set_config(&mut self, config: LinePlotConfig) {
        self.config = config;
    }

    /// Screen coordinates of every point, blocking until they are computed.
    pub fn coordinates(&self, ctx: &ChartContext) -> Result<std::sync::Arc<Vec<Vec2>>> {
        self.series.read(ctx)
    }
}

impl TracksDirty for LineElement {
    fn dirty_counter(&self) -> &DirtyCounter {
        self.series.dirty_counter()
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        self.series.dirty_counter_mut()
    }
}

impl ChartElement for LineElement {
    fn name(&self) -> &str {
        self.series.name()
    }

    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        self.series.prepare(ctx)
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        let coords = self.series.read(ctx)?;
        if coords.len() < 2 {
            return Ok(());
        }

        // Skip points that land on the same pixel as the previous one.
        let mut path: Vec<Vec2> = Vec::with_capacity(coords.len());
        for (i, p) in coords.iter().enumerate() {
            if let Some(last) = path.last() {
                let is_last = i + 1 == coords.len();
                if !is_last && (p.x - last.x).abs() < 0.5 && (p.y - last.y).abs() < 1.0 {
                    continue;
                }
            }
            path.push(*p);
        }

        canvas.polyline(&path, self.config.color, self.config.line_width);
        Ok(())
    }
}
