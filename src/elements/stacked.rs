use super::{BarElement, ChartElement};
use crate::canvas::Canvas;
use crate::context::ChartContext;
use crate::data_types::{BarPlotConfig, PlotPoint, Rgba};
use crate::dirty::Recomputable;
use crate::error::Result;
use crate::transform::PlotTransform;

/// Composite of sub-elements. It has no dirty state of its own: every
/// dirty-tracking call and every frame step is forwarded to the children.
pub struct StackedChart {
    name: String,
    children: Vec<Box<dyn ChartElement>>,
}

impl StackedChart {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: Box<dyn ChartElement>) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Box<dyn ChartElement>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Box<dyn ChartElement>] {
        &mut self.children
    }

    /// Stacked bars: layer `k` sits on top of the sum of layers `0..k` at the same index.
    pub fn bars(
        ctx: &ChartContext,
        name: impl Into<String>,
        layers: Vec<Vec<PlotPoint>>,
        colors: &[Rgba],
        transform: PlotTransform,
    ) -> Self {
        let mut chart = Self::new(name);
        let mut running: Vec<f64> = Vec::new();
        for (k, layer) in layers.into_iter().enumerate() {
            if running.len() < layer.len() {
                running.resize(layer.len(), 0.0);
            }
            let baselines: Vec<f64> = running[..layer.len()].to_vec();
            let stacked: Vec<PlotPoint> = layer
                .iter()
                .zip(&baselines)
                .map(|(p, base)| PlotPoint::new(p.x, base + p.y))
                .collect();
            for (acc, p) in running.iter_mut().zip(&layer) {
                *acc += p.y;
            }

            let mut bar = BarElement::new(ctx, format!("{}.layer{k}", chart.name), stacked);
            bar.set_baselines(Some(baselines));
            bar.set_transform(transform);
            if !colors.is_empty() {
                bar.set_config(BarPlotConfig {
                    color: colors[k % colors.len()],
                    ..BarPlotConfig::default()
                });
            }
            chart.push(Box::new(bar));
        }
        chart
    }
}

impl Recomputable for StackedChart {
    fn mark_dirty(&mut self) {
        self.children.iter_mut().for_each(|c| c.mark_dirty());
    }

    fn needs_recompute(&self) -> bool {
        self.children.iter().any(|c| c.needs_recompute())
    }

    fn reset(&mut self) {
        self.children.iter_mut().for_each(|c| c.reset());
    }
}

impl ChartElement for StackedChart {
    fn name(&self) -> &str {
        &self.name
    }

    /// Prepares every child; the first error is returned after all children ran.
    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool> {
        let mut refreshed = false;
        let mut first_err = None;
        for child in self.children.iter_mut() {
            match child.prepare(ctx) {
                Ok(r) => refreshed |= r,
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(refreshed),
        }
    }

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()> {
        for child in &self.children {
            child.draw(ctx, canvas)?;
        }
        Ok(())
    }
}
