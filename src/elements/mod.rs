// Chart elements module

pub mod arc;
pub mod area;
pub mod axis;
pub mod bar;
pub mod box_plot;
pub mod line;
pub mod raster;
pub mod series;
pub mod stacked;

pub use arc::ArcElement;
pub use area::AreaElement;
pub use axis::AxisElement;
pub use bar::BarElement;
pub use box_plot::BoxPlotElement;
pub use line::LineElement;
pub use raster::RasterLayer;
pub use series::MappedSeries;
pub use stacked::StackedChart;

use crate::canvas::Canvas;
use crate::context::ChartContext;
use crate::dirty::Recomputable;
use crate::error::Result;

/// A visual element driven once per frame: `prepare` on the owner thread,
/// then `draw`, which blocks on the element's slots.
pub trait ChartElement: Recomputable + Send {
    fn name(&self) -> &str;

    /// Refreshes the element's slots if it is dirty (or lazy recomputing is off).
    /// Returns whether anything was dispatched.
    fn prepare(&mut self, ctx: &ChartContext) -> Result<bool>;

    fn draw(&self, ctx: &ChartContext, canvas: &mut dyn Canvas) -> Result<()>;
}
