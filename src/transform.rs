//! Transform helper for coordinate projection

use glam::{DVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::scales::ChartScale;

/// Data-space to screen-space projection for one plot area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotTransform {
    pub x_scale: ChartScale,
    pub y_scale: ChartScale,
    /// Top-left corner of the plot area on the canvas.
    pub origin: Vec2,
}

impl PlotTransform {
    pub fn new(x_scale: ChartScale, y_scale: ChartScale, origin: Vec2) -> Self {
        Self {
            x_scale,
            y_scale,
            origin,
        }
    }

    /// Linear transform of a `width` x `height` plot area; Y grows downwards on screen.
    pub fn linear(x_domain: (f64, f64), y_domain: (f64, f64), width: f32, height: f32) -> Self {
        Self::new(
            ChartScale::new_linear(x_domain, (0.0, width)),
            ChartScale::new_linear(y_domain, (height, 0.0)),
            Vec2::ZERO,
        )
    }

    pub fn data_to_screen(&self, point: DVec2) -> Vec2 {
        self.origin + Vec2::new(self.x_scale.map(point.x), self.y_scale.map(point.y))
    }

    pub fn screen_to_data(&self, point: Vec2) -> DVec2 {
        let local = point - self.origin;
        DVec2::new(self.x_scale.invert(local.x), self.y_scale.invert(local.y))
    }

    pub fn x_data_to_screen(&self, x: f64) -> f32 {
        self.origin.x + self.x_scale.map(x)
    }

    pub fn y_data_to_screen(&self, y: f64) -> f32 {
        self.origin.y + self.y_scale.map(y)
    }

    /// Screen-space size of the plot area.
    pub fn size(&self) -> Vec2 {
        let (x0, x1) = self.x_scale.range();
        let (y0, y1) = self.y_scale.range();
        Vec2::new((x1 - x0).abs(), (y1 - y0).abs())
    }
}
