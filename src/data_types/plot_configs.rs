use serde::{Deserialize, Serialize};

use super::axis::{AxisEdge, AxisFormat};

/// Straight RGBA color, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const BLUE: Rgba = Rgba::new(0.2, 0.4, 0.9, 1.0);
    pub const GREEN: Rgba = Rgba::new(0.2, 0.7, 0.3, 1.0);
    pub const RED: Rgba = Rgba::new(0.85, 0.2, 0.2, 1.0);
    pub const GRAY: Rgba = Rgba::new(0.6, 0.6, 0.6, 1.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub fn alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation between two colors.
    pub fn mix(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinePlotConfig {
    pub color: Rgba,
    pub line_width: f32,
}

impl Default for LinePlotConfig {
    fn default() -> Self {
        Self {
            color: Rgba::BLUE,
            line_width: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaPlotConfig {
    pub line_color: Rgba,
    pub fill_color: Rgba,
    pub line_width: f32,
    /// Data-space Y the area closes against.
    pub baseline: f64,
}

impl Default for AreaPlotConfig {
    fn default() -> Self {
        Self {
            line_color: Rgba::BLUE,
            fill_color: Rgba::BLUE.alpha(0.3),
            line_width: 2.0,
            baseline: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarPlotConfig {
    pub color: Rgba,
    /// 0.0 to 1.0 relative to data spacing
    pub bar_width_pct: f32,
    pub baseline: f64,
}

impl Default for BarPlotConfig {
    fn default() -> Self {
        Self {
            color: Rgba::BLUE,
            bar_width_pct: 0.8,
            baseline: 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArcConfig {
    pub colors: Vec<Rgba>,
    pub label_color: Rgba,
    /// Angle of the first slice, radians, clockwise from 12 o'clock.
    pub start_angle: f32,
    /// Label distance from the center, relative to the radius.
    pub label_radius_pct: f32,
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            colors: vec![Rgba::BLUE, Rgba::GREEN, Rgba::RED, Rgba::GRAY],
            label_color: Rgba::WHITE,
            start_angle: 0.0,
            label_radius_pct: 0.7,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotConfig {
    pub box_color: Rgba,
    pub whisker_color: Rgba,
    /// 0.0 to 1.0 relative to the slot width of one group
    pub box_width_pct: f32,
}

impl Default for BoxPlotConfig {
    fn default() -> Self {
        Self {
            box_color: Rgba::BLUE.alpha(0.5),
            whisker_color: Rgba::GRAY,
            box_width_pct: 0.6,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub edge: AxisEdge,
    pub format: AxisFormat,
    pub tick_count: usize,
    pub tick_length: f32,
    pub color: Rgba,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            edge: AxisEdge::Bottom,
            format: AxisFormat::Numeric,
            tick_count: 10,
            tick_length: 5.0,
            color: Rgba::GRAY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RasterConfig {
    pub width: u32,
    pub height: u32,
    pub low: Rgba,
    pub high: Rgba,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            low: Rgba::new(0.0, 0.0, 0.0, 0.0),
            high: Rgba::RED,
        }
    }
}
