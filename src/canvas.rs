//! Drawing surface used by elements in their draw step.
//!
//! Rasterization itself lives outside this crate; elements only issue
//! primitive calls against a [`Canvas`].

use glam::Vec2;

use crate::data_types::Rgba;

/// Axis-aligned rectangle in screen space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let origin = a.min(b);
        Self {
            origin,
            size: a.max(b) - origin,
        }
    }
}

pub trait Canvas {
    fn polyline(&mut self, points: &[Vec2], color: Rgba, width: f32);

    fn polygon(&mut self, points: &[Vec2], fill: Rgba);

    fn rect(&mut self, rect: Rect, fill: Rgba);

    /// Filled circular sector. Angles in radians, clockwise from 12 o'clock.
    fn arc(&mut self, center: Vec2, radius: f32, start: f32, sweep: f32, fill: Rgba);

    fn text(&mut self, at: Vec2, text: &str, color: Rgba);

    /// Blits a tightly packed RGBA8 image.
    fn image(&mut self, origin: Vec2, width: u32, height: u32, rgba: &[u8]);
}

/// A recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Polyline { points: Vec<Vec2>, color: Rgba, width: f32 },
    Polygon { points: Vec<Vec2>, fill: Rgba },
    Rect { rect: Rect, fill: Rgba },
    Arc { center: Vec2, radius: f32, start: f32, sweep: f32, fill: Rgba },
    Text { at: Vec2, text: String, color: Rgba },
    Image { origin: Vec2, width: u32, height: u32, bytes: usize },
}

/// Canvas that stores every call, for headless frames and tests.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn polyline(&mut self, points: &[Vec2], color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn polygon(&mut self, points: &[Vec2], fill: Rgba) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            fill,
        });
    }

    fn rect(&mut self, rect: Rect, fill: Rgba) {
        self.commands.push(DrawCommand::Rect { rect, fill });
    }

    fn arc(&mut self, center: Vec2, radius: f32, start: f32, sweep: f32, fill: Rgba) {
        self.commands.push(DrawCommand::Arc {
            center,
            radius,
            start,
            sweep,
            fill,
        });
    }

    fn text(&mut self, at: Vec2, text: &str, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            color,
        });
    }

    fn image(&mut self, origin: Vec2, width: u32, height: u32, rgba: &[u8]) {
        self.commands.push(DrawCommand::Image {
            origin,
            width,
            height,
            bytes: rgba.len(),
        });
    }
}
