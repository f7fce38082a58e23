//! Debug Visualization API
//!
//! Abstract wireframe rendering interface for visualizing world state.
//! Implement [`DebugDraw`] for your graphics backend, set the flag word, and
//! call `World::draw_debug_data` each frame.

use crate::math::{Transform, Vec2};

/// Draw body shapes.
pub const DRAW_SHAPES: u32 = 0x01;
/// Draw joint connections.
pub const DRAW_JOINTS: u32 = 0x02;
/// Draw broad-phase fat AABBs.
pub const DRAW_AABBS: u32 = 0x04;
/// Draw broad-phase pairs.
pub const DRAW_PAIRS: u32 = 0x08;
/// Draw body centers of mass.
pub const DRAW_CENTER_OF_MASS: u32 = 0x10;

/// RGB color for debug rendering, channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugColor {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl DebugColor {
    /// Create a new color.
    #[inline]
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Wireframe rendering backend.
pub trait DebugDraw {
    /// Draw a closed polygon outline.
    fn draw_polygon(&mut self, vertices: &[Vec2], color: DebugColor);

    /// Draw a filled polygon.
    fn draw_solid_polygon(&mut self, vertices: &[Vec2], color: DebugColor);

    /// Draw a circle outline.
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: DebugColor);

    /// Draw a filled circle with an axis marker.
    fn draw_solid_circle(&mut self, center: Vec2, radius: f32, axis: Vec2, color: DebugColor);

    /// Draw a line segment.
    fn draw_segment(&mut self, p1: Vec2, p2: Vec2, color: DebugColor);

    /// Draw a transform's coordinate frame.
    fn draw_transform(&mut self, xf: &Transform);
}
