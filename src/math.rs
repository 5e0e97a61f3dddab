//! Small math primitives shared by the kernels: colors, UV rectangles and lerp.
//!
//! Vectors and affine transforms come straight from `glam`.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

pub use glam::{Affine2, Vec2};

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Linear RGBA color, channels nominally in [0, 1]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Channel-wise interpolation
    #[inline]
    pub fn lerp(self, end: Color, t: f32) -> Color {
        Color {
            r: lerp(self.r, end.r, t),
            g: lerp(self.g, end.g, t),
            b: lerp(self.b, end.b, t),
            a: lerp(self.a, end.a, t),
        }
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, a: f32) -> Color {
        Color { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(c: [f32; 4]) -> Self {
        Color::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// Normalized texture sub-rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct UvRect {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl UvRect {
    /// Whole texture
    pub const FULL: UvRect = UvRect {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    /// Cell `index` of a `columns` x `rows` sprite sheet, row-major from the top left
    pub fn grid_cell(columns: u32, rows: u32, index: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let col = index % columns;
        let row = (index / columns) % rows;
        let w = 1.0 / columns as f32;
        let h = 1.0 / rows as f32;
        UvRect::new(
            col as f32 * w,
            row as f32 * h,
            (col + 1) as f32 * w,
            (row + 1) as f32 * h,
        )
    }
}

impl Default for UvRect {
    fn default() -> Self {
        UvRect::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_lerp() {
        let start = Color::new(0.0, 0.0, 0.0, 1.0);
        let end = Color::new(1.0, 0.5, 0.0, 0.0);

        let mid = start.lerp(end, 0.5);
        assert_eq!(mid, Color::new(0.5, 0.25, 0.0, 0.5));
        assert_eq!(start.lerp(end, 0.0), start);
        assert_eq!(start.lerp(end, 1.0), end);
    }

    #[test]
    fn test_grid_cell() {
        let cell = UvRect::grid_cell(4, 2, 5);
        assert_eq!(cell, UvRect::new(0.25, 0.5, 0.5, 1.0));

        // Wraps past the last row
        assert_eq!(UvRect::grid_cell(4, 2, 8), UvRect::grid_cell(4, 2, 0));
    }
}
