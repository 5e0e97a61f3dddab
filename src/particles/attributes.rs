//! Per-particle attribute kinds.
//!
//! Each kind lives in its own dense array inside [`ParticleData`](super::ParticleData),
//! allocated the first time a stage asks for it. A particle's full state is
//! whatever subset of these arrays the registered stages have requested.

use std::any::Any;

use crate::constants::render::DEFAULT_PARTICLE_SIZE;
use crate::math::{lerp, Color, Vec2};
use crate::particles::render::TextureRegion;

/// Marker for types that can be stored as a per-particle attribute array
pub trait Attribute: Any + Send + Sync {
    /// Short name used in log output
    const NAME: &'static str;
}

/// World-space position
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

/// Velocity in units per second
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Per-step force accumulator, cleared by the movement updater every step
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Acceleration(pub Vec2);

/// Quad edge length, interpolated from `start` to `end` over the lifetime
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub current: f32,
    pub start: f32,
    pub end: f32,
}

impl Size {
    pub fn constant(size: f32) -> Self {
        Self {
            current: size,
            start: size,
            end: size,
        }
    }

    #[inline]
    pub fn interpolate(&mut self, t: f32) {
        self.current = lerp(self.start, self.end, t);
    }
}

impl Default for Size {
    fn default() -> Self {
        Size::constant(DEFAULT_PARTICLE_SIZE)
    }
}

/// Rotation in degrees, interpolated from `start` to `end` over the lifetime
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Angle {
    pub current: f32,
    pub start: f32,
    pub end: f32,
}

impl Angle {
    #[inline]
    pub fn interpolate(&mut self, t: f32) {
        self.current = lerp(self.start, self.end, t);
    }
}

/// Tint, interpolated from `start` to `end` over the lifetime
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParticleColor {
    pub current: Color,
    pub start: Color,
    pub end: Color,
}

impl ParticleColor {
    pub fn constant(color: Color) -> Self {
        Self {
            current: color,
            start: color,
            end: color,
        }
    }

    #[inline]
    pub fn interpolate(&mut self, t: f32) {
        self.current = self.start.lerp(self.end, t);
    }
}

/// Lifetime bookkeeping
///
/// `interpolation` runs from 0 at birth to 1 at death and is what the
/// color, size and rotation updaters read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Time {
    pub remaining: f32,
    pub lifetime: f32,
    pub interpolation: f32,
}

impl Time {
    pub fn new(lifetime: f32) -> Self {
        Self {
            remaining: lifetime,
            lifetime,
            interpolation: 0.0,
        }
    }
}

/// Texture region a particle is drawn with; `None` draws with the blank region
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureBinding {
    pub region: Option<TextureRegion>,
}

/// Flipbook animation state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub index: u32,
    pub timer: f32,
}

impl Attribute for Position {
    const NAME: &'static str = "position";
}

impl Attribute for Velocity {
    const NAME: &'static str = "velocity";
}

impl Attribute for Acceleration {
    const NAME: &'static str = "acceleration";
}

impl Attribute for Size {
    const NAME: &'static str = "size";
}

impl Attribute for Angle {
    const NAME: &'static str = "angle";
}

impl Attribute for ParticleColor {
    const NAME: &'static str = "color";
}

impl Attribute for Time {
    const NAME: &'static str = "time";
}

impl Attribute for TextureBinding {
    const NAME: &'static str = "texture";
}

impl Attribute for Frame {
    const NAME: &'static str = "frame";
}
