//! Spawners place newly emitted particles.
//!
//! An emission of `n` particles over `k` spawners is split into contiguous
//! sub-ranges: the first `n % k` spawners (in registration order) get
//! `n / k + 1` slots, the rest get `n / k`. Every spawner must write a
//! position for each slot it is handed.

use std::f32::consts::TAU;
use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::math::Vec2;
use crate::particles::attributes::Position;
use crate::particles::{random_between, ParticleRng};

/// Assigns initial positions to a batch of new particles
pub trait Spawner: Send {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Write a position into every slot of `positions`
    fn spawn(&mut self, positions: &mut [Position], rng: &mut ParticleRng);
}

/// Split `range` into `spawners` contiguous sub-ranges, remainder first
pub fn batch_ranges(range: Range<usize>, spawners: usize) -> Vec<Range<usize>> {
    if spawners == 0 {
        return Vec::new();
    }

    let n = range.len();
    let base = n / spawners;
    let remainder = n % spawners;

    let mut ranges = Vec::with_capacity(spawners);
    let mut start = range.start;
    for i in 0..spawners {
        let len = if i < remainder { base + 1 } else { base };
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Every particle at one fixed point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointSpawner {
    pub position: Vec2,
}

impl PointSpawner {
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }
}

impl Spawner for PointSpawner {
    fn name(&self) -> &'static str {
        "point"
    }

    fn spawn(&mut self, positions: &mut [Position], _rng: &mut ParticleRng) {
        positions.fill(Position(self.position));
    }
}

/// Uniform angle on a circle of fixed radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingSpawner {
    pub center: Vec2,
    pub radius: f32,
}

impl RingSpawner {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Spawner for RingSpawner {
    fn name(&self) -> &'static str {
        "ring"
    }

    fn spawn(&mut self, positions: &mut [Position], rng: &mut ParticleRng) {
        for p in positions {
            let theta = rng.gen::<f32>() * TAU;
            p.0 = self.center + Vec2::from_angle(theta) * self.radius;
        }
    }
}

/// Uniform by area inside a circle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskSpawner {
    pub center: Vec2,
    pub radius: f32,
}

impl DiskSpawner {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Spawner for DiskSpawner {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn spawn(&mut self, positions: &mut [Position], rng: &mut ParticleRng) {
        for p in positions {
            // sqrt keeps the density uniform over the area
            let r = rng.gen::<f32>().sqrt() * self.radius;
            let theta = rng.gen::<f32>() * TAU;
            p.0 = self.center + Vec2::from_angle(theta) * r;
        }
    }
}

/// Independent uniform x and y inside an axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectSpawner {
    pub min: Vec2,
    pub max: Vec2,
}

impl RectSpawner {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }
}

impl Spawner for RectSpawner {
    fn name(&self) -> &'static str {
        "rect"
    }

    fn spawn(&mut self, positions: &mut [Position], rng: &mut ParticleRng) {
        for p in positions {
            p.0 = Vec2::new(
                random_between(rng, self.min.x, self.max.x),
                random_between(rng, self.min.y, self.max.y),
            );
        }
    }
}

/// Uniform point on a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSpawner {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSpawner {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

impl Spawner for LineSpawner {
    fn name(&self) -> &'static str {
        "line"
    }

    fn spawn(&mut self, positions: &mut [Position], rng: &mut ParticleRng) {
        for p in positions {
            p.0 = self.start.lerp(self.end, rng.gen::<f32>());
        }
    }
}
