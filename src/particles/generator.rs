//! Generators initialize the non-spatial attributes of a fresh batch.
//!
//! They run after every spawner, in registration order, over the same slot
//! range. Several generators may write the same attribute; the last one wins.
//! Positions belong to spawners and are never written here.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::math::{Color, Vec2};
use crate::particles::attributes::{
    Angle, Frame, ParticleColor, Size, TextureBinding, Time, Velocity,
};
use crate::particles::particle_data::ParticleData;
use crate::particles::render::TextureRegion;
use crate::particles::{random_between, ParticleRng};

/// Initializes attributes for newly emitted particles
pub trait Generator: Send {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Write the attributes this generator owns for every slot in `range`
    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng);
}

/// Random lifetime in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeGenerator {
    pub min: f32,
    pub max: f32,
}

impl LifetimeGenerator {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn fixed(lifetime: f32) -> Self {
        Self::new(lifetime, lifetime)
    }
}

impl Generator for LifetimeGenerator {
    fn name(&self) -> &'static str {
        "lifetime"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let times = data.request_default_array::<Time>();
        for t in &mut times[range] {
            *t = Time::new(random_between(rng, self.min, self.max));
        }
    }
}

/// Velocity inside a direction cone, angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityGenerator {
    pub min_angle: f32,
    pub max_angle: f32,
    pub min_speed: f32,
    pub max_speed: f32,
}

impl VelocityGenerator {
    pub fn new(min_angle: f32, max_angle: f32, min_speed: f32, max_speed: f32) -> Self {
        Self {
            min_angle,
            max_angle,
            min_speed,
            max_speed,
        }
    }

    /// Every direction, speed in `[min_speed, max_speed]`
    pub fn radial(min_speed: f32, max_speed: f32) -> Self {
        Self::new(0.0, 360.0, min_speed, max_speed)
    }
}

impl Generator for VelocityGenerator {
    fn name(&self) -> &'static str {
        "velocity"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let velocities = data.request_default_array::<Velocity>();
        for v in &mut velocities[range] {
            let angle = random_between(rng, self.min_angle, self.max_angle).to_radians();
            let speed = random_between(rng, self.min_speed, self.max_speed);
            v.0 = Vec2::from_angle(angle) * speed;
        }
    }
}

/// Velocity with independent uniform components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxVelocityGenerator {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoxVelocityGenerator {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

impl Generator for BoxVelocityGenerator {
    fn name(&self) -> &'static str {
        "box_velocity"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let velocities = data.request_default_array::<Velocity>();
        for v in &mut velocities[range] {
            v.0 = Vec2::new(
                random_between(rng, self.min.x, self.max.x),
                random_between(rng, self.min.y, self.max.y),
            );
        }
    }
}

/// Random start and end size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeGenerator {
    pub start_min: f32,
    pub start_max: f32,
    pub end_min: f32,
    pub end_max: f32,
}

impl SizeGenerator {
    pub fn new(start: (f32, f32), end: (f32, f32)) -> Self {
        Self {
            start_min: start.0,
            start_max: start.1,
            end_min: end.0,
            end_max: end.1,
        }
    }

    pub fn constant(size: f32) -> Self {
        Self::new((size, size), (size, size))
    }
}

impl Generator for SizeGenerator {
    fn name(&self) -> &'static str {
        "size"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let sizes = data.request_default_array::<Size>();
        for s in &mut sizes[range] {
            let start = random_between(rng, self.start_min, self.start_max);
            let end = random_between(rng, self.end_min, self.end_max);
            *s = Size {
                current: start,
                start,
                end,
            };
        }
    }
}

/// Random start and end color, sampled per channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorGenerator {
    pub start_min: Color,
    pub start_max: Color,
    pub end_min: Color,
    pub end_max: Color,
}

impl ColorGenerator {
    pub fn new(start: Color, end: Color) -> Self {
        Self {
            start_min: start,
            start_max: start,
            end_min: end,
            end_max: end,
        }
    }

    pub fn ranged(start: (Color, Color), end: (Color, Color)) -> Self {
        Self {
            start_min: start.0,
            start_max: start.1,
            end_min: end.0,
            end_max: end.1,
        }
    }
}

fn random_color(rng: &mut ParticleRng, min: Color, max: Color) -> Color {
    Color::new(
        random_between(rng, min.r, max.r),
        random_between(rng, min.g, max.g),
        random_between(rng, min.b, max.b),
        random_between(rng, min.a, max.a),
    )
}

impl Generator for ColorGenerator {
    fn name(&self) -> &'static str {
        "color"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let colors = data.request_default_array::<ParticleColor>();
        for c in &mut colors[range] {
            let start = random_color(rng, self.start_min, self.start_max);
            let end = random_color(rng, self.end_min, self.end_max);
            *c = ParticleColor {
                current: start,
                start,
                end,
            };
        }
    }
}

/// Random start and end rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleGenerator {
    pub start_min: f32,
    pub start_max: f32,
    pub end_min: f32,
    pub end_max: f32,
}

impl AngleGenerator {
    pub fn new(start: (f32, f32), end: (f32, f32)) -> Self {
        Self {
            start_min: start.0,
            start_max: start.1,
            end_min: end.0,
            end_max: end.1,
        }
    }
}

impl Generator for AngleGenerator {
    fn name(&self) -> &'static str {
        "angle"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, rng: &mut ParticleRng) {
        let angles = data.request_default_array::<Angle>();
        for a in &mut angles[range] {
            let start = random_between(rng, self.start_min, self.start_max);
            let end = random_between(rng, self.end_min, self.end_max);
            *a = Angle {
                current: start,
                start,
                end,
            };
        }
    }
}

/// Binds every new particle to one texture region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureGenerator {
    pub region: TextureRegion,
}

impl TextureGenerator {
    pub fn new(region: TextureRegion) -> Self {
        Self { region }
    }
}

impl Generator for TextureGenerator {
    fn name(&self) -> &'static str {
        "texture"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, _rng: &mut ParticleRng) {
        let bindings = data.request_default_array::<TextureBinding>();
        bindings[range].fill(TextureBinding {
            region: Some(self.region),
        });
    }
}

/// Restarts flipbook state; dead slots may still hold an old particle's frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameGenerator;

impl Generator for FrameGenerator {
    fn name(&self) -> &'static str {
        "frame"
    }

    fn generate(&mut self, data: &mut ParticleData, range: Range<usize>, _rng: &mut ParticleRng) {
        let frames = data.request_default_array::<Frame>();
        frames[range].fill(Frame::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::render::TextureId;
    use rand::SeedableRng;

    fn rng() -> ParticleRng {
        ParticleRng::seed_from_u64(11)
    }

    #[test]
    fn test_lifetime_generator_writes_only_range() {
        let mut data = ParticleData::new(8);
        LifetimeGenerator::fixed(2.0).generate(&mut data, 2..5, &mut rng());

        let times = data.try_get_array::<Time>().unwrap();
        for (i, t) in times.iter().enumerate() {
            if (2..5).contains(&i) {
                assert_eq!(*t, Time::new(2.0));
            } else {
                assert_eq!(*t, Time::default());
            }
        }
    }

    #[test]
    fn test_velocity_generator_speed_range() {
        let mut data = ParticleData::new(64);
        VelocityGenerator::new(90.0, 90.0, 2.0, 4.0).generate(&mut data, 0..64, &mut rng());

        for v in data.try_get_array::<Velocity>().unwrap() {
            let speed = v.0.length();
            assert!((2.0 - 1e-4..=4.0 + 1e-4).contains(&speed));
            assert!(v.0.x.abs() < 1e-4, "straight up, got {:?}", v.0);
        }
    }

    #[test]
    fn test_size_and_angle_generators_start_at_start() {
        let mut data = ParticleData::new(4);
        SizeGenerator::new((1.0, 2.0), (0.0, 0.0)).generate(&mut data, 0..4, &mut rng());
        AngleGenerator::new((10.0, 20.0), (90.0, 90.0)).generate(&mut data, 0..4, &mut rng());

        for s in data.try_get_array::<Size>().unwrap() {
            assert_eq!(s.current, s.start);
            assert!((1.0..=2.0).contains(&s.start));
            assert_eq!(s.end, 0.0);
        }
        for a in data.try_get_array::<Angle>().unwrap() {
            assert_eq!(a.current, a.start);
            assert_eq!(a.end, 90.0);
        }
    }

    #[test]
    fn test_color_generator_last_writer_wins() {
        let mut data = ParticleData::new(4);
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let blue = Color::new(0.0, 0.0, 1.0, 1.0);
        ColorGenerator::new(red, red).generate(&mut data, 0..4, &mut rng());
        ColorGenerator::new(blue, Color::TRANSPARENT).generate(&mut data, 1..3, &mut rng());

        let colors = data.try_get_array::<ParticleColor>().unwrap();
        assert_eq!(colors[0].current, red);
        assert_eq!(colors[1].current, blue);
        assert_eq!(colors[2].end, Color::TRANSPARENT);
        assert_eq!(colors[3].start, red);
    }

    #[test]
    fn test_texture_and_frame_generators() {
        let mut data = ParticleData::new(4);
        data.request_array(|| Frame { index: 3, timer: 1.0 });

        let region = TextureRegion::full(TextureId(5));
        TextureGenerator::new(region).generate(&mut data, 0..2, &mut rng());
        FrameGenerator.generate(&mut data, 0..2, &mut rng());

        let bindings = data.try_get_array::<TextureBinding>().unwrap();
        assert_eq!(bindings[1].region, Some(region));
        assert_eq!(bindings[2].region, None);

        let frames = data.try_get_array::<Frame>().unwrap();
        assert_eq!(frames[0], Frame::default());
        assert_eq!(frames[2].index, 3);
    }
}
