//! Effect descriptions loaded from TOML.
//!
//! ```toml
//! capacity = 512
//! emit_rate = 40.0
//!
//! [[spawners]]
//! kind = "disk"
//! center = [0.0, 0.0]
//! radius = 0.5
//!
//! [[generators]]
//! kind = "lifetime"
//! min = 1.0
//! max = 2.0
//!
//! [[updaters]]
//! kind = "time"
//! ```
//!
//! Stages are registered in file order, so updaters that read interpolation
//! must be listed after `time`.

use std::path::Path;

use serde::Deserialize;

use crate::constants::capacity::{DEFAULT_MAX_PARTICLES, MAX_PARTICLES, MIN_PARTICLES};
use crate::constants::render::DEFAULT_LAYER;
use crate::constants::simulation::{
    DEFAULT_EMIT_RATE, DEFAULT_LIFETIME_MAX, DEFAULT_LIFETIME_MIN, PRESET_GRAVITY,
};
use crate::error::{invalid_config, ParticleError, ParticleResult};
use crate::math::{Color, Vec2};
use crate::particles::generator::{
    AngleGenerator, BoxVelocityGenerator, ColorGenerator, FrameGenerator, Generator,
    LifetimeGenerator, SizeGenerator, TextureGenerator, VelocityGenerator,
};
use crate::particles::particle_system::Effect;
use crate::particles::render::{BlendMode, TextureId};
use crate::particles::spawner::{
    DiskSpawner, LineSpawner, PointSpawner, RectSpawner, RingSpawner, Spawner,
};
use crate::particles::update::{
    AnimationUpdater, ColorUpdater, DragUpdater, MovementUpdater, RotationUpdater, SizeUpdater,
    TimeUpdater, Updater,
};

/// Complete description of one effect
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EffectConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_emit_rate")]
    pub emit_rate: f32,
    /// Fixed random seed; entropy-seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_layer")]
    pub layer: u32,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub spawners: Vec<SpawnerConfig>,
    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,
    #[serde(default)]
    pub updaters: Vec<UpdaterConfig>,
}

fn default_capacity() -> usize {
    DEFAULT_MAX_PARTICLES
}

fn default_emit_rate() -> f32 {
    DEFAULT_EMIT_RATE
}

fn default_layer() -> u32 {
    DEFAULT_LAYER
}

fn default_looping() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnerConfig {
    Point(PointSpawner),
    Ring(RingSpawner),
    Disk(DiskSpawner),
    Rect(RectSpawner),
    Line(LineSpawner),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Lifetime(LifetimeGenerator),
    Velocity(VelocityGenerator),
    BoxVelocity(BoxVelocityGenerator),
    Size(SizeGenerator),
    Color(ColorGenerator),
    Angle(AngleGenerator),
    Texture(TextureGenerator),
    Frame,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdaterConfig {
    Time,
    Movement(MovementUpdater),
    Drag(DragUpdater),
    Color,
    Size,
    Rotation,
    /// Flipbook over the first `frames` cells of a sprite sheet
    Animation {
        texture: TextureId,
        columns: u32,
        rows: u32,
        frames: u32,
        frame_rate: f32,
        #[serde(default = "default_looping")]
        looping: bool,
    },
}

impl SpawnerConfig {
    pub fn build(&self) -> Box<dyn Spawner> {
        match self {
            SpawnerConfig::Point(s) => Box::new(*s),
            SpawnerConfig::Ring(s) => Box::new(*s),
            SpawnerConfig::Disk(s) => Box::new(*s),
            SpawnerConfig::Rect(s) => Box::new(*s),
            SpawnerConfig::Line(s) => Box::new(*s),
        }
    }

    fn validate(&self, field: &str) -> ParticleResult<()> {
        match self {
            SpawnerConfig::Point(_) | SpawnerConfig::Line(_) => Ok(()),
            SpawnerConfig::Ring(RingSpawner { radius, .. })
            | SpawnerConfig::Disk(DiskSpawner { radius, .. }) => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(invalid_config(
                        &format!("{}.radius", field),
                        format!("must be a non-negative number, got {}", radius),
                    ));
                }
                Ok(())
            }
            SpawnerConfig::Rect(r) => {
                check_range(&format!("{}.x", field), r.min.x, r.max.x)?;
                check_range(&format!("{}.y", field), r.min.y, r.max.y)
            }
        }
    }
}

impl GeneratorConfig {
    pub fn build(&self) -> Box<dyn Generator> {
        match self {
            GeneratorConfig::Lifetime(g) => Box::new(*g),
            GeneratorConfig::Velocity(g) => Box::new(*g),
            GeneratorConfig::BoxVelocity(g) => Box::new(*g),
            GeneratorConfig::Size(g) => Box::new(*g),
            GeneratorConfig::Color(g) => Box::new(*g),
            GeneratorConfig::Angle(g) => Box::new(*g),
            GeneratorConfig::Texture(g) => Box::new(*g),
            GeneratorConfig::Frame => Box::new(FrameGenerator),
        }
    }

    fn validate(&self, field: &str) -> ParticleResult<()> {
        let sub = |name: &str| format!("{}.{}", field, name);
        match self {
            GeneratorConfig::Lifetime(g) => {
                if g.min < 0.0 {
                    return Err(invalid_config(&sub("min"), "lifetime cannot be negative"));
                }
                check_range(&sub("lifetime"), g.min, g.max)
            }
            GeneratorConfig::Velocity(g) => {
                check_range(&sub("angle"), g.min_angle, g.max_angle)?;
                check_range(&sub("speed"), g.min_speed, g.max_speed)
            }
            GeneratorConfig::BoxVelocity(g) => {
                check_range(&sub("x"), g.min.x, g.max.x)?;
                check_range(&sub("y"), g.min.y, g.max.y)
            }
            GeneratorConfig::Size(g) => {
                check_range(&sub("start"), g.start_min, g.start_max)?;
                check_range(&sub("end"), g.end_min, g.end_max)
            }
            GeneratorConfig::Angle(g) => {
                check_range(&sub("start"), g.start_min, g.start_max)?;
                check_range(&sub("end"), g.end_min, g.end_max)
            }
            GeneratorConfig::Color(g) => {
                check_color_range(&sub("start"), g.start_min, g.start_max)?;
                check_color_range(&sub("end"), g.end_min, g.end_max)
            }
            GeneratorConfig::Texture(_) | GeneratorConfig::Frame => Ok(()),
        }
    }
}

impl UpdaterConfig {
    pub fn build(&self) -> Box<dyn Updater> {
        match self {
            UpdaterConfig::Time => Box::new(TimeUpdater),
            UpdaterConfig::Movement(u) => Box::new(*u),
            UpdaterConfig::Drag(u) => Box::new(*u),
            UpdaterConfig::Color => Box::new(ColorUpdater),
            UpdaterConfig::Size => Box::new(SizeUpdater),
            UpdaterConfig::Rotation => Box::new(RotationUpdater),
            UpdaterConfig::Animation {
                texture,
                columns,
                rows,
                frames,
                frame_rate,
                looping,
            } => Box::new(AnimationUpdater::from_grid(
                *texture,
                *columns,
                *rows,
                *frames,
                *frame_rate,
                *looping,
            )),
        }
    }

    fn validate(&self, field: &str) -> ParticleResult<()> {
        match self {
            UpdaterConfig::Drag(DragUpdater { drag }) => {
                if !drag.is_finite() || *drag < 0.0 {
                    return Err(invalid_config(
                        &format!("{}.drag", field),
                        format!("must be a non-negative number, got {}", drag),
                    ));
                }
                Ok(())
            }
            UpdaterConfig::Animation {
                columns,
                rows,
                frames,
                frame_rate,
                ..
            } => {
                if !frame_rate.is_finite() || *frame_rate <= 0.0 {
                    return Err(invalid_config(
                        &format!("{}.frame_rate", field),
                        format!("must be positive, got {}", frame_rate),
                    ));
                }
                if *columns == 0 || *rows == 0 {
                    return Err(invalid_config(
                        &format!("{}.columns", field),
                        "sprite sheet needs at least one row and column",
                    ));
                }
                if *frames == 0 || *frames > columns * rows {
                    return Err(invalid_config(
                        &format!("{}.frames", field),
                        format!("must be between 1 and {}, got {}", columns * rows, frames),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn check_range(field: &str, min: f32, max: f32) -> ParticleResult<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(invalid_config(field, "bounds must be finite"));
    }
    if min > max {
        return Err(invalid_config(
            field,
            format!("min {} is greater than max {}", min, max),
        ));
    }
    Ok(())
}

fn check_color_range(field: &str, min: Color, max: Color) -> ParticleResult<()> {
    for (channel, (lo, hi)) in ["r", "g", "b", "a"]
        .into_iter()
        .zip(min.to_array().into_iter().zip(max.to_array()))
    {
        check_range(&format!("{}.{}", field, channel), lo, hi)?;
    }
    Ok(())
}

impl EffectConfig {
    /// Parse and validate a TOML effect description
    pub fn from_toml_str(source: &str) -> ParticleResult<Self> {
        let config: EffectConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate an effect file
    pub fn load(path: impl AsRef<Path>) -> ParticleResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ParticleError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        log::debug!(
            "[EffectConfig::load] {}: {} spawners, {} generators, {} updaters",
            path.display(),
            config.spawners.len(),
            config.generators.len(),
            config.updaters.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> ParticleResult<()> {
        if !(MIN_PARTICLES..=MAX_PARTICLES).contains(&self.capacity) {
            return Err(invalid_config(
                "capacity",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_PARTICLES, MAX_PARTICLES, self.capacity
                ),
            ));
        }
        if !self.emit_rate.is_finite() || self.emit_rate < 0.0 {
            return Err(invalid_config(
                "emit_rate",
                format!("must be a non-negative number, got {}", self.emit_rate),
            ));
        }

        for (i, spawner) in self.spawners.iter().enumerate() {
            spawner.validate(&format!("spawners[{}]", i))?;
        }
        for (i, generator) in self.generators.iter().enumerate() {
            generator.validate(&format!("generators[{}]", i))?;
        }
        for (i, updater) in self.updaters.iter().enumerate() {
            updater.validate(&format!("updaters[{}]", i))?;
        }
        Ok(())
    }

    /// Assemble the effect, registering stages in file order
    pub fn build(&self) -> ParticleResult<Effect> {
        self.validate()?;

        let mut effect = match self.seed {
            Some(seed) => Effect::with_seed(self.capacity, self.emit_rate, seed),
            None => Effect::new(self.capacity, self.emit_rate),
        };
        effect.set_blend_mode(self.blend);

        for spawner in &self.spawners {
            effect.add_spawner(spawner.build());
        }
        for generator in &self.generators {
            effect.add_generator(generator.build());
        }
        for updater in &self.updaters {
            effect.add_updater(updater.build())?;
        }
        Ok(effect)
    }
}

impl Default for EffectConfig {
    /// A small white fountain falling back under gravity
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MAX_PARTICLES,
            emit_rate: 20.0,
            seed: None,
            layer: DEFAULT_LAYER,
            blend: BlendMode::Alpha,
            spawners: vec![SpawnerConfig::Point(PointSpawner::new(Vec2::ZERO))],
            generators: vec![
                GeneratorConfig::Lifetime(LifetimeGenerator::new(
                    DEFAULT_LIFETIME_MIN,
                    DEFAULT_LIFETIME_MAX,
                )),
                GeneratorConfig::Velocity(VelocityGenerator::new(80.0, 100.0, 4.0, 6.0)),
                GeneratorConfig::Color(ColorGenerator::new(Color::WHITE, Color::TRANSPARENT)),
            ],
            updaters: vec![
                UpdaterConfig::Time,
                UpdaterConfig::Movement(MovementUpdater::new(Vec2::new(0.0, PRESET_GRAVITY))),
                UpdaterConfig::Color,
            ],
        }
    }
}
