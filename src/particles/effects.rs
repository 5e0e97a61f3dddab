use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::capacity::DEFAULT_MAX_PARTICLES;
use crate::constants::simulation::PRESET_GRAVITY;
use crate::error::{invalid_config, ParticleError};
use crate::math::{Color, Vec2};
use crate::particles::generator::{
    AngleGenerator, BoxVelocityGenerator, ColorGenerator, Generator, LifetimeGenerator,
    SizeGenerator, VelocityGenerator,
};
use crate::particles::particle_system::Effect;
use crate::particles::render::BlendMode;
use crate::particles::spawner::{
    DiskSpawner, LineSpawner, PointSpawner, RectSpawner, RingSpawner, Spawner,
};
use crate::particles::update::{
    ColorUpdater, DragUpdater, MovementUpdater, RotationUpdater, SizeUpdater, TimeUpdater, Updater,
};

/// Common effect presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectPreset {
    Fire,
    Smoke,
    Sparks,
    Magic,
    Snow,
}

impl EffectPreset {
    pub const ALL: [EffectPreset; 5] = [
        EffectPreset::Fire,
        EffectPreset::Smoke,
        EffectPreset::Sparks,
        EffectPreset::Magic,
        EffectPreset::Snow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectPreset::Fire => "fire",
            EffectPreset::Smoke => "smoke",
            EffectPreset::Sparks => "sparks",
            EffectPreset::Magic => "magic",
            EffectPreset::Snow => "snow",
        }
    }
}

impl FromStr for EffectPreset {
    type Err = ParticleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EffectPreset::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| invalid_config("preset", format!("unknown preset '{}'", s)))
    }
}

/// Stages making up one preset, in execution order
struct PresetPipeline {
    capacity: usize,
    emit_rate: f32,
    blend: BlendMode,
    spawners: Vec<Box<dyn Spawner>>,
    generators: Vec<Box<dyn Generator>>,
    updaters: Vec<Box<dyn Updater>>,
}

impl Effect {
    /// Create a complete, continuously emitting effect centered on `origin`
    pub fn from_preset(preset: EffectPreset, origin: Vec2) -> Self {
        let pipeline = match preset {
            EffectPreset::Fire => fire(origin),
            EffectPreset::Smoke => smoke(origin),
            EffectPreset::Sparks => sparks(origin),
            EffectPreset::Magic => magic(origin),
            EffectPreset::Snow => snow(origin),
        };

        let mut effect = Effect::new(pipeline.capacity, pipeline.emit_rate);
        effect.set_blend_mode(pipeline.blend);
        for spawner in pipeline.spawners {
            effect.add_spawner(spawner);
        }
        for generator in pipeline.generators {
            effect.add_generator(generator);
        }
        for updater in pipeline.updaters {
            let name = updater.name();
            if let Err(e) = effect.add_updater(updater) {
                log::error!("[Effect::from_preset] {:?} dropped '{}': {}", preset, name, e);
            }
        }

        log::debug!("[Effect::from_preset] built {} at {:?}", preset.name(), origin);
        effect
    }
}

fn fire(origin: Vec2) -> PresetPipeline {
    PresetPipeline {
        capacity: DEFAULT_MAX_PARTICLES,
        emit_rate: 120.0,
        blend: BlendMode::Additive,
        spawners: vec![Box::new(DiskSpawner::new(origin, 0.4))],
        generators: vec![
            Box::new(LifetimeGenerator::new(0.6, 1.2)),
            Box::new(VelocityGenerator::new(75.0, 105.0, 1.0, 2.5)),
            Box::new(SizeGenerator::new((0.3, 0.5), (0.05, 0.1))),
            Box::new(ColorGenerator::new(
                Color::new(1.0, 0.8, 0.2, 1.0),
                Color::new(0.8, 0.1, 0.0, 0.0),
            )),
        ],
        updaters: vec![
            Box::new(TimeUpdater),
            Box::new(MovementUpdater::new(Vec2::new(0.0, 1.5))),
            Box::new(ColorUpdater),
            Box::new(SizeUpdater),
        ],
    }
}

fn smoke(origin: Vec2) -> PresetPipeline {
    PresetPipeline {
        capacity: 256,
        emit_rate: 12.0,
        blend: BlendMode::Alpha,
        spawners: vec![Box::new(DiskSpawner::new(origin, 0.2))],
        generators: vec![
            Box::new(LifetimeGenerator::new(2.0, 4.0)),
            Box::new(BoxVelocityGenerator::new(Vec2::new(-0.2, 0.5), Vec2::new(0.2, 1.0))),
            Box::new(SizeGenerator::new((0.3, 0.4), (1.2, 1.8))),
            Box::new(ColorGenerator::new(
                Color::new(0.4, 0.4, 0.4, 0.6),
                Color::new(0.6, 0.6, 0.6, 0.0),
            )),
            Box::new(AngleGenerator::new((0.0, 360.0), (-90.0, 90.0))),
        ],
        updaters: vec![
            Box::new(TimeUpdater),
            Box::new(MovementUpdater::default()),
            Box::new(DragUpdater::new(0.3)),
            Box::new(ColorUpdater),
            Box::new(SizeUpdater),
            Box::new(RotationUpdater),
        ],
    }
}

fn sparks(origin: Vec2) -> PresetPipeline {
    PresetPipeline {
        capacity: 512,
        emit_rate: 60.0,
        blend: BlendMode::Additive,
        spawners: vec![Box::new(PointSpawner::new(origin))],
        generators: vec![
            Box::new(LifetimeGenerator::new(0.4, 0.9)),
            Box::new(VelocityGenerator::new(30.0, 150.0, 4.0, 8.0)),
            Box::new(SizeGenerator::new((0.05, 0.1), (0.0, 0.02))),
            Box::new(ColorGenerator::new(
                Color::new(1.0, 0.95, 0.6, 1.0),
                Color::new(1.0, 0.4, 0.0, 0.0),
            )),
        ],
        updaters: vec![
            Box::new(TimeUpdater),
            Box::new(MovementUpdater::new(Vec2::new(0.0, PRESET_GRAVITY))),
            Box::new(DragUpdater::new(0.5)),
            Box::new(ColorUpdater),
            Box::new(SizeUpdater),
        ],
    }
}

fn magic(origin: Vec2) -> PresetPipeline {
    PresetPipeline {
        capacity: 512,
        emit_rate: 40.0,
        blend: BlendMode::Additive,
        spawners: vec![Box::new(RingSpawner::new(origin, 1.0))],
        generators: vec![
            Box::new(LifetimeGenerator::new(1.0, 2.0)),
            Box::new(VelocityGenerator::radial(0.1, 0.4)),
            Box::new(SizeGenerator::new((0.1, 0.2), (0.0, 0.0))),
            Box::new(ColorGenerator::ranged(
                (Color::new(0.5, 0.2, 1.0, 1.0), Color::new(0.2, 0.6, 1.0, 1.0)),
                (Color::new(1.0, 1.0, 1.0, 0.0), Color::new(1.0, 1.0, 1.0, 0.0)),
            )),
            Box::new(AngleGenerator::new((0.0, 0.0), (180.0, 360.0))),
        ],
        updaters: vec![
            Box::new(TimeUpdater),
            Box::new(MovementUpdater::default()),
            Box::new(ColorUpdater),
            Box::new(SizeUpdater),
            Box::new(RotationUpdater),
        ],
    }
}

fn snow(origin: Vec2) -> PresetPipeline {
    PresetPipeline {
        capacity: DEFAULT_MAX_PARTICLES,
        emit_rate: 30.0,
        blend: BlendMode::Alpha,
        spawners: vec![
            Box::new(LineSpawner::new(
                origin + Vec2::new(-10.0, 0.0),
                origin + Vec2::new(10.0, 0.0),
            )),
            Box::new(RectSpawner::from_center(origin, Vec2::new(20.0, 2.0))),
        ],
        generators: vec![
            Box::new(LifetimeGenerator::new(4.0, 6.0)),
            Box::new(BoxVelocityGenerator::new(Vec2::new(-0.3, -1.5), Vec2::new(0.3, -0.8))),
            Box::new(SizeGenerator::new((0.05, 0.15), (0.05, 0.15))),
            Box::new(ColorGenerator::new(Color::WHITE, Color::WHITE.with_alpha(0.0))),
        ],
        updaters: vec![
            Box::new(TimeUpdater),
            Box::new(MovementUpdater::default()),
            Box::new(ColorUpdater),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::render::BatchRecorder;

    #[test]
    fn test_every_preset_builds_ordered_pipeline() {
        for preset in EffectPreset::ALL {
            let effect = Effect::from_preset(preset, Vec2::ZERO);
            assert!(effect.validate_pipeline().is_ok(), "{:?}", preset);
            assert!(effect.spawner_count() > 0);
            assert!(effect.emit_rate() > 0.0);
            assert_eq!(effect.updater_names()[0], "time");
        }
    }

    #[test]
    fn test_preset_emits_and_renders() {
        let mut effect = Effect::from_preset(EffectPreset::Sparks, Vec2::new(2.0, 3.0));
        effect.update(0.1);
        assert_eq!(effect.alive_count(), 6);

        let mut recorder = BatchRecorder::new();
        let stats = effect.render(&mut recorder, 0, None);
        assert_eq!(stats.quads, 6);
        assert_eq!(recorder.batches()[0].flags.blend, BlendMode::Additive);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Fire".parse::<EffectPreset>().unwrap(), EffectPreset::Fire);
        assert_eq!("snow".parse::<EffectPreset>().unwrap(), EffectPreset::Snow);
        assert!("rain".parse::<EffectPreset>().is_err());
    }
}
