//! Data-oriented particle simulation
//!
//! Particles live in a structure-of-arrays store with one lazily allocated
//! array per attribute kind. An `Effect` drives the store through a three
//! stage pipeline (spawners, generators, updaters) and submits the live
//! particles to a batch renderer grouped by texture region.

pub mod attributes;
pub mod effects;
pub mod generator;
pub mod particle_data;
pub mod particle_system;
pub mod render;
pub mod spawner;
pub mod stage_list;
pub mod update;

use rand::Rng;

pub use attributes::{
    Acceleration, Angle, Attribute, Frame, ParticleColor, Position, Size, TextureBinding, Time,
    Velocity,
};
pub use effects::EffectPreset;
pub use generator::{
    AngleGenerator, BoxVelocityGenerator, ColorGenerator, FrameGenerator, Generator,
    LifetimeGenerator, SizeGenerator, TextureGenerator, VelocityGenerator,
};
pub use particle_data::{AttributeSplit, ParticleData};
pub use particle_system::{Effect, ParticleUpdate};
pub use render::{
    render_particles, BatchFlags, BatchRecorder, BatchRenderer, BlendMode, DrawContext,
    QuadInstance, QuadInstanceBuffer, RecordedBatch, RenderStats, TextureId, TextureRegion,
};
pub use spawner::{
    batch_ranges, DiskSpawner, LineSpawner, PointSpawner, RectSpawner, RingSpawner, Spawner,
};
pub use stage_list::StageId;
pub use update::{
    check_order, AnimationUpdater, ColorUpdater, DragUpdater, MovementUpdater, RotationUpdater,
    SizeUpdater, TimeUpdater, Updater, UpdaterCapabilities,
};

/// Random source shared by an effect's spawners and generators
pub type ParticleRng = rand::rngs::StdRng;

/// Uniform sample in `[min, max]`; tolerates `min == max` and reversed bounds
#[inline]
pub(crate) fn random_between(rng: &mut ParticleRng, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.gen::<f32>()
}
