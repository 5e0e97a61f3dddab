//! Earth Particles
//!
//! A data-oriented 2D particle kernel: a structure-of-arrays component store,
//! a spawn/generate/update pipeline driven by an [`Effect`], and texture-grouped
//! batch submission through the [`BatchRenderer`] boundary.

pub mod config;
pub mod constants;
pub mod error;
pub mod math;
pub mod particles;

pub use config::{EffectConfig, GeneratorConfig, SpawnerConfig, UpdaterConfig};
pub use error::{ParticleError, ParticleResult};
pub use math::{Affine2, Color, UvRect, Vec2};
pub use particles::{
    BatchFlags, BatchRecorder, BatchRenderer, BlendMode, DrawContext, Effect, EffectPreset,
    ParticleData, ParticleUpdate, QuadInstance, QuadInstanceBuffer, RenderStats, StageId,
    TextureId, TextureRegion,
};
