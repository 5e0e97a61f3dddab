// Earth Particles Constants - SINGLE SOURCE OF TRUTH
//
// Defaults shared by the effect orchestrator, the config loader and the presets.
// Keep tunables here rather than scattering literals through the kernels.

/// Pool sizing
pub mod capacity {
    /// Capacity used by `EffectConfig::default()` and the presets
    pub const DEFAULT_MAX_PARTICLES: usize = 1024;

    /// Hard upper bound accepted from configuration files
    pub const MAX_PARTICLES: usize = 1_000_000;

    /// Smallest useful pool: one slot is always kept unused by emission
    pub const MIN_PARTICLES: usize = 2;

    /// Slots `emit` never hands out (the last slot of every pool stays dead)
    pub const RESERVED_SLOTS: usize = 1;
}

/// Emission and simulation defaults
pub mod simulation {
    /// Default continuous emission rate (particles/second)
    pub const DEFAULT_EMIT_RATE: f32 = 0.0;

    /// Default particle lifetime range (seconds)
    pub const DEFAULT_LIFETIME_MIN: f32 = 1.0;
    pub const DEFAULT_LIFETIME_MAX: f32 = 1.0;

    /// Downward acceleration used by presets (units/s²)
    pub const PRESET_GRAVITY: f32 = -9.81;

    /// Largest frame step the demo driver will feed an effect (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.25;
}

/// Rendering defaults
pub mod render {
    /// Layer used when a config file does not name one
    pub const DEFAULT_LAYER: u32 = 0;

    /// Texture id reserved for the shared 1x1 blank texture
    pub const BLANK_TEXTURE_ID: u32 = 0;

    /// Size assigned to particles whose size array was allocated without a generator
    pub const DEFAULT_PARTICLE_SIZE: f32 = 1.0;
}
