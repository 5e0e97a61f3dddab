//! Per-step particle updaters.
//!
//! Updaters run once per step, in registration order, over the live prefix.
//! Each one requests the arrays it needs when it is bound to a store. Ordering
//! between them is declared through [`UpdaterCapabilities`]: anything that reads
//! `Time::interpolation` must come after an updater that produces it, and
//! [`check_order`] enforces that when the pipeline is assembled.

use serde::{Deserialize, Serialize};

use crate::error::{ParticleError, ParticleResult};
use crate::math::{UvRect, Vec2};
use crate::particles::attributes::{
    Acceleration, Angle, Frame, ParticleColor, Position, Size, TextureBinding, Time, Velocity,
};
use crate::particles::particle_data::ParticleData;
use crate::particles::render::{TextureId, TextureRegion};

/// What an updater provides to, and needs from, the updaters before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdaterCapabilities {
    pub produces_interpolation: bool,
    pub consumes_interpolation: bool,
}

impl UpdaterCapabilities {
    pub const NONE: UpdaterCapabilities = UpdaterCapabilities {
        produces_interpolation: false,
        consumes_interpolation: false,
    };

    pub const PRODUCES_INTERPOLATION: UpdaterCapabilities = UpdaterCapabilities {
        produces_interpolation: true,
        consumes_interpolation: false,
    };

    pub const CONSUMES_INTERPOLATION: UpdaterCapabilities = UpdaterCapabilities {
        produces_interpolation: false,
        consumes_interpolation: true,
    };
}

/// Per-step transformation of live particles
pub trait Updater: Send {
    /// Short name used in log output and ordering errors
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> UpdaterCapabilities {
        UpdaterCapabilities::NONE
    }

    /// Request the arrays this updater works on
    fn bind(&mut self, data: &mut ParticleData);

    /// Advance every live particle by `dt` seconds
    fn update(&mut self, data: &mut ParticleData, dt: f32);
}

/// Verify that every interpolation consumer has a producer registered before it
///
/// Takes `(name, capabilities)` pairs in execution order.
pub fn check_order(
    updaters: impl IntoIterator<Item = (&'static str, UpdaterCapabilities)>,
) -> ParticleResult<()> {
    let mut interpolation_ready = false;
    for (name, caps) in updaters {
        if caps.consumes_interpolation && !interpolation_ready {
            return Err(ParticleError::PipelineOrder {
                updater: name,
                requires: "interpolation",
            });
        }
        interpolation_ready |= caps.produces_interpolation;
    }
    Ok(())
}

/// Ages particles, computes interpolation and kills expired ones
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeUpdater;

impl Updater for TimeUpdater {
    fn name(&self) -> &'static str {
        "time"
    }

    fn capabilities(&self) -> UpdaterCapabilities {
        UpdaterCapabilities::PRODUCES_INTERPOLATION
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Time>();
    }

    fn update(&mut self, data: &mut ParticleData, dt: f32) {
        let mut i = 0;
        loop {
            // Re-read the bound after every kill
            let alive = data.alive_count();
            let Some(times) = data.try_get_array_mut::<Time>() else {
                return;
            };

            let mut expired = None;
            while i < alive {
                let t = &mut times[i];
                t.remaining -= dt;
                t.interpolation = if t.lifetime > 0.0 {
                    1.0 - t.remaining / t.lifetime
                } else {
                    1.0
                };
                if t.remaining <= 0.0 {
                    expired = Some(i);
                    break;
                }
                i += 1;
            }

            match expired {
                // The last live particle is swapped into `i`; examine it next
                // without advancing.
                Some(index) => data.kill(index),
                None => return,
            }
        }
    }
}

/// Semi-implicit Euler integration with a global acceleration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementUpdater {
    #[serde(default)]
    pub global_acceleration: Vec2,
}

impl MovementUpdater {
    pub fn new(global_acceleration: Vec2) -> Self {
        Self {
            global_acceleration,
        }
    }
}

impl Updater for MovementUpdater {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Position>();
        data.request_default_array::<Velocity>();
        data.request_default_array::<Acceleration>();
    }

    fn update(&mut self, data: &mut ParticleData, dt: f32) {
        let mut split = data.split();
        let (Some(positions), Some(velocities), Some(accelerations)) = (
            split.take::<Position>(),
            split.take::<Velocity>(),
            split.take::<Acceleration>(),
        ) else {
            return;
        };

        for ((p, v), a) in positions
            .iter_mut()
            .zip(velocities.iter_mut())
            .zip(accelerations.iter_mut())
        {
            a.0 += self.global_acceleration;
            p.0 += v.0 * dt;
            v.0 += a.0 * dt;
            a.0 = Vec2::ZERO;
        }
    }
}

/// Linear velocity damping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragUpdater {
    pub drag: f32,
}

impl DragUpdater {
    pub fn new(drag: f32) -> Self {
        Self { drag }
    }
}

impl Updater for DragUpdater {
    fn name(&self) -> &'static str {
        "drag"
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Velocity>();
    }

    fn update(&mut self, data: &mut ParticleData, dt: f32) {
        let factor = (1.0 - self.drag * dt).max(0.0);
        let alive = data.alive_count();
        if let Some(velocities) = data.try_get_array_mut::<Velocity>() {
            for v in &mut velocities[..alive] {
                v.0 *= factor;
            }
        }
    }
}

/// Interpolates color between start and end
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorUpdater;

impl Updater for ColorUpdater {
    fn name(&self) -> &'static str {
        "color"
    }

    fn capabilities(&self) -> UpdaterCapabilities {
        UpdaterCapabilities::CONSUMES_INTERPOLATION
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Time>();
        data.request_default_array::<ParticleColor>();
    }

    fn update(&mut self, data: &mut ParticleData, _dt: f32) {
        let mut split = data.split();
        let (Some(times), Some(colors)) = (split.take::<Time>(), split.take::<ParticleColor>())
        else {
            return;
        };
        for (c, t) in colors.iter_mut().zip(times.iter()) {
            c.interpolate(t.interpolation);
        }
    }
}

/// Interpolates size between start and end
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeUpdater;

impl Updater for SizeUpdater {
    fn name(&self) -> &'static str {
        "size"
    }

    fn capabilities(&self) -> UpdaterCapabilities {
        UpdaterCapabilities::CONSUMES_INTERPOLATION
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Time>();
        data.request_default_array::<Size>();
    }

    fn update(&mut self, data: &mut ParticleData, _dt: f32) {
        let mut split = data.split();
        let (Some(times), Some(sizes)) = (split.take::<Time>(), split.take::<Size>()) else {
            return;
        };
        for (s, t) in sizes.iter_mut().zip(times.iter()) {
            s.interpolate(t.interpolation);
        }
    }
}

/// Interpolates rotation between start and end
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationUpdater;

impl Updater for RotationUpdater {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn capabilities(&self) -> UpdaterCapabilities {
        UpdaterCapabilities::CONSUMES_INTERPOLATION
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Time>();
        data.request_default_array::<Angle>();
    }

    fn update(&mut self, data: &mut ParticleData, _dt: f32) {
        let mut split = data.split();
        let (Some(times), Some(angles)) = (split.take::<Time>(), split.take::<Angle>()) else {
            return;
        };
        for (a, t) in angles.iter_mut().zip(times.iter()) {
            a.interpolate(t.interpolation);
        }
    }
}

/// Flipbook animation over a list of texture regions
///
/// Looping animations advance at `frame_rate` frames per second, measured
/// from the particle's age when a `Time` array exists. One-shot animations are
/// stretched over each particle's lifetime and therefore need interpolation
/// from an earlier time updater.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationUpdater {
    pub frames: Vec<TextureRegion>,
    pub frame_rate: f32,
    pub looping: bool,
}

impl AnimationUpdater {
    pub fn new(frames: Vec<TextureRegion>, frame_rate: f32, looping: bool) -> Self {
        Self {
            frames,
            frame_rate,
            looping,
        }
    }

    /// Frames `0..count` of a `columns` x `rows` sprite sheet
    pub fn from_grid(
        texture: TextureId,
        columns: u32,
        rows: u32,
        count: u32,
        frame_rate: f32,
        looping: bool,
    ) -> Self {
        let frames = (0..count)
            .map(|i| TextureRegion::new(texture, UvRect::grid_cell(columns, rows, i)))
            .collect();
        Self::new(frames, frame_rate, looping)
    }

    fn frame_index(&self, timer: f32, interpolation: f32) -> u32 {
        let count = self.frames.len() as u32;
        if self.looping {
            (timer * self.frame_rate).max(0.0) as u32 % count
        } else {
            ((interpolation * count as f32).max(0.0) as u32).min(count - 1)
        }
    }
}

impl Updater for AnimationUpdater {
    fn name(&self) -> &'static str {
        "animation"
    }

    fn capabilities(&self) -> UpdaterCapabilities {
        if self.looping {
            UpdaterCapabilities::NONE
        } else {
            UpdaterCapabilities::CONSUMES_INTERPOLATION
        }
    }

    fn bind(&mut self, data: &mut ParticleData) {
        data.request_default_array::<Frame>();
        data.request_default_array::<TextureBinding>();
        if !self.looping {
            data.request_default_array::<Time>();
        }
    }

    fn update(&mut self, data: &mut ParticleData, dt: f32) {
        if self.frames.is_empty() {
            return;
        }

        let mut split = data.split();
        let (Some(frames), Some(bindings)) = (split.take::<Frame>(), split.take::<TextureBinding>())
        else {
            return;
        };
        let times = split.take::<Time>();

        for (i, (frame, binding)) in frames.iter_mut().zip(bindings.iter_mut()).enumerate() {
            let interpolation = match times.as_ref() {
                Some(times) => {
                    let t = &times[i];
                    frame.timer = t.lifetime - t.remaining;
                    t.interpolation
                }
                None => {
                    frame.timer += dt;
                    0.0
                }
            };
            frame.index = self.frame_index(frame.timer, interpolation);
            binding.region = Some(self.frames[frame.index as usize]);
        }
    }
}
