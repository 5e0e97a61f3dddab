use std::fmt;

use glam::Affine2;
use rand::SeedableRng;

use crate::constants::capacity::RESERVED_SLOTS;
use crate::error::ParticleResult;
use crate::particles::attributes::{Frame, Position, Size};
use crate::particles::generator::Generator;
use crate::particles::particle_data::ParticleData;
use crate::particles::render::{render_particles, BatchFlags, BatchRenderer, BlendMode, RenderStats};
use crate::particles::spawner::{batch_ranges, Spawner};
use crate::particles::stage_list::{StageId, StageList};
use crate::particles::update::{check_order, Updater};
use crate::particles::ParticleRng;

/// Counters from one effect update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticleUpdate {
    pub spawned: usize,
    pub killed: usize,
    pub alive: usize,
}

/// One particle effect: a component store plus its spawn/generate/update pipeline
///
/// The effect owns continuous emission timing. Each `update` first emits
/// whatever the emission clock has accumulated, then runs every updater once
/// in registration order over the live prefix.
pub struct Effect {
    data: ParticleData,
    emit_rate: f32,
    /// Fractional emission time carried between frames
    clock: f32,
    spawners: StageList<dyn Spawner>,
    generators: StageList<dyn Generator>,
    updaters: StageList<dyn Updater>,
    next_id: u64,
    rng: ParticleRng,
    blend: BlendMode,
    last_update: ParticleUpdate,
}

impl Effect {
    /// Create an effect with an entropy-seeded random source
    pub fn new(capacity: usize, emit_rate: f32) -> Self {
        Self::with_rng(capacity, emit_rate, ParticleRng::from_entropy())
    }

    /// Create an effect whose spawners and generators draw from a fixed seed
    pub fn with_seed(capacity: usize, emit_rate: f32, seed: u64) -> Self {
        Self::with_rng(capacity, emit_rate, ParticleRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, emit_rate: f32, rng: ParticleRng) -> Self {
        let mut effect = Self {
            data: ParticleData::new(capacity),
            emit_rate: 0.0,
            clock: 0.0,
            spawners: StageList::new(),
            generators: StageList::new(),
            updaters: StageList::new(),
            next_id: 0,
            rng,
            blend: BlendMode::default(),
            last_update: ParticleUpdate::default(),
        };
        effect.set_emit_rate(emit_rate);
        effect
    }

    fn next_stage_id(&mut self) -> StageId {
        let id = StageId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add_spawner(&mut self, spawner: Box<dyn Spawner>) -> StageId {
        let id = self.next_stage_id();
        log::debug!("[Effect::add_spawner] {} '{}'", id, spawner.name());
        self.spawners.push(id, spawner);
        id
    }

    pub fn remove_spawner(&mut self, id: StageId) -> Option<Box<dyn Spawner>> {
        let removed = self.spawners.remove(id);
        if removed.is_some() {
            log::debug!("[Effect::remove_spawner] {}", id);
        }
        removed
    }

    pub fn clear_spawners(&mut self) {
        self.spawners.clear();
    }

    pub fn add_generator(&mut self, generator: Box<dyn Generator>) -> StageId {
        let id = self.next_stage_id();
        log::debug!("[Effect::add_generator] {} '{}'", id, generator.name());
        self.generators.push(id, generator);
        id
    }

    pub fn remove_generator(&mut self, id: StageId) -> Option<Box<dyn Generator>> {
        let removed = self.generators.remove(id);
        if removed.is_some() {
            log::debug!("[Effect::remove_generator] {}", id);
        }
        removed
    }

    pub fn clear_generators(&mut self) {
        self.generators.clear();
    }

    /// Append an updater and bind it to the store
    ///
    /// Fails without registering anything if the updater consumes
    /// interpolation and no earlier updater produces it.
    pub fn add_updater(&mut self, mut updater: Box<dyn Updater>) -> ParticleResult<StageId> {
        check_order(
            self.updaters
                .iter()
                .map(|u| (u.name(), u.capabilities()))
                .chain(std::iter::once((updater.name(), updater.capabilities()))),
        )?;

        updater.bind(&mut self.data);
        let id = self.next_stage_id();
        log::debug!("[Effect::add_updater] {} '{}'", id, updater.name());
        self.updaters.push(id, updater);
        Ok(id)
    }

    /// Remove an updater; a pipeline left out of order is reported but kept
    pub fn remove_updater(&mut self, id: StageId) -> Option<Box<dyn Updater>> {
        let removed = self.updaters.remove(id)?;
        log::debug!("[Effect::remove_updater] {} '{}'", id, removed.name());
        if let Err(e) = self.validate_pipeline() {
            log::warn!("[Effect::remove_updater] {}", e);
        }
        Some(removed)
    }

    pub fn clear_updaters(&mut self) {
        self.updaters.clear();
    }

    /// Re-check updater ordering over the whole pipeline
    pub fn validate_pipeline(&self) -> ParticleResult<()> {
        check_order(self.updaters.iter().map(|u| (u.name(), u.capabilities())))
    }

    /// Create up to `count` particles at the end of the alive prefix
    ///
    /// The last slot of the pool is never handed out. With no spawners
    /// registered nothing is created. Returns the number of particles spawned.
    pub fn emit(&mut self, count: usize) -> usize {
        if self.spawners.is_empty() {
            log::warn!("[Effect::emit] no spawners registered, ignoring {} particles", count);
            return 0;
        }

        let start = self.data.alive_count();
        let limit = self.data.capacity().saturating_sub(RESERVED_SLOTS);
        let end = start.saturating_add(count).min(limit).max(start);
        let spawned = end - start;
        if spawned < count {
            log::debug!(
                "[Effect::emit] clamped {} -> {} (capacity {})",
                count,
                spawned,
                self.data.capacity()
            );
        }
        if spawned == 0 {
            return 0;
        }

        let ranges = batch_ranges(start..end, self.spawners.len());
        let positions = self.data.request_default_array::<Position>();
        for (spawner, range) in self.spawners.iter_mut().zip(ranges) {
            spawner.spawn(&mut positions[range], &mut self.rng);
        }
        self.data.request_default_array::<Size>();
        // Slots freed by a kill keep the dead particle's flipbook state
        if let Some(frames) = self.data.try_get_array_mut::<Frame>() {
            frames[start..end].fill(Frame::default());
        }

        for generator in self.generators.iter_mut() {
            generator.generate(&mut self.data, start..end, &mut self.rng);
        }

        self.data.activate(spawned)
    }

    /// Advance the effect by `dt` seconds
    pub fn update(&mut self, dt: f32) -> ParticleUpdate {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("[Effect::update] ignoring invalid time step {}", dt);
            self.last_update = ParticleUpdate {
                alive: self.data.alive_count(),
                ..ParticleUpdate::default()
            };
            return self.last_update;
        }

        let mut spawned = 0;
        if self.emit_rate > 0.0 {
            self.clock += dt;
            while self.clock * self.emit_rate >= 1.0 {
                let count = (self.clock * self.emit_rate).floor();
                spawned += self.emit(count as usize);
                self.clock -= count / self.emit_rate;
            }
        }

        let before = self.data.alive_count();
        for updater in self.updaters.iter_mut() {
            updater.update(&mut self.data, dt);
        }
        let alive = self.data.alive_count();

        self.last_update = ParticleUpdate {
            spawned,
            killed: before.saturating_sub(alive),
            alive,
        };
        log::trace!(
            "[Effect::update] spawned {}, killed {}, alive {}",
            spawned,
            self.last_update.killed,
            alive
        );
        self.last_update
    }

    /// Submit the live particles as texture-grouped batches
    pub fn render<R: BatchRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        layer: u32,
        transform: Option<Affine2>,
    ) -> RenderStats {
        let flags = BatchFlags { blend: self.blend };
        render_particles(&self.data, renderer, layer, flags, transform)
    }

    /// Kill every particle; storage and stages are kept
    pub fn reset(&mut self) {
        self.data.reset();
    }

    pub fn alive_count(&self) -> usize {
        self.data.alive_count()
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn emit_rate(&self) -> f32 {
        self.emit_rate
    }

    /// Change the continuous emission rate; the emission clock is kept
    pub fn set_emit_rate(&mut self, emit_rate: f32) {
        if !emit_rate.is_finite() || emit_rate < 0.0 {
            log::warn!("[Effect::set_emit_rate] invalid rate {}, emission disabled", emit_rate);
            self.emit_rate = 0.0;
            return;
        }
        self.emit_rate = emit_rate;
    }

    /// Emission time not yet turned into particles
    pub fn emission_clock(&self) -> f32 {
        self.clock
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    pub fn store(&self) -> &ParticleData {
        &self.data
    }

    pub fn store_mut(&mut self) -> &mut ParticleData {
        &mut self.data
    }

    /// Counters from the most recent `update`
    pub fn stats(&self) -> ParticleUpdate {
        self.last_update
    }

    pub fn spawner_count(&self) -> usize {
        self.spawners.len()
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    pub fn updater_count(&self) -> usize {
        self.updaters.len()
    }

    pub fn updater_names(&self) -> Vec<&'static str> {
        self.updaters.iter().map(|u| u.name()).collect()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("data", &self.data)
            .field("emit_rate", &self.emit_rate)
            .field("clock", &self.clock)
            .field("spawners", &self.spawners.len())
            .field("generators", &self.generators.len())
            .field("updaters", &self.updater_names())
            .field("blend", &self.blend)
            .finish()
    }
}
