//! Headless particle demo
//!
//! Usage: `particle_demo [preset | effect.toml] [seconds]`
//!
//! Runs an effect at a fixed 60 Hz step, rendering every frame into a
//! recording renderer, and reports pool and batch counters once per second.

use anyhow::{Context, Result};
use earth_particles::constants::render::DEFAULT_LAYER;
use earth_particles::constants::simulation::MAX_FRAME_DELTA;
use earth_particles::{
    BatchRecorder, DrawContext, Effect, EffectConfig, EffectPreset, QuadInstanceBuffer, Vec2,
};

const FRAME_DELTA: f32 = 1.0 / 60.0;
const DEFAULT_SECONDS: f32 = 5.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut args = std::env::args().skip(1);
    let source = args.next().unwrap_or_else(|| "fire".to_string());
    let seconds: f32 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid duration '{}'", arg))?,
        None => DEFAULT_SECONDS,
    };

    let (mut effect, layer) = if source.ends_with(".toml") {
        let config = EffectConfig::load(&source)
            .with_context(|| format!("loading effect from {}", source))?;
        (config.build()?, config.layer)
    } else {
        let preset: EffectPreset = source.parse()?;
        (Effect::from_preset(preset, Vec2::ZERO), DEFAULT_LAYER)
    };

    log::info!(
        "Running '{}' for {:.1}s (capacity {}, {} particles/s)",
        source,
        seconds,
        effect.capacity(),
        effect.emit_rate()
    );

    let frames = (seconds / FRAME_DELTA).round() as usize;
    let dt = FRAME_DELTA.min(MAX_FRAME_DELTA);
    let mut recorder = BatchRecorder::new();
    let mut peak_alive = 0;

    for frame in 1..=frames {
        let update = effect.update(dt);
        peak_alive = peak_alive.max(update.alive);

        recorder.clear();
        let stats = effect.render(&mut recorder, layer, None);

        if frame % 60 == 0 {
            let mut upload = QuadInstanceBuffer::with_capacity(stats.quads);
            for batch in recorder.batches() {
                for quad in &batch.instances {
                    upload.draw_quad(quad);
                }
            }
            log::info!(
                "t={:>5.2}s alive {:>5} (+{} -{}) | {} batches, {} quads, {} bytes",
                frame as f32 * dt,
                update.alive,
                update.spawned,
                update.killed,
                stats.batches,
                stats.quads,
                upload.as_bytes().len()
            );
        }
    }

    log::info!("Done: peak {} live particles", peak_alive);
    Ok(())
}
