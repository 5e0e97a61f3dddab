// Earth Particles Effect Integration Tests
//
// Drives whole effects through the public API: emission, aging, the emission
// clock, spawner batch splitting and texture-grouped rendering.

use earth_particles::particles::{
    AnimationUpdater, ColorUpdater, Frame, LifetimeGenerator, MovementUpdater, PointSpawner,
    Position, RingSpawner, Size, TextureGenerator, Time, TimeUpdater, VelocityGenerator,
};
use earth_particles::{BatchRecorder, Effect, TextureId, TextureRegion, Vec2};

fn point_effect(capacity: usize, emit_rate: f32) -> Effect {
    let mut effect = Effect::with_seed(capacity, emit_rate, 0xC0FFEE);
    effect.add_spawner(Box::new(PointSpawner::new(Vec2::ZERO)));
    effect
}

#[test]
fn test_emit_point_with_fixed_lifetime() {
    let mut effect = point_effect(10, 0.0);
    effect.add_generator(Box::new(LifetimeGenerator::fixed(2.0)));

    assert_eq!(effect.emit(5), 5);
    assert_eq!(effect.alive_count(), 5);

    let store = effect.store();
    assert!(store.alive::<Position>().unwrap().iter().all(|p| p.0 == Vec2::ZERO));
    for t in store.alive::<Time>().unwrap() {
        assert_eq!(t.lifetime, 2.0);
        assert_eq!(t.remaining, 2.0);
    }
}

#[test]
fn test_time_updater_expires_batch() {
    let mut effect = point_effect(10, 0.0);
    effect.add_generator(Box::new(LifetimeGenerator::fixed(2.0)));
    effect.add_updater(Box::new(TimeUpdater)).unwrap();
    effect.emit(5);

    let alive: Vec<usize> = (0..5).map(|_| effect.update(1.0).alive).collect();
    println!("alive after each step: {:?}", alive);
    assert_eq!(alive, vec![5, 0, 0, 0, 0]);
    assert_eq!(effect.alive_count(), 0);
}

#[test]
fn test_continuous_emission_accumulator() {
    let mut effect = point_effect(100, 10.0);
    let update = effect.update(0.35);

    assert_eq!(update.spawned, 3);
    assert_eq!(effect.alive_count(), 3);
    assert!(
        (effect.emission_clock() - 0.05).abs() < 1e-5,
        "clock should carry the fractional remainder, got {}",
        effect.emission_clock()
    );
}

#[test]
fn test_emission_rate_holds_under_jittery_frames() {
    let mut effect = point_effect(1000, 30.0);
    let steps = [0.016, 0.033, 0.007, 0.021, 0.05, 0.011, 0.029, 0.016];

    let mut elapsed = 0.0;
    for _ in 0..25 {
        for dt in steps {
            effect.update(dt);
            elapsed += dt;
        }
    }

    let expected = (elapsed * 30.0f32).floor() as usize;
    let alive = effect.alive_count();
    assert!(
        alive.abs_diff(expected) <= 1,
        "expected about {} particles after {:.3}s, got {}",
        expected,
        elapsed,
        alive
    );
}

#[test]
fn test_two_spawners_split_remainder_first() {
    let first = Vec2::new(0.0, 0.0);
    let second = Vec2::new(5.0, 5.0);

    let mut effect = Effect::with_seed(10, 0.0, 1);
    effect.add_spawner(Box::new(PointSpawner::new(first)));
    effect.add_spawner(Box::new(PointSpawner::new(second)));

    assert_eq!(effect.emit(7), 7);
    let positions = effect.store().alive::<Position>().unwrap();
    assert_eq!(positions.iter().filter(|p| p.0 == first).count(), 4);
    assert_eq!(positions.iter().filter(|p| p.0 == second).count(), 3);

    // Contiguous sub-ranges in registration order
    assert!(positions[..4].iter().all(|p| p.0 == first));
    assert!(positions[4..].iter().all(|p| p.0 == second));
}

#[test]
fn test_render_without_textures_uses_blank_region() {
    let mut effect = Effect::with_seed(8, 0.0, 1);
    for x in 0..3 {
        effect.add_spawner(Box::new(PointSpawner::new(Vec2::new(x as f32, 0.0))));
    }
    effect.emit(3);

    let store = effect.store();
    assert!(store.has_array::<Position>() && store.has_array::<Size>());
    assert_eq!(store.allocated_arrays(), 2);

    let mut recorder = BatchRecorder::new();
    let stats = effect.render(&mut recorder, 2, None);

    assert_eq!(stats.batches, 1);
    assert_eq!(stats.quads, 3);
    let batch = &recorder.batches()[0];
    assert_eq!(batch.layer, 2);
    assert_eq!(batch.texture, TextureRegion::BLANK.texture);
    let centers: Vec<[f32; 2]> = batch.instances.iter().map(|q| q.center).collect();
    assert_eq!(centers, vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
}

#[test]
fn test_render_before_any_spawn_is_noop() {
    let effect = Effect::with_seed(8, 0.0, 1);
    let mut recorder = BatchRecorder::new();
    let stats = effect.render(&mut recorder, 0, None);
    assert_eq!(stats.batches, 0);
    assert!(recorder.batches().is_empty());
}

#[test]
fn test_render_splits_runs_by_texture() {
    let smoke = TextureRegion::full(TextureId(1));
    let flame = TextureRegion::full(TextureId(2));

    let mut effect = point_effect(16, 0.0);
    let texture = effect.add_generator(Box::new(TextureGenerator::new(smoke)));
    effect.emit(2);
    effect.remove_generator(texture);
    effect.add_generator(Box::new(TextureGenerator::new(flame)));
    effect.emit(3);

    let mut recorder = BatchRecorder::new();
    let stats = effect.render(&mut recorder, 0, None);

    let textures: Vec<TextureId> = recorder.batches().iter().map(|b| b.texture).collect();
    assert_eq!(textures, vec![TextureId(1), TextureId(2)]);
    assert_eq!(stats.quads, 5);
}

#[test]
fn test_alive_never_exceeds_capacity_minus_one() {
    let mut effect = point_effect(32, 500.0);
    effect.add_generator(Box::new(LifetimeGenerator::new(0.5, 2.0)));
    effect.add_updater(Box::new(TimeUpdater)).unwrap();

    for step in 0..200 {
        effect.update(0.05);
        effect.emit(step % 7);
        assert!(effect.alive_count() <= 31, "step {}: {}", step, effect.alive_count());
        for t in effect.store().alive::<Time>().unwrap() {
            assert!(t.remaining > 0.0, "expired particle left alive at step {}", step);
        }
    }
}

#[test]
fn test_seeded_effects_are_deterministic() {
    let build = || {
        let mut effect = Effect::with_seed(64, 20.0, 99);
        effect.add_spawner(Box::new(RingSpawner::new(Vec2::ZERO, 2.0)));
        effect.add_generator(Box::new(LifetimeGenerator::new(0.5, 1.5)));
        effect.add_generator(Box::new(VelocityGenerator::radial(1.0, 2.0)));
        effect.add_updater(Box::new(TimeUpdater)).unwrap();
        effect.add_updater(Box::new(MovementUpdater::new(Vec2::new(0.0, -9.81)))).unwrap();
        effect.add_updater(Box::new(ColorUpdater)).unwrap();
        effect
    };

    let mut a = build();
    let mut b = build();
    for _ in 0..30 {
        assert_eq!(a.update(1.0 / 30.0), b.update(1.0 / 30.0));
    }
    assert_eq!(
        a.store().alive::<Position>().unwrap(),
        b.store().alive::<Position>().unwrap()
    );
}

#[test]
fn test_animated_effect_rebinds_textures() {
    let sheet = TextureId(4);
    let mut effect = point_effect(8, 0.0);
    effect.add_generator(Box::new(LifetimeGenerator::fixed(1.0)));
    effect.add_updater(Box::new(TimeUpdater)).unwrap();
    effect
        .add_updater(Box::new(AnimationUpdater::from_grid(sheet, 2, 2, 4, 1.0, false)))
        .unwrap();
    effect.emit(3);

    effect.update(0.3);
    let mut recorder = BatchRecorder::new();
    let stats = effect.render(&mut recorder, 0, None);

    // All particles share a frame, so they share a batch
    assert_eq!(stats.batches, 1);
    assert_eq!(recorder.batches()[0].texture, sheet);
}

#[test]
fn test_reused_slot_restarts_looping_animation() {
    let mut effect = point_effect(4, 0.0);
    effect.add_generator(Box::new(LifetimeGenerator::fixed(1.0)));
    effect.add_updater(Box::new(TimeUpdater)).unwrap();
    effect
        .add_updater(Box::new(AnimationUpdater::from_grid(TextureId(2), 2, 2, 4, 1.0, true)))
        .unwrap();

    effect.emit(1);
    effect.update(0.9);
    effect.update(0.9);
    assert_eq!(effect.alive_count(), 0);

    // The next particle lands in the slot the first one died in
    effect.emit(1);
    effect.update(0.01);
    let frame = effect.store().alive::<Frame>().unwrap()[0];
    println!("reused slot frame: {:?}", frame);
    assert!((frame.timer - 0.01).abs() < 1e-5);
    assert_eq!(frame.index, 0);
}
