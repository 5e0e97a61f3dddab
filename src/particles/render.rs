//! Batched particle rendering.
//!
//! The kernel does not talk to a graphics device. It walks the live particles,
//! groups consecutive ones sharing a texture region into runs, and hands each
//! run to a [`BatchRenderer`] supplied by the caller as one batch of quads.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::render::BLANK_TEXTURE_ID;
use crate::math::{Affine2, Color, UvRect, Vec2};
use crate::particles::attributes::{Angle, ParticleColor, Position, Size, TextureBinding};
use crate::particles::particle_data::ParticleData;

/// Opaque handle of a texture owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextureId(pub u32);

impl TextureId {
    pub const BLANK: TextureId = TextureId(BLANK_TEXTURE_ID);
}

/// Sub-rectangle of a texture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureRegion {
    pub texture: TextureId,
    #[serde(default)]
    pub uv: UvRect,
}

impl TextureRegion {
    /// Conventional 1x1 white region used when a renderer has nothing better
    pub const BLANK: TextureRegion = TextureRegion {
        texture: TextureId::BLANK,
        uv: UvRect::FULL,
    };

    pub fn new(texture: TextureId, uv: UvRect) -> Self {
        Self { texture, uv }
    }

    /// The whole of `texture`
    pub fn full(texture: TextureId) -> Self {
        Self::new(texture, UvRect::FULL)
    }
}

/// How a batch is composited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
}

/// Per-batch state passed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchFlags {
    pub blend: BlendMode,
}

/// One rotated, tinted, UV-mapped quad
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    pub center: [f32; 2],
    pub size: f32,
    /// Radians
    pub rotation: f32,
    pub color: [f32; 4],
    pub uv: [f32; 4],
}

impl QuadInstance {
    pub fn new(center: Vec2, size: f32, rotation: f32, color: Color, uv: UvRect) -> Self {
        Self {
            center: center.to_array(),
            size,
            rotation,
            color: color.to_array(),
            uv: [uv.u0, uv.v0, uv.u1, uv.v1],
        }
    }
}

/// Drawing context scoped to one batch submission
pub trait DrawContext {
    fn draw_quad(&mut self, quad: &QuadInstance);
    fn push_transform(&mut self, transform: Affine2);
    fn pop_transform(&mut self);
}

/// Render-batch submission entry point implemented by the graphics layer
pub trait BatchRenderer {
    /// Shared 1x1 region for particles without a texture binding
    fn blank_region(&self) -> TextureRegion {
        TextureRegion::BLANK
    }

    /// Open a batch on `layer` for `texture` and let `draw` fill it
    ///
    /// Implementations are expected to enqueue work and return without blocking.
    fn submit_batch(
        &mut self,
        layer: u32,
        texture: TextureId,
        flags: BatchFlags,
        draw: &mut dyn FnMut(&mut dyn DrawContext),
    );
}

/// Counters from one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub batches: usize,
    pub quads: usize,
}

/// Submit the live particles of `data` as texture-grouped batches
///
/// Does nothing unless both positions and sizes were ever allocated. Runs are
/// maximal sequences of consecutive particles drawn with the same region;
/// unbound particles (or a store without bindings) use the blank region and
/// share runs with particles bound to it explicitly.
pub fn render_particles<R: BatchRenderer + ?Sized>(
    data: &ParticleData,
    renderer: &mut R,
    layer: u32,
    flags: BatchFlags,
    transform: Option<Affine2>,
) -> RenderStats {
    let (Some(positions), Some(sizes)) = (data.alive::<Position>(), data.alive::<Size>()) else {
        return RenderStats::default();
    };
    let angles = data.alive::<Angle>();
    let colors = data.alive::<ParticleColor>();
    let bindings = data.alive::<TextureBinding>();
    let blank = renderer.blank_region();

    let region_at = |i: usize| bindings.and_then(|b| b[i].region).unwrap_or(blank);

    let count = positions.len();
    let mut stats = RenderStats::default();
    let mut start = 0;

    while start < count {
        let region = region_at(start);
        let mut end = start + 1;
        while end < count && region_at(end) == region {
            end += 1;
        }

        renderer.submit_batch(layer, region.texture, flags, &mut |ctx: &mut dyn DrawContext| {
            if let Some(transform) = transform {
                ctx.push_transform(transform);
            }
            for i in start..end {
                let angle = angles.map_or(0.0, |a| a[i].current);
                let color = colors.map_or(Color::WHITE, |c| c[i].current);
                ctx.draw_quad(&QuadInstance::new(
                    positions[i].0,
                    sizes[i].current,
                    angle.to_radians(),
                    color,
                    region.uv,
                ));
            }
            if transform.is_some() {
                ctx.pop_transform();
            }
        });

        stats.batches += 1;
        stats.quads += end - start;
        start = end;
    }

    log::trace!(
        "[render_particles] layer {} -> {} batches, {} quads",
        layer,
        stats.batches,
        stats.quads
    );
    stats
}

/// `DrawContext` that bakes transforms into instances and collects them for upload
#[derive(Debug, Default)]
pub struct QuadInstanceBuffer {
    instances: Vec<QuadInstance>,
    transforms: Vec<Affine2>,
}

impl QuadInstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
            transforms: Vec::new(),
        }
    }

    pub fn instances(&self) -> &[QuadInstance] {
        &self.instances
    }

    /// Raw instance bytes, ready for a vertex buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.transforms.clear();
    }

    pub fn into_instances(self) -> Vec<QuadInstance> {
        self.instances
    }

    fn current_transform(&self) -> Affine2 {
        self.transforms.last().copied().unwrap_or(Affine2::IDENTITY)
    }
}

impl DrawContext for QuadInstanceBuffer {
    fn draw_quad(&mut self, quad: &QuadInstance) {
        let transform = self.current_transform();
        if transform == Affine2::IDENTITY {
            self.instances.push(*quad);
            return;
        }

        let x_axis = transform.matrix2.x_axis;
        let center = transform.transform_point2(Vec2::from_array(quad.center));
        self.instances.push(QuadInstance {
            center: center.to_array(),
            size: quad.size * x_axis.length(),
            rotation: quad.rotation + x_axis.y.atan2(x_axis.x),
            ..*quad
        });
    }

    fn push_transform(&mut self, transform: Affine2) {
        let combined = self.current_transform() * transform;
        self.transforms.push(combined);
    }

    fn pop_transform(&mut self) {
        if self.transforms.pop().is_none() {
            log::warn!("[QuadInstanceBuffer::pop_transform] transform stack underflow");
        }
    }
}

/// One batch captured by [`BatchRecorder`]
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub layer: u32,
    pub texture: TextureId,
    pub flags: BatchFlags,
    pub instances: Vec<QuadInstance>,
}

/// Headless renderer that records every submitted batch
#[derive(Debug, Default)]
pub struct BatchRecorder {
    blank: Option<TextureRegion>,
    batches: Vec<RecordedBatch>,
}

impl BatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `blank` instead of [`TextureRegion::BLANK`] as the fallback region
    pub fn with_blank_region(blank: TextureRegion) -> Self {
        Self {
            blank: Some(blank),
            batches: Vec::new(),
        }
    }

    pub fn batches(&self) -> &[RecordedBatch] {
        &self.batches
    }

    pub fn total_quads(&self) -> usize {
        self.batches.iter().map(|b| b.instances.len()).sum()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

impl BatchRenderer for BatchRecorder {
    fn blank_region(&self) -> TextureRegion {
        self.blank.unwrap_or(TextureRegion::BLANK)
    }

    fn submit_batch(
        &mut self,
        layer: u32,
        texture: TextureId,
        flags: BatchFlags,
        draw: &mut dyn FnMut(&mut dyn DrawContext),
    ) {
        let mut buffer = QuadInstanceBuffer::new();
        draw(&mut buffer);
        self.batches.push(RecordedBatch {
            layer,
            texture,
            flags,
            instances: buffer.into_instances(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(
        positions: &[(f32, f32)],
        bindings: Option<&[Option<TextureRegion>]>,
    ) -> ParticleData {
        let mut data = ParticleData::new(positions.len() + 1);
        let pos = data.request_default_array::<Position>();
        for (slot, &(x, y)) in pos.iter_mut().zip(positions) {
            slot.0 = Vec2::new(x, y);
        }
        data.request_array(|| Size::constant(2.0));
        if let Some(bindings) = bindings {
            let slots = data.request_default_array::<TextureBinding>();
            for (slot, region) in slots.iter_mut().zip(bindings) {
                slot.region = *region;
            }
        }
        data.activate(positions.len());
        data
    }

    #[test]
    fn test_render_without_arrays_is_noop() {
        let data = ParticleData::new(8);
        let mut recorder = BatchRecorder::new();
        let stats = render_particles(&data, &mut recorder, 0, BatchFlags::default(), None);
        assert_eq!(stats, RenderStats::default());
        assert!(recorder.batches().is_empty());
    }

    #[test]
    fn test_runs_split_on_region_change() {
        let a = Some(TextureRegion::full(TextureId(1)));
        let b = Some(TextureRegion::full(TextureId(2)));
        let data = store_with(
            &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
            Some(&[a, a, b, None, a][..]),
        );

        let mut recorder = BatchRecorder::new();
        let stats = render_particles(&data, &mut recorder, 3, BatchFlags::default(), None);

        assert_eq!(stats, RenderStats { batches: 4, quads: 5 });
        let textures: Vec<_> = recorder.batches().iter().map(|b| b.texture).collect();
        assert_eq!(textures, vec![TextureId(1), TextureId(2), TextureId::BLANK, TextureId(1)]);
        assert_eq!(recorder.batches()[0].instances.len(), 2);
        assert!(recorder.batches().iter().all(|b| b.layer == 3));
    }

    #[test]
    fn test_unbound_particles_use_blank_region() {
        let blank = TextureRegion::new(TextureId(42), UvRect::new(0.0, 0.0, 0.5, 0.5));
        let data = store_with(&[(0.0, 0.0), (1.0, 1.0)], None);

        let mut recorder = BatchRecorder::with_blank_region(blank);
        render_particles(&data, &mut recorder, 0, BatchFlags::default(), None);

        assert_eq!(recorder.batches().len(), 1);
        let batch = &recorder.batches()[0];
        assert_eq!(batch.texture, TextureId(42));
        assert_eq!(batch.instances[1].uv, [0.0, 0.0, 0.5, 0.5]);
        assert_eq!(batch.instances[1].center, [1.0, 1.0]);
        assert_eq!(batch.instances[1].size, 2.0);
        assert_eq!(batch.instances[1].color, Color::WHITE.to_array());
    }

    #[test]
    fn test_explicit_blank_binding_joins_unbound_run() {
        let bindings = [Some(TextureRegion::BLANK), None];
        let data = store_with(&[(0.0, 0.0), (1.0, 0.0)], Some(&bindings[..]));

        let mut recorder = BatchRecorder::new();
        let stats = render_particles(&data, &mut recorder, 0, BatchFlags::default(), None);

        assert_eq!(stats, RenderStats { batches: 1, quads: 2 });
        assert_eq!(recorder.batches()[0].texture, TextureId::BLANK);
    }

    /// Records the order of renderer and draw context calls
    #[derive(Default)]
    struct CallLog {
        calls: Vec<&'static str>,
    }

    struct LoggingContext<'a> {
        calls: &'a mut Vec<&'static str>,
    }

    impl DrawContext for LoggingContext<'_> {
        fn draw_quad(&mut self, _quad: &QuadInstance) {
            self.calls.push("quad");
        }

        fn push_transform(&mut self, _transform: Affine2) {
            self.calls.push("push");
        }

        fn pop_transform(&mut self) {
            self.calls.push("pop");
        }
    }

    impl BatchRenderer for CallLog {
        fn submit_batch(
            &mut self,
            _layer: u32,
            _texture: TextureId,
            _flags: BatchFlags,
            draw: &mut dyn FnMut(&mut dyn DrawContext),
        ) {
            self.calls.push("submit");
            draw(&mut LoggingContext { calls: &mut self.calls });
        }
    }

    #[test]
    fn test_transform_push_pop_pairs_every_batch() {
        let a = Some(TextureRegion::full(TextureId(1)));
        let b = Some(TextureRegion::full(TextureId(2)));
        let data = store_with(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], Some(&[a, a, b][..]));

        let mut log = CallLog::default();
        let transform = Affine2::from_translation(Vec2::new(3.0, 0.0));
        render_particles(&data, &mut log, 0, BatchFlags::default(), Some(transform));
        assert_eq!(
            log.calls,
            vec!["submit", "push", "quad", "quad", "pop", "submit", "push", "quad", "pop"]
        );

        let mut log = CallLog::default();
        render_particles(&data, &mut log, 0, BatchFlags::default(), None);
        assert_eq!(log.calls, vec!["submit", "quad", "quad", "submit", "quad"]);
    }

    #[test]
    fn test_quad_uses_current_angle_in_radians() {
        let mut data = store_with(&[(0.0, 0.0)], None);
        data.request_array(|| Angle {
            current: 180.0,
            start: 0.0,
            end: 0.0,
        });

        let mut recorder = BatchRecorder::new();
        render_particles(&data, &mut recorder, 0, BatchFlags::default(), None);
        let rotation = recorder.batches()[0].instances[0].rotation;
        assert!((rotation - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_transform_is_applied_per_batch() {
        let data = store_with(&[(1.0, 0.0)], None);
        let transform = Affine2::from_scale_angle_translation(
            Vec2::splat(2.0),
            0.0,
            Vec2::new(10.0, 5.0),
        );

        let mut recorder = BatchRecorder::new();
        render_particles(&data, &mut recorder, 0, BatchFlags::default(), Some(transform));

        let quad = recorder.batches()[0].instances[0];
        assert_eq!(quad.center, [12.0, 5.0]);
        assert_eq!(quad.size, 4.0);
    }

    #[test]
    fn test_instance_buffer_bytes() {
        let mut buffer = QuadInstanceBuffer::with_capacity(2);
        buffer.draw_quad(&QuadInstance::new(Vec2::ZERO, 1.0, 0.0, Color::WHITE, UvRect::FULL));
        buffer.draw_quad(&QuadInstance::new(Vec2::ONE, 1.0, 0.0, Color::BLACK, UvRect::FULL));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.as_bytes().len(), 2 * std::mem::size_of::<QuadInstance>());
        assert_eq!(std::mem::size_of::<QuadInstance>(), 48);

        buffer.pop_transform();
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
