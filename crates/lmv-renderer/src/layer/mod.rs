//! Data-texture geometry layers.
//!
//! A [`Layer`] packs the geometry, transforms, colors and render state of
//! thousands of objects into one shared set of data textures. Objects
//! ("portions") are appended while the layer accumulates, then
//! [`Layer::finalize`] builds the textures and the layer switches into
//! its render phase: per-object mutators rewrite texture sub-regions, and
//! per-pass draw entry points issue at most three draws (one per index
//! bit-width family) for the whole layer.
//!
//! # Lifecycle
//!
//! ```text
//! new -> can_create_portion / create_portion (repeat) -> finalize
//!     -> init_flags / set_* mutators, draw_* entry points (per frame)
//! ```
//!
//! Accumulation-side calls fail with [`LayerError::Finalized`] after
//! finalize; render-side calls fail with [`LayerError::NotFinalized`]
//! before it.

mod arena;
mod batch;
mod bucket;
pub(crate) mod buffer;
mod flags;

pub use batch::{UploadDecision, UploadMode};
pub use buffer::IndexFamily;
pub use flags::{ObjectFlags, PassBytes, RenderPass, derive_passes};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;

use glam::{DVec3, Mat4, Vec3};
use uuid::Uuid;

use lmv_core::{PackedRgba, PortionConfig};

use crate::config::RendererConfig;
use crate::constants::{
    MAX_INDICES_PER_LAYER, MAX_OBJECTS_PER_LAYER, MAX_VERTICES_PER_LAYER, OBJECT_ATTRIBUTE_TEXELS,
    OBJECT_MATRIX_TEXELS,
};
use crate::context::{FrameContext, FrameUniforms};
use crate::drawable::{Drawable, GeometryKind};
use crate::error::LayerError;
use crate::scene::BoundingBox;
use crate::sub_renderers::{
    ColorRenderer, DepthRenderer, EdgesRenderer, OcclusionRenderer, PickRenderer, SilhouetteRenderer,
    SnapRenderer,
};
use crate::texture::{DataTextureState, SharedLayouts};

use arena::{FIELD_CLIP, FIELD_COLOR, FIELD_PASSES, ObjectArena, ObjectRecord};
use batch::UpdateBatcher;
use bucket::{BucketGeometry, BucketKey};
use buffer::Buffer;

/// Externally-visible id of one renderable object within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortionId(pub u32);

/// Aggregate per-state object counts, maintained incrementally by the
/// mutators so draw entry points can skip vacuous passes without
/// touching the GPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerCounts {
    /// Total portions.
    pub num_portions: u32,
    /// Visible portions.
    pub num_visible: u32,
    /// Transparent portions.
    pub num_transparent: u32,
    /// X-rayed portions.
    pub num_xrayed: u32,
    /// Highlighted portions.
    pub num_highlighted: u32,
    /// Selected portions.
    pub num_selected: u32,
    /// Clippable portions.
    pub num_clippable: u32,
    /// Portions with edge emphasis.
    pub num_edges: u32,
    /// Pickable portions.
    pub num_pickable: u32,
    /// Culled portions.
    pub num_culled: u32,
}

/// Per-family texel totals, snapshotted from the accumulation buffer at
/// finalize for the draw loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawTotals {
    /// Triangle texels per bit-width family, padding included.
    pub triangle_texels: [u32; 3],
    /// Edge texels per bit-width family, padding included.
    pub edge_texels: [u32; 3],
    /// Total vertices.
    pub num_vertices: u32,
}

impl DrawTotals {
    fn from_buffer(buffer: &Buffer) -> Self {
        Self {
            triangle_texels: [
                buffer.bits8.triangle_texels(),
                buffer.bits16.triangle_texels(),
                buffer.bits32.triangle_texels(),
            ],
            edge_texels: [
                buffer.bits8.edge_texels(),
                buffer.bits16.edge_texels(),
                buffer.bits32.edge_texels(),
            ],
            num_vertices: buffer.vertex_count() as u32,
        }
    }
}

#[derive(Debug)]
struct PortionRecord {
    sub_portions: Range<u32>,
    aabb: BoundingBox,
}

/// Pending sub-region upload produced by one mutator.
#[derive(Debug, PartialEq, Eq)]
enum UploadOp {
    AttributeTexel { object: u32, texel: usize },
    OffsetTexel { object: u32 },
    MatrixTexels { object: u32 },
}

/// Running capacity totals, separated out so the budget math is a pure
/// function.
#[derive(Debug, Clone, Copy)]
struct CapacitySnapshot {
    objects: usize,
    vertices: usize,
    largest_index_family: usize,
}

/// The budget check behind [`Layer::can_create_portion`].
///
/// Index headroom is measured against the largest bit-width family
/// rather than the family the new geometry would land in; for mixed
/// layers this is conservative.
fn capacity_allows(
    current: CapacitySnapshot,
    new_objects: usize,
    new_vertices: usize,
    new_indices: usize,
) -> bool {
    current.objects + new_objects <= MAX_OBJECTS_PER_LAYER
        && current.vertices + new_vertices <= MAX_VERTICES_PER_LAYER
        && current.largest_index_family + new_indices <= MAX_INDICES_PER_LAYER
}

/// One data-texture geometry layer.
pub struct Layer {
    id: Uuid,
    origin: DVec3,
    buffer: Option<Buffer>,
    bucket_cache: HashMap<BucketKey, BucketGeometry>,
    arena: ObjectArena,
    portions: Vec<PortionRecord>,
    counts: LayerCounts,
    totals: DrawTotals,
    aabb: BoundingBox,
    /// CPU mirror of the offset texture, one xyz + pad texel per object.
    offsets: Vec<f32>,
    /// CPU mirror of the instance matrix texture, one mat4 per object.
    instance_matrices: Vec<f32>,
    batcher: UpdateBatcher,
    dirty_attributes: bool,
    dirty_offsets: bool,
    dirty_matrices: bool,
    finalized: bool,
    textures: Option<DataTextureState>,
}

impl Layer {
    /// Create an empty layer with the given relative-to-center origin.
    pub fn new(origin: DVec3, config: &RendererConfig) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(layer = %id, ?origin, "creating layer");
        Self {
            id,
            origin,
            buffer: Some(Buffer::new()),
            bucket_cache: HashMap::new(),
            arena: ObjectArena::new(),
            portions: Vec::new(),
            counts: LayerCounts::default(),
            totals: DrawTotals::default(),
            aabb: BoundingBox::empty(),
            offsets: Vec::new(),
            instance_matrices: Vec::new(),
            batcher: UpdateBatcher::new(config.deferred_update_threshold),
            dirty_attributes: false,
            dirty_offsets: false,
            dirty_matrices: false,
            finalized: false,
            textures: None,
        }
    }

    /// Layer id, for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Relative-to-center origin subtracted from world coordinates
    /// before upload.
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    /// True when no portions were created.
    pub fn is_empty(&self) -> bool {
        self.portions.is_empty()
    }

    /// Aggregate counts.
    pub fn counts(&self) -> &LayerCounts {
        &self.counts
    }

    /// Origin-relative bounds of all portions.
    pub fn aabb(&self) -> BoundingBox {
        self.aabb
    }

    /// World-space bounds of all portions: the origin-relative box with
    /// the layer origin applied.
    pub fn world_aabb(&self) -> (DVec3, DVec3) {
        (
            self.origin + self.aabb.min.as_dvec3(),
            self.origin + self.aabb.max.as_dvec3(),
        )
    }

    /// Origin-relative bounds of one portion, for culling.
    pub fn portion_aabb(&self, portion: PortionId) -> Result<BoundingBox, LayerError> {
        self.portions
            .get(portion.0 as usize)
            .map(|p| p.aabb)
            .ok_or(LayerError::UnknownPortion(portion.0))
    }

    // ========== Accumulation ==========

    /// Check whether `cfg` still fits this layer. Never fails for
    /// capacity pressure; a `false` tells the caller to open a new
    /// layer.
    pub fn can_create_portion(&self, cfg: &PortionConfig) -> Result<bool, LayerError> {
        let Some(buffer) = self.buffer.as_ref() else {
            return Err(LayerError::Finalized);
        };
        let mut new_vertices = 0;
        let mut new_indices = 0;
        for (bucket_index, bucket) in cfg.buckets.iter().enumerate() {
            let cached = cfg.geometry_id.is_some_and(|source| {
                self.bucket_cache.contains_key(&BucketKey {
                    source,
                    bucket: bucket_index,
                })
            });
            if !cached {
                new_vertices += bucket.vertex_count();
                new_indices += bucket.indices.len();
            }
        }
        let current = CapacitySnapshot {
            objects: self.arena.len(),
            vertices: buffer.vertex_count(),
            largest_index_family: IndexFamily::ALL
                .iter()
                .map(|&family| buffer.index_count(family))
                .max()
                .unwrap_or(0),
        };
        Ok(capacity_allows(
            current,
            cfg.buckets.len(),
            new_vertices,
            new_indices,
        ))
    }

    /// Add one renderable object. Callers are expected to have checked
    /// [`Self::can_create_portion`].
    pub fn create_portion(&mut self, cfg: &PortionConfig) -> Result<PortionId, LayerError> {
        let Some(buffer) = self.buffer.as_mut() else {
            return Err(LayerError::Finalized);
        };
        let source = cfg.geometry_id.unwrap_or_else(Uuid::new_v4);
        let decode = cfg.positions_decode_matrix;
        let first_sub = self.arena.len() as u32;
        let mut aabb = BoundingBox::empty();

        for (bucket_index, bucket) in cfg.buckets.iter().enumerate() {
            let geometry = match self.bucket_cache.entry(BucketKey {
                source,
                bucket: bucket_index,
            }) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let vertex_base = buffer.push_positions(&bucket.positions);
                    entry.insert(BucketGeometry::new(
                        vertex_base,
                        bucket.vertex_count() as u32,
                        bucket.triangle_count() as u32,
                        bucket.edge_count() as u32,
                    ))
                }
            };

            let object_id = self.arena.len();
            debug_assert!(
                object_id < MAX_OBJECTS_PER_LAYER,
                "object budget exceeded; check can_create_portion first"
            );
            let index_base = buffer.push_triangles(geometry.family, &bucket.indices, object_id as u16);
            let edge_base = if bucket.edge_indices.is_empty() {
                0
            } else {
                buffer.push_edges(geometry.family, &bucket.edge_indices, object_id as u16)
            };
            self.arena.push(ObjectRecord {
                color: cfg.color.0,
                pick_color: cfg.pick_color.0,
                clippable: false,
                vertex_base: geometry.vertex_base,
                index_base,
                edge_base,
                solid: cfg.solid,
            });
            buffer.push_object_floats(&cfg.matrix.unwrap_or(Mat4::IDENTITY), &decode);

            let bounds = geometry.quantized_aabb(&buffer.positions);
            if let Some(matrix) = cfg.matrix {
                // Oriented box: run all eight corners through the mesh
                // matrix.
                let to_model = matrix * decode;
                for corner in bounds.corners() {
                    aabb = aabb.expanded(to_model.transform_point3(corner));
                }
            } else {
                // No matrix: dequantizing min and max is enough.
                let lo = Vec3::new(bounds.min[0] as f32, bounds.min[1] as f32, bounds.min[2] as f32);
                let hi = Vec3::new(bounds.max[0] as f32, bounds.max[1] as f32, bounds.max[2] as f32);
                aabb = aabb
                    .expanded(decode.transform_point3(lo))
                    .expanded(decode.transform_point3(hi));
            }
        }

        let portion = PortionId(self.portions.len() as u32);
        self.portions.push(PortionRecord {
            sub_portions: first_sub..self.arena.len() as u32,
            aabb,
        });
        self.aabb = self.aabb.union(&aabb);
        self.counts.num_portions += 1;
        Ok(portion)
    }

    /// Build the data textures and switch into the render phase. The
    /// accumulation buffer and geometry cache are discarded here.
    pub fn finalize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layouts: &SharedLayouts,
    ) -> Result<(), LayerError> {
        let Some(buffer) = self.buffer.take() else {
            return Err(LayerError::Finalized);
        };
        self.totals = DrawTotals::from_buffer(&buffer);
        let state = DataTextureState::build(device, queue, &buffer, self.arena.bytes(), layouts);
        self.offsets = buffer.offsets;
        self.instance_matrices = buffer.instance_matrices;
        self.bucket_cache = HashMap::new();
        self.textures = Some(state);
        self.finalized = true;
        tracing::info!(
            layer = %self.id,
            objects = self.arena.len(),
            vertices = self.totals.num_vertices,
            "layer finalized"
        );
        Ok(())
    }

    /// Finalize the CPU-side state machine without a GPU, for tests.
    #[cfg(test)]
    fn finalize_state_only(&mut self) {
        let buffer = self.buffer.take().expect("already finalized");
        self.totals = DrawTotals::from_buffer(&buffer);
        self.offsets = buffer.offsets;
        self.instance_matrices = buffer.instance_matrices;
        self.bucket_cache = HashMap::new();
        self.finalized = true;
    }

    // ========== Per-object mutators ==========

    /// Apply an object's initial flags, adjusting every aggregate
    /// counter the flags touch.
    pub fn init_flags(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let passes = derive_passes(flags, transparent);
        let clippable = flags.has(ObjectFlags::CLIPPABLE);
        let mut ops = Vec::new();
        for sub in range {
            self.arena.set_passes(sub, passes);
            self.arena.set_clippable(sub, clippable);
            self.push_attribute_op(&mut ops, sub, FIELD_PASSES / 4);
            self.push_attribute_op(&mut ops, sub, FIELD_CLIP / 4);
        }
        let c = &mut self.counts;
        c.num_visible += u32::from(flags.has(ObjectFlags::VISIBLE));
        c.num_culled += u32::from(flags.has(ObjectFlags::CULLED));
        c.num_pickable += u32::from(flags.has(ObjectFlags::PICKABLE));
        c.num_clippable += u32::from(clippable);
        c.num_edges += u32::from(flags.has(ObjectFlags::EDGES));
        c.num_xrayed += u32::from(flags.has(ObjectFlags::XRAYED));
        c.num_highlighted += u32::from(flags.has(ObjectFlags::HIGHLIGHTED));
        c.num_selected += u32::from(flags.has(ObjectFlags::SELECTED));
        c.num_transparent += u32::from(transparent);
        self.perform(queue, ops);
        Ok(())
    }

    /// Update visibility.
    pub fn set_visible(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_visible, flags.has(ObjectFlags::VISIBLE));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update highlight state.
    pub fn set_highlighted(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(
            &mut self.counts.num_highlighted,
            flags.has(ObjectFlags::HIGHLIGHTED),
        );
        self.perform(queue, ops);
        Ok(())
    }

    /// Update x-ray state.
    pub fn set_xrayed(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_xrayed, flags.has(ObjectFlags::XRAYED));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update selection state.
    pub fn set_selected(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_selected, flags.has(ObjectFlags::SELECTED));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update edge emphasis.
    pub fn set_edges(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_edges, flags.has(ObjectFlags::EDGES));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update culled state.
    pub fn set_culled(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_culled, flags.has(ObjectFlags::CULLED));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update pickability.
    pub fn set_pickable(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_pickable, flags.has(ObjectFlags::PICKABLE));
        self.perform(queue, ops);
        Ok(())
    }

    /// Update transparency routing.
    pub fn set_transparent(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<(), LayerError> {
        let ops = self.passes_ops(portion, flags, transparent)?;
        bump(&mut self.counts.num_transparent, transparent);
        self.perform(queue, ops);
        Ok(())
    }

    /// Update section-plane clippability.
    pub fn set_clippable(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        flags: ObjectFlags,
    ) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let clippable = flags.has(ObjectFlags::CLIPPABLE);
        let mut ops = Vec::new();
        for sub in range {
            self.arena.set_clippable(sub, clippable);
            self.push_attribute_op(&mut ops, sub, FIELD_CLIP / 4);
        }
        bump(&mut self.counts.num_clippable, clippable);
        self.perform(queue, ops);
        Ok(())
    }

    /// Update the quantized material color.
    pub fn set_color(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        color: PackedRgba,
    ) -> Result<(), LayerError> {
        let ops = self.color_ops(portion, color)?;
        self.perform(queue, ops);
        Ok(())
    }

    /// Update the object's translation offset.
    pub fn set_offset(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        offset: Vec3,
    ) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let mut ops = Vec::new();
        for sub in range {
            let base = sub as usize * 4;
            self.offsets[base..base + 3].copy_from_slice(&offset.to_array());
            match self.batcher.record_update() {
                UploadDecision::Texel => ops.push(UploadOp::OffsetTexel { object: sub }),
                UploadDecision::Suppressed => self.dirty_offsets = true,
            }
        }
        self.perform(queue, ops);
        Ok(())
    }

    /// Update the object's instancing matrix.
    pub fn set_matrix(
        &mut self,
        queue: &wgpu::Queue,
        portion: PortionId,
        matrix: &Mat4,
    ) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let mut ops = Vec::new();
        for sub in range {
            let base = sub as usize * 16;
            self.instance_matrices[base..base + 16].copy_from_slice(&matrix.to_cols_array());
            match self.batcher.record_update() {
                UploadDecision::Texel => ops.push(UploadOp::MatrixTexels { object: sub }),
                UploadDecision::Suppressed => self.dirty_matrices = true,
            }
        }
        self.perform(queue, ops);
        Ok(())
    }

    // ========== Deferred update transactions ==========

    /// Enter deferred mode: subsequent mutations only touch the CPU
    /// mirrors, and [`Self::flush_deferred_updates`] uploads each dirty
    /// texture once. Bracket bulk updates (e.g. frustum culling sweeps)
    /// with these.
    pub fn begin_deferred_updates(&mut self) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        self.batcher.begin_deferred();
        Ok(())
    }

    /// Upload every dirty mirror and return to immediate mode. The
    /// renderer calls this for all layers at the start of each frame, so
    /// mutations are on the GPU before any draw.
    pub fn flush_deferred_updates(&mut self, queue: &wgpu::Queue) -> Result<(), LayerError> {
        self.ensure_finalized()?;
        if self.batcher.finish() {
            tracing::trace!(layer = %self.id, "flushing deferred texture updates");
        }
        if let Some(state) = &self.textures {
            if self.dirty_attributes {
                state.attributes().upload_all(queue, self.arena.bytes());
            }
            if self.dirty_offsets {
                state.offsets().upload_all(queue, bytemuck::cast_slice(&self.offsets));
            }
            if self.dirty_matrices {
                state
                    .instance_matrices()
                    .upload_all(queue, bytemuck::cast_slice(&self.instance_matrices));
            }
        }
        self.dirty_attributes = false;
        self.dirty_offsets = false;
        self.dirty_matrices = false;
        Ok(())
    }

    /// Rewrite the layer's frame uniform for this frame, rebased onto
    /// the layer origin.
    pub fn update_frame(&self, queue: &wgpu::Queue, frame: &FrameContext) {
        if let Some(state) = &self.textures {
            state.write_frame(queue, &FrameUniforms::for_origin(frame, self.origin));
        }
    }

    // ========== Draw entry points ==========

    /// Draw opaque color geometry.
    pub fn draw_color_opaque<'a>(
        &'a self,
        renderer: &'a ColorRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions
            || c.num_visible == 0
            || c.num_transparent == c.num_portions
            || c.num_xrayed == c.num_portions
        {
            return;
        }
        self.draw_geometry(rpass, renderer.opaque(), GeometryKind::Triangles);
    }

    /// Draw transparent color geometry.
    pub fn draw_color_transparent<'a>(
        &'a self,
        renderer: &'a ColorRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_transparent == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.transparent(), GeometryKind::Triangles);
    }

    /// Draw a depth-only prepass of opaque geometry.
    pub fn draw_depth<'a>(&'a self, renderer: &'a DepthRenderer, rpass: &mut wgpu::RenderPass<'a>) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.drawable(), GeometryKind::Triangles);
    }

    /// Draw x-rayed silhouettes.
    pub fn draw_silhouette_xrayed<'a>(
        &'a self,
        renderer: &'a SilhouetteRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_xrayed == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.xrayed(), GeometryKind::Triangles);
    }

    /// Draw highlighted silhouettes.
    pub fn draw_silhouette_highlighted<'a>(
        &'a self,
        renderer: &'a SilhouetteRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_highlighted == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.highlighted(), GeometryKind::Triangles);
    }

    /// Draw selected silhouettes.
    pub fn draw_silhouette_selected<'a>(
        &'a self,
        renderer: &'a SilhouetteRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_selected == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.selected(), GeometryKind::Triangles);
    }

    /// Draw edges of opaque objects.
    pub fn draw_edges_color_opaque<'a>(
        &'a self,
        renderer: &'a EdgesRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_edges == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.color_opaque(), GeometryKind::Edges);
    }

    /// Draw edges of transparent objects.
    pub fn draw_edges_color_transparent<'a>(
        &'a self,
        renderer: &'a EdgesRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions
            || c.num_visible == 0
            || c.num_edges == 0
            || c.num_transparent == 0
        {
            return;
        }
        self.draw_geometry(rpass, renderer.color_transparent(), GeometryKind::Edges);
    }

    /// Draw edges of x-rayed objects.
    pub fn draw_edges_xrayed<'a>(
        &'a self,
        renderer: &'a EdgesRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_xrayed == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.xrayed(), GeometryKind::Edges);
    }

    /// Draw edges of highlighted objects.
    pub fn draw_edges_highlighted<'a>(
        &'a self,
        renderer: &'a EdgesRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_highlighted == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.highlighted(), GeometryKind::Edges);
    }

    /// Draw edges of selected objects.
    pub fn draw_edges_selected<'a>(
        &'a self,
        renderer: &'a EdgesRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 || c.num_selected == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.selected(), GeometryKind::Edges);
    }

    /// Draw pick colors.
    pub fn draw_pick_mesh<'a>(
        &'a self,
        renderer: &'a PickRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        if self.vacuous_pick() {
            return;
        }
        self.draw_geometry(rpass, renderer.mesh(), GeometryKind::Triangles);
    }

    /// Draw packed pick depths.
    pub fn draw_pick_depths<'a>(
        &'a self,
        renderer: &'a PickRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        if self.vacuous_pick() {
            return;
        }
        self.draw_geometry(rpass, renderer.depths(), GeometryKind::Triangles);
    }

    /// Draw the snap depth initialization pass over triangles.
    pub fn draw_snap_init<'a>(
        &'a self,
        renderer: &'a SnapRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        if self.vacuous_pick() {
            return;
        }
        self.draw_geometry(rpass, renderer.init(), GeometryKind::Triangles);
    }

    /// Draw snap candidate edges.
    pub fn draw_snap<'a>(&'a self, renderer: &'a SnapRenderer, rpass: &mut wgpu::RenderPass<'a>) {
        if self.vacuous_pick() {
            return;
        }
        self.draw_geometry(rpass, renderer.edges(), GeometryKind::Edges);
    }

    /// Draw occlusion probes.
    pub fn draw_occlusion<'a>(
        &'a self,
        renderer: &'a OcclusionRenderer,
        rpass: &mut wgpu::RenderPass<'a>,
    ) {
        let c = &self.counts;
        if c.num_culled == c.num_portions || c.num_visible == 0 {
            return;
        }
        self.draw_geometry(rpass, renderer.drawable(), GeometryKind::Triangles);
    }

    // ========== Internals ==========

    fn ensure_finalized(&self) -> Result<(), LayerError> {
        if self.finalized {
            Ok(())
        } else {
            Err(LayerError::NotFinalized)
        }
    }

    fn portion_range(&self, portion: PortionId) -> Result<Range<u32>, LayerError> {
        self.portions
            .get(portion.0 as usize)
            .map(|p| p.sub_portions.clone())
            .ok_or(LayerError::UnknownPortion(portion.0))
    }

    fn passes_ops(
        &mut self,
        portion: PortionId,
        flags: ObjectFlags,
        transparent: bool,
    ) -> Result<Vec<UploadOp>, LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let passes = derive_passes(flags, transparent);
        let mut ops = Vec::new();
        for sub in range {
            self.arena.set_passes(sub, passes);
            self.push_attribute_op(&mut ops, sub, FIELD_PASSES / 4);
        }
        Ok(ops)
    }

    fn color_ops(
        &mut self,
        portion: PortionId,
        color: PackedRgba,
    ) -> Result<Vec<UploadOp>, LayerError> {
        self.ensure_finalized()?;
        let range = self.portion_range(portion)?;
        let mut ops = Vec::new();
        for sub in range {
            self.arena.set_color(sub, color.0);
            self.push_attribute_op(&mut ops, sub, FIELD_COLOR / 4);
        }
        Ok(ops)
    }

    fn push_attribute_op(&mut self, ops: &mut Vec<UploadOp>, object: u32, texel: usize) {
        match self.batcher.record_update() {
            UploadDecision::Texel => ops.push(UploadOp::AttributeTexel { object, texel }),
            UploadDecision::Suppressed => self.dirty_attributes = true,
        }
    }

    fn perform(&self, queue: &wgpu::Queue, ops: Vec<UploadOp>) {
        let Some(state) = &self.textures else {
            return;
        };
        for op in ops {
            match op {
                UploadOp::AttributeTexel { object, texel } => {
                    let range = self.arena.texel_range(object, texel);
                    state.attributes().upload_texels(
                        queue,
                        object * OBJECT_ATTRIBUTE_TEXELS + texel as u32,
                        &self.arena.bytes()[range],
                    );
                }
                UploadOp::OffsetTexel { object } => {
                    let base = object as usize * 4;
                    state.offsets().upload_texels(
                        queue,
                        object,
                        bytemuck::cast_slice(&self.offsets[base..base + 4]),
                    );
                }
                UploadOp::MatrixTexels { object } => {
                    let base = object as usize * 16;
                    state.instance_matrices().upload_texels(
                        queue,
                        object * OBJECT_MATRIX_TEXELS,
                        bytemuck::cast_slice(&self.instance_matrices[base..base + 16]),
                    );
                }
            }
        }
    }

    fn vacuous_pick(&self) -> bool {
        let c = &self.counts;
        c.num_culled == c.num_portions || c.num_visible == 0 || c.num_pickable == 0
    }

    fn draw_geometry<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        drawable: &'a Drawable,
        kind: GeometryKind,
    ) {
        let Some(state) = &self.textures else {
            return;
        };
        let Some(pipeline) = drawable.pipeline() else {
            return;
        };
        rpass.set_pipeline(pipeline);
        drawable.bind(rpass);
        for family in IndexFamily::ALL {
            let texels = match kind {
                GeometryKind::Triangles => self.totals.triangle_texels[family.slot()],
                GeometryKind::Edges => self.totals.edge_texels[family.slot()],
            };
            if texels == 0 {
                continue;
            }
            state.bind(rpass, kind, family);
            rpass.draw(0..texels * kind.vertices_per_primitive(), 0..1);
        }
    }
}

fn bump(counter: &mut u32, on: bool) {
    if on {
        *counter += 1;
    } else {
        *counter -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmv_core::BucketSource;

    fn small_bucket(vertices: usize, triangles: usize) -> BucketSource {
        BucketSource {
            positions: (0..vertices * 3).map(|i| i as u16).collect(),
            indices: (0..triangles * 3).map(|i| (i % vertices) as u32).collect(),
            edge_indices: vec![0, 1, 1, 2],
        }
    }

    fn config(buckets: Vec<BucketSource>) -> PortionConfig {
        PortionConfig {
            buckets,
            geometry_id: None,
            positions_decode_matrix: Mat4::IDENTITY,
            matrix: None,
            color: PackedRgba([200, 10, 10, 255]),
            pick_color: PackedRgba([0, 0, 0, 1]),
            solid: true,
        }
    }

    fn test_layer() -> Layer {
        Layer::new(DVec3::ZERO, &RendererConfig::default())
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut layer = test_layer();
        let cfg = config(vec![small_bucket(3, 1)]);
        let portion = layer.create_portion(&cfg).unwrap();

        // Render-side calls before finalize are programmer errors.
        assert_eq!(
            layer
                .passes_ops(portion, ObjectFlags(ObjectFlags::VISIBLE), false)
                .unwrap_err(),
            LayerError::NotFinalized
        );
        assert_eq!(
            layer.begin_deferred_updates().unwrap_err(),
            LayerError::NotFinalized
        );

        layer.finalize_state_only();

        // Accumulation-side calls after finalize as well.
        assert_eq!(layer.create_portion(&cfg).unwrap_err(), LayerError::Finalized);
        assert_eq!(
            layer.can_create_portion(&cfg).unwrap_err(),
            LayerError::Finalized
        );

        // Unknown portions are reported, not indexed out of bounds.
        assert_eq!(
            layer
                .passes_ops(PortionId(99), ObjectFlags(0), false)
                .unwrap_err(),
            LayerError::UnknownPortion(99)
        );
    }

    #[test]
    fn test_create_portion_spans_buckets() {
        let mut layer = test_layer();
        let portion = layer
            .create_portion(&config(vec![small_bucket(3, 1), small_bucket(300, 2)]))
            .unwrap();
        assert_eq!(portion, PortionId(0));
        assert_eq!(layer.counts().num_portions, 1);
        // Two sub-portions, one per bucket, in different families.
        assert_eq!(layer.portions[0].sub_portions, 0..2);
        let buffer = layer.buffer.as_ref().unwrap();
        assert_eq!(buffer.bits8.triangle_ids, vec![0]);
        assert_eq!(buffer.bits16.triangle_ids, vec![1]);
    }

    #[test]
    fn test_instanced_portions_share_vertices() {
        let mut layer = test_layer();
        let geometry_id = Some(Uuid::new_v4());
        let mut cfg = config(vec![small_bucket(4, 2)]);
        cfg.geometry_id = geometry_id;

        layer.create_portion(&cfg).unwrap();
        let vertices_after_first = layer.buffer.as_ref().unwrap().vertex_count();
        layer.create_portion(&cfg).unwrap();
        let buffer = layer.buffer.as_ref().unwrap();

        // Positions deduplicated, indices duplicated per instance so the
        // object-id entries stay unambiguous.
        assert_eq!(buffer.vertex_count(), vertices_after_first);
        assert_eq!(buffer.bits8.triangle_ids, vec![0, 1]);
    }

    #[test]
    fn test_capacity_object_budget() {
        let snapshot = CapacitySnapshot {
            objects: MAX_OBJECTS_PER_LAYER - 1,
            vertices: 0,
            largest_index_family: 0,
        };
        assert!(capacity_allows(snapshot, 1, 3, 9));
        assert!(!capacity_allows(snapshot, 2, 3, 9));
    }

    #[test]
    fn test_capacity_vertex_budget() {
        let snapshot = CapacitySnapshot {
            objects: 0,
            vertices: MAX_VERTICES_PER_LAYER - 10,
            largest_index_family: 0,
        };
        assert!(capacity_allows(snapshot, 1, 10, 0));
        assert!(!capacity_allows(snapshot, 1, 11, 0));
    }

    #[test]
    fn test_capacity_clamps_against_largest_family() {
        // Headroom is measured against the fullest bit-width family even
        // when the incoming geometry would land in an empty one. A
        // portion the 32-bit store could easily hold is rejected because
        // the 8-bit store is nearly full.
        let snapshot = CapacitySnapshot {
            objects: 0,
            vertices: 0,
            largest_index_family: MAX_INDICES_PER_LAYER - 3,
        };
        assert!(!capacity_allows(snapshot, 1, 100_000, 6));
        assert!(capacity_allows(snapshot, 1, 100_000, 3));
    }

    #[test]
    fn test_can_create_portion_skips_cached_buckets() {
        let mut layer = test_layer();
        let mut cfg = config(vec![small_bucket(4, 2)]);
        cfg.geometry_id = Some(Uuid::new_v4());
        layer.create_portion(&cfg).unwrap();

        // The same geometry again accounts no new vertices or indices;
        // only the sub-portion count grows.
        assert!(layer.can_create_portion(&cfg).unwrap());
        let buffer = layer.buffer.as_ref().unwrap();
        assert_eq!(buffer.vertex_count(), 4);
    }

    #[test]
    fn test_set_visible_round_trip_restores_record_and_counter() {
        let mut layer = test_layer();
        let portion = layer.create_portion(&config(vec![small_bucket(3, 1)])).unwrap();
        layer.finalize_state_only();

        let visible = ObjectFlags(ObjectFlags::VISIBLE | ObjectFlags::EDGES);
        let hidden = ObjectFlags(ObjectFlags::EDGES);
        layer.init_flags_state(portion, visible, false);

        let record_before = layer.arena.record(0).to_vec();
        let visible_before = layer.counts.num_visible;

        layer.passes_ops(portion, hidden, false).unwrap();
        bump(&mut layer.counts.num_visible, false);
        assert_ne!(layer.arena.record(0), &record_before[..]);

        layer.passes_ops(portion, visible, false).unwrap();
        bump(&mut layer.counts.num_visible, true);
        assert_eq!(layer.arena.record(0), &record_before[..]);
        assert_eq!(layer.counts.num_visible, visible_before);
    }

    #[test]
    fn test_deferred_bracket_matches_immediate_mirror() {
        let build = || {
            let mut layer = test_layer();
            let mut portions = Vec::new();
            for _ in 0..20 {
                portions.push(layer.create_portion(&config(vec![small_bucket(3, 1)])).unwrap());
            }
            layer.finalize_state_only();
            (layer, portions)
        };

        // Immediate path: every mutation decides its own upload.
        let (mut immediate, portions) = build();
        for (i, &portion) in portions.iter().enumerate() {
            let ops = immediate.color_ops(portion, PackedRgba([i as u8, 0, 0, 255])).unwrap();
            drop(ops);
        }

        // Deferred path: one bracket around the same mutations.
        let (mut deferred, portions) = build();
        deferred.begin_deferred_updates().unwrap();
        for (i, &portion) in portions.iter().enumerate() {
            let ops = deferred.color_ops(portion, PackedRgba([i as u8, 0, 0, 255])).unwrap();
            assert!(ops.is_empty());
        }
        assert!(deferred.dirty_attributes);

        // The mirrors agree byte for byte, so the texture contents after
        // the deferred flush equal the immediate path's.
        assert_eq!(immediate.arena.bytes(), deferred.arena.bytes());
    }

    #[test]
    fn test_mutators_escalate_to_deferred_past_threshold() {
        let mut layer = test_layer();
        let mut portions = Vec::new();
        for _ in 0..20 {
            portions.push(layer.create_portion(&config(vec![small_bucket(3, 1)])).unwrap());
        }
        layer.finalize_state_only();

        let mut uploads = 0;
        for &portion in &portions {
            uploads += layer.color_ops(portion, PackedRgba::WHITE).unwrap().len();
        }
        // Threshold defaults to 10: the first ten mutations upload
        // texels, the rest ride the frame-boundary flush.
        assert_eq!(uploads, 10);
        assert!(layer.dirty_attributes);
    }

    #[test]
    fn test_portion_aabb_applies_matrix() {
        let mut layer = test_layer();
        let mut cfg = config(vec![BucketSource {
            positions: vec![0, 0, 0, 10, 20, 30],
            indices: vec![0, 1, 0],
            edge_indices: vec![],
        }]);
        cfg.matrix = Some(Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0)));
        let portion = layer.create_portion(&cfg).unwrap();
        let aabb = layer.portion_aabb(portion).unwrap();
        assert_eq!(aabb.min, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(110.0, 20.0, 30.0));
    }

    impl Layer {
        /// Counter-adjusting subset of `init_flags`, without a queue.
        fn init_flags_state(&mut self, portion: PortionId, flags: ObjectFlags, transparent: bool) {
            let range = self.portion_range(portion).unwrap();
            let passes = derive_passes(flags, transparent);
            for sub in range {
                self.arena.set_passes(sub, passes);
            }
            self.counts.num_visible += u32::from(flags.has(ObjectFlags::VISIBLE));
            self.counts.num_edges += u32::from(flags.has(ObjectFlags::EDGES));
        }
    }
}
