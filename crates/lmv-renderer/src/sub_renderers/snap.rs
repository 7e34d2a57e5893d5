//! Snap pass renderer.
//!
//! Writes origin-relative positions and view depths of pickable
//! geometry into a float target the snapping logic reads back: one
//! triangle pass to establish surface depths, one edge pass for the
//! snap candidates.

use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

use super::SNAP_TARGET_FORMAT;

/// Draws snap-candidate geometry around the cursor.
pub struct SnapRenderer {
    init: Drawable,
    edges: Drawable,
}

impl SnapRenderer {
    /// Build the snap pipelines.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let build = |label, geometry| {
            Drawable::new(
                device,
                layouts,
                DrawableSpec {
                    label,
                    pass: RenderPass::Pick,
                    geometry,
                    clip: PassClip::PickViewport,
                    outputs: Outputs::default(),
                    effect: Effect::SnapDepth,
                },
                DrawTarget::opaque(SNAP_TARGET_FORMAT),
                depth_format,
            )
        };
        Self {
            init: build("Snap Init Pipeline", GeometryKind::Triangles),
            edges: build("Snap Edge Pipeline", GeometryKind::Edges),
        }
    }

    /// Aim both pipelines at the snap viewport.
    pub fn set_pick_clip(&self, queue: &wgpu::Queue, pick_clip: [f32; 4]) {
        self.init.set_pick_clip(queue, pick_clip);
        self.edges.set_pick_clip(queue, pick_clip);
    }

    /// Surface depth drawable.
    pub fn init(&self) -> &Drawable {
        &self.init
    }

    /// Edge candidate drawable.
    pub fn edges(&self) -> &Drawable {
        &self.edges
    }
}
