//! Pick pass renderer (pick colors and packed pick depths).

use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

use super::PICK_TARGET_FORMAT;

/// Draws pickable objects into the small pick viewport.
pub struct PickRenderer {
    mesh: Drawable,
    depths: Drawable,
}

impl PickRenderer {
    /// Build the pick pipelines.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let mesh = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Pick Mesh Pipeline",
                pass: RenderPass::Pick,
                geometry: GeometryKind::Triangles,
                clip: PassClip::PickViewport,
                outputs: Outputs::default(),
                effect: Effect::PickColor,
            },
            DrawTarget::opaque(PICK_TARGET_FORMAT),
            depth_format,
        );
        let depths = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Pick Depth Pipeline",
                pass: RenderPass::Pick,
                geometry: GeometryKind::Triangles,
                clip: PassClip::PickViewport,
                outputs: Outputs::default(),
                effect: Effect::PackedDepth,
            },
            DrawTarget::opaque(PICK_TARGET_FORMAT),
            depth_format,
        );
        Self { mesh, depths }
    }

    /// Aim both pipelines at the picking viewport: clip-space xy scale
    /// and offset centering the cursor.
    pub fn set_pick_clip(&self, queue: &wgpu::Queue, pick_clip: [f32; 4]) {
        self.mesh.set_pick_clip(queue, pick_clip);
        self.depths.set_pick_clip(queue, pick_clip);
    }

    /// Pick color drawable.
    pub fn mesh(&self) -> &Drawable {
        &self.mesh
    }

    /// Packed depth drawable.
    pub fn depths(&self) -> &Drawable {
        &self.depths
    }
}
