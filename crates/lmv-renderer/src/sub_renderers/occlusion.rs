//! Occlusion probe renderer.

use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

use super::PICK_TARGET_FORMAT;

/// Draws visible opaque geometry in solid white for occlusion readback.
pub struct OcclusionRenderer {
    drawable: Drawable,
}

impl OcclusionRenderer {
    /// Build the occlusion pipeline.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let drawable = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Occlusion Pipeline",
                pass: RenderPass::ColorOpaque,
                geometry: GeometryKind::Triangles,
                clip: PassClip::Scene,
                outputs: Outputs::default(),
                effect: Effect::Occlusion,
            },
            DrawTarget::opaque(PICK_TARGET_FORMAT),
            depth_format,
        );
        Self { drawable }
    }

    /// The occlusion drawable.
    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}
