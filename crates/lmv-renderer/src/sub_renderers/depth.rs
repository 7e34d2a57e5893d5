//! Depth-only prepass renderer.

use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

/// Draws visible opaque geometry into the depth buffer only.
pub struct DepthRenderer {
    drawable: Drawable,
}

impl DepthRenderer {
    /// Build the depth pipeline.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let drawable = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Depth Pipeline",
                pass: RenderPass::ColorOpaque,
                geometry: GeometryKind::Triangles,
                clip: PassClip::Scene,
                outputs: Outputs::default(),
                effect: Effect::DepthOnly,
            },
            DrawTarget::depth_only(),
            depth_format,
        );
        Self { drawable }
    }

    /// The depth drawable.
    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }
}
