//! Color pass renderer (opaque and transparent).

use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

/// Draws objects with their material colors.
pub struct ColorRenderer {
    opaque: Drawable,
    transparent: Drawable,
}

impl ColorRenderer {
    /// Build both color pipelines.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let opaque = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Color Opaque Pipeline",
                pass: RenderPass::ColorOpaque,
                geometry: GeometryKind::Triangles,
                clip: PassClip::Scene,
                outputs: Outputs::default(),
                effect: Effect::FlatColor,
            },
            DrawTarget::opaque(format),
            depth_format,
        );
        let transparent = Drawable::new(
            device,
            layouts,
            DrawableSpec {
                label: "Color Transparent Pipeline",
                pass: RenderPass::ColorTransparent,
                geometry: GeometryKind::Triangles,
                clip: PassClip::Scene,
                outputs: Outputs::default(),
                effect: Effect::FlatColor,
            },
            DrawTarget::blended(format),
            depth_format,
        );
        Self {
            opaque,
            transparent,
        }
    }

    /// Opaque color drawable.
    pub fn opaque(&self) -> &Drawable {
        &self.opaque
    }

    /// Transparent color drawable.
    pub fn transparent(&self) -> &Drawable {
        &self.transparent
    }
}
