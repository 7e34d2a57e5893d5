//! Edge line renderer.

use crate::config::EmphasisConfig;
use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

/// Draws display edges, in object colors or emphasis colors.
pub struct EdgesRenderer {
    color_opaque: Drawable,
    color_transparent: Drawable,
    xrayed: Drawable,
    highlighted: Drawable,
    selected: Drawable,
}

impl EdgesRenderer {
    /// Build the five edge pipelines.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let build = |label, pass, effect, target: DrawTarget| {
            Drawable::new(
                device,
                layouts,
                DrawableSpec {
                    label,
                    pass,
                    geometry: GeometryKind::Edges,
                    clip: PassClip::Scene,
                    outputs: Outputs::default(),
                    effect,
                },
                target,
                depth_format,
            )
        };
        Self {
            color_opaque: build(
                "Edges Color Opaque Pipeline",
                RenderPass::EdgesColorOpaque,
                Effect::FlatColor,
                DrawTarget::opaque(format),
            ),
            color_transparent: build(
                "Edges Color Transparent Pipeline",
                RenderPass::EdgesColorTransparent,
                Effect::FlatColor,
                DrawTarget::blended(format),
            ),
            xrayed: build(
                "Edges Xrayed Pipeline",
                RenderPass::EdgesXrayed,
                Effect::SilhouetteFill,
                DrawTarget::blended(format),
            ),
            highlighted: build(
                "Edges Highlighted Pipeline",
                RenderPass::EdgesHighlighted,
                Effect::SilhouetteFill,
                DrawTarget::blended(format),
            ),
            selected: build(
                "Edges Selected Pipeline",
                RenderPass::EdgesSelected,
                Effect::SilhouetteFill,
                DrawTarget::blended(format),
            ),
        }
    }

    /// Push the configured emphasis edge colors into the pass uniforms.
    pub fn update_materials(&self, queue: &wgpu::Queue, emphasis: &EmphasisConfig) {
        self.xrayed.set_fill_color(queue, emphasis.xrayed_edge_color);
        self.highlighted
            .set_fill_color(queue, emphasis.highlighted_edge_color);
        self.selected
            .set_fill_color(queue, emphasis.selected_edge_color);
    }

    /// Edges of opaque objects.
    pub fn color_opaque(&self) -> &Drawable {
        &self.color_opaque
    }

    /// Edges of transparent objects.
    pub fn color_transparent(&self) -> &Drawable {
        &self.color_transparent
    }

    /// Edges of x-rayed objects.
    pub fn xrayed(&self) -> &Drawable {
        &self.xrayed
    }

    /// Edges of highlighted objects.
    pub fn highlighted(&self) -> &Drawable {
        &self.highlighted
    }

    /// Edges of selected objects.
    pub fn selected(&self) -> &Drawable {
        &self.selected
    }
}
