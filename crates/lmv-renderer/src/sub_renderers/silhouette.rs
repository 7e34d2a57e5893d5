//! Silhouette fill renderer for the three emphasis states.

use crate::config::EmphasisConfig;
use crate::drawable::{DrawTarget, Drawable, DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

/// Fills emphasized objects with a uniform color.
pub struct SilhouetteRenderer {
    xrayed: Drawable,
    highlighted: Drawable,
    selected: Drawable,
}

impl SilhouetteRenderer {
    /// Build the three silhouette pipelines.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let build = |label, pass| {
            Drawable::new(
                device,
                layouts,
                DrawableSpec {
                    label,
                    pass,
                    geometry: GeometryKind::Triangles,
                    clip: PassClip::Scene,
                    outputs: Outputs::default(),
                    effect: Effect::SilhouetteFill,
                },
                DrawTarget::blended(format),
                depth_format,
            )
        };
        Self {
            xrayed: build("Silhouette Xrayed Pipeline", RenderPass::SilhouetteXrayed),
            highlighted: build(
                "Silhouette Highlighted Pipeline",
                RenderPass::SilhouetteHighlighted,
            ),
            selected: build(
                "Silhouette Selected Pipeline",
                RenderPass::SilhouetteSelected,
            ),
        }
    }

    /// Push the configured emphasis fill colors into the pass uniforms.
    pub fn update_materials(&self, queue: &wgpu::Queue, emphasis: &EmphasisConfig) {
        self.xrayed.set_fill_color(queue, emphasis.xrayed_fill_color);
        self.highlighted
            .set_fill_color(queue, emphasis.highlighted_fill_color);
        self.selected
            .set_fill_color(queue, emphasis.selected_fill_color);
    }

    /// X-ray silhouette drawable.
    pub fn xrayed(&self) -> &Drawable {
        &self.xrayed
    }

    /// Highlight silhouette drawable.
    pub fn highlighted(&self) -> &Drawable {
        &self.highlighted
    }

    /// Selection silhouette drawable.
    pub fn selected(&self) -> &Drawable {
        &self.selected
    }
}
