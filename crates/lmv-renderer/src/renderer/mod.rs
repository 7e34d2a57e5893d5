//! Main renderer combining all pass renderers.
//!
//! The [`Renderer`] owns the shared bind group layouts, the per-pass
//! sub-renderers and the layers, and runs the fixed per-frame sequence:
//! [`Renderer::prepare_frame`] flushes every layer's deferred texture
//! updates and rewrites the frame uniforms before any pass executes, so
//! all mutations of a frame are on the GPU before its draws.

pub mod render_pass;

use glam::DVec3;

use crate::config::RendererConfig;
use crate::context::FrameContext;
use crate::error::LayerError;
use crate::layer::Layer;
use crate::sub_renderers::{
    ColorRenderer, DepthRenderer, EdgesRenderer, OcclusionRenderer, PickRenderer,
    SilhouetteRenderer, SnapRenderer,
};
use crate::texture::SharedLayouts;

use render_pass::{
    DepthPassParams, MainPassParams, OcclusionPassParams, PickPassParams, SnapPassParams,
};

/// Handle to a layer owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(usize);

/// Main renderer combining all pass renderers.
pub struct Renderer {
    config: RendererConfig,
    layouts: SharedLayouts,

    // Pass renderers
    color: ColorRenderer,
    silhouette: SilhouetteRenderer,
    edges: EdgesRenderer,
    pick: PickRenderer,
    snap: SnapRenderer,
    occlusion: OcclusionRenderer,
    depth: DepthRenderer,

    layers: Vec<Layer>,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Create a renderer targeting the given color and depth formats.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        config: RendererConfig,
    ) -> Self {
        let layouts = SharedLayouts::new(device);
        let color = ColorRenderer::new(device, &layouts, format, depth_format);
        let silhouette = SilhouetteRenderer::new(device, &layouts, format, depth_format);
        let edges = EdgesRenderer::new(device, &layouts, format, depth_format);
        let pick = PickRenderer::new(device, &layouts, depth_format);
        let snap = SnapRenderer::new(device, &layouts, depth_format);
        let occlusion = OcclusionRenderer::new(device, &layouts, depth_format);
        let depth = DepthRenderer::new(device, &layouts, depth_format);
        Self {
            config,
            layouts,
            color,
            silhouette,
            edges,
            pick,
            snap,
            occlusion,
            depth,
            layers: Vec::new(),
            clear_color: wgpu::Color {
                r: 0.15,
                g: 0.15,
                b: 0.18,
                a: 1.0,
            },
        }
    }

    /// Open a new accumulation layer at the given world origin. Callers
    /// open another layer whenever `can_create_portion` answers false.
    pub fn create_layer(&mut self, origin: DVec3) -> LayerId {
        self.layers.push(Layer::new(origin, &self.config));
        LayerId(self.layers.len() - 1)
    }

    /// A layer by handle.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id.0)
    }

    /// A layer by handle, mutable.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(id.0)
    }

    /// All layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Finalize one layer: build its textures and drop its accumulation
    /// state.
    pub fn finalize_layer(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: LayerId,
    ) -> Result<(), LayerError> {
        let Some(layer) = self.layers.get_mut(id.0) else {
            return Err(LayerError::UnknownLayer(id.0));
        };
        layer.finalize(device, queue, &self.layouts)
    }

    /// The frame hook: flush every layer's deferred texture updates,
    /// rewrite frame uniforms and emphasis materials. Must run before
    /// any pass of the frame is encoded.
    pub fn prepare_frame(&mut self, queue: &wgpu::Queue, frame: &FrameContext) {
        for layer in &mut self.layers {
            // Layers still accumulating have nothing to flush.
            match layer.flush_deferred_updates(queue) {
                Ok(()) => layer.update_frame(queue, frame),
                Err(LayerError::NotFinalized) => {}
                Err(err) => tracing::warn!(layer = %layer.id(), error = %err, "flush failed"),
            }
        }
        self.silhouette.update_materials(queue, &self.config.emphasis);
        self.edges.update_materials(queue, &self.config.emphasis);
    }

    /// Aim the pick and snap pipelines at a picking viewport (clip-space
    /// xy scale and offset).
    pub fn set_pick_clip(&self, queue: &wgpu::Queue, pick_clip: [f32; 4]) {
        self.pick.set_pick_clip(queue, pick_clip);
        self.snap.set_pick_clip(queue, pick_clip);
    }

    /// Background clear color of the main pass.
    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Encode the main color pass over all layers.
    pub fn render_main_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_main_pass(
            encoder,
            view,
            &MainPassParams {
                layers: &self.layers,
                color: &self.color,
                silhouette: &self.silhouette,
                edges: &self.edges,
                depth_view,
                clear_color: self.clear_color,
            },
        );
    }

    /// Encode the pick color pass.
    pub fn render_pick_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_pick_pass(
            encoder,
            view,
            &PickPassParams {
                layers: &self.layers,
                pick: &self.pick,
                depth_view,
            },
        );
    }

    /// Encode the packed pick depth pass.
    pub fn render_pick_depth_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_pick_depth_pass(
            encoder,
            view,
            &PickPassParams {
                layers: &self.layers,
                pick: &self.pick,
                depth_view,
            },
        );
    }

    /// Encode the snap pass.
    pub fn render_snap_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_snap_pass(
            encoder,
            view,
            &SnapPassParams {
                layers: &self.layers,
                snap: &self.snap,
                depth_view,
            },
        );
    }

    /// Encode the occlusion probe pass.
    pub fn render_occlusion_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_occlusion_pass(
            encoder,
            view,
            &OcclusionPassParams {
                layers: &self.layers,
                occlusion: &self.occlusion,
                depth_view,
            },
        );
    }

    /// Encode a depth-only prepass.
    pub fn render_depth_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        depth_view: &wgpu::TextureView,
    ) {
        render_pass::render_depth_pass(
            encoder,
            &DepthPassParams {
                layers: &self.layers,
                depth: &self.depth,
                depth_view,
            },
        );
    }
}
