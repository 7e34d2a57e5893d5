//! Render pass execution.
//!
//! Functions for executing the main color pass and the offscreen
//! pick/snap/occlusion/depth passes over a set of layers. Pass order
//! within the main pass: opaque fills, opaque edges, emphasis
//! silhouettes and edges, then transparent geometry last.

use crate::layer::Layer;
use crate::sub_renderers::{
    ColorRenderer, DepthRenderer, EdgesRenderer, OcclusionRenderer, PickRenderer,
    SilhouetteRenderer, SnapRenderer,
};

/// Main pass parameters.
pub struct MainPassParams<'a> {
    /// Layers to draw.
    pub layers: &'a [Layer],
    /// Color renderer.
    pub color: &'a ColorRenderer,
    /// Silhouette renderer.
    pub silhouette: &'a SilhouetteRenderer,
    /// Edges renderer.
    pub edges: &'a EdgesRenderer,
    /// Depth view.
    pub depth_view: &'a wgpu::TextureView,
    /// Clear color.
    pub clear_color: wgpu::Color,
}

/// Execute the main color pass.
pub fn render_main_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    params: &MainPassParams<'_>,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Main Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(params.clear_color),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: params.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    for layer in params.layers {
        layer.draw_color_opaque(params.color, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_edges_color_opaque(params.edges, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_silhouette_xrayed(params.silhouette, &mut rpass);
        layer.draw_edges_xrayed(params.edges, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_silhouette_highlighted(params.silhouette, &mut rpass);
        layer.draw_edges_highlighted(params.edges, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_silhouette_selected(params.silhouette, &mut rpass);
        layer.draw_edges_selected(params.edges, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_color_transparent(params.color, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_edges_color_transparent(params.edges, &mut rpass);
    }
}

/// Pick pass parameters.
pub struct PickPassParams<'a> {
    /// Layers to draw.
    pub layers: &'a [Layer],
    /// Pick renderer.
    pub pick: &'a PickRenderer,
    /// Depth view of the pick target.
    pub depth_view: &'a wgpu::TextureView,
}

/// Execute the pick color pass into an offscreen target.
pub fn render_pick_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    params: &PickPassParams<'_>,
) {
    let mut rpass = begin_offscreen_pass(encoder, "Pick Pass", view, params.depth_view);
    for layer in params.layers {
        layer.draw_pick_mesh(params.pick, &mut rpass);
    }
}

/// Execute the packed pick depth pass into an offscreen target.
pub fn render_pick_depth_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    params: &PickPassParams<'_>,
) {
    let mut rpass = begin_offscreen_pass(encoder, "Pick Depth Pass", view, params.depth_view);
    for layer in params.layers {
        layer.draw_pick_depths(params.pick, &mut rpass);
    }
}

/// Snap pass parameters.
pub struct SnapPassParams<'a> {
    /// Layers to draw.
    pub layers: &'a [Layer],
    /// Snap renderer.
    pub snap: &'a SnapRenderer,
    /// Depth view of the snap target.
    pub depth_view: &'a wgpu::TextureView,
}

/// Execute the snap pass: surface depths first, then candidate edges.
pub fn render_snap_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    params: &SnapPassParams<'_>,
) {
    let mut rpass = begin_offscreen_pass(encoder, "Snap Pass", view, params.depth_view);
    for layer in params.layers {
        layer.draw_snap_init(params.snap, &mut rpass);
    }
    for layer in params.layers {
        layer.draw_snap(params.snap, &mut rpass);
    }
}

/// Occlusion pass parameters.
pub struct OcclusionPassParams<'a> {
    /// Layers to draw.
    pub layers: &'a [Layer],
    /// Occlusion renderer.
    pub occlusion: &'a OcclusionRenderer,
    /// Depth view of the occlusion target.
    pub depth_view: &'a wgpu::TextureView,
}

/// Execute the occlusion probe pass into an offscreen target.
pub fn render_occlusion_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    params: &OcclusionPassParams<'_>,
) {
    let mut rpass = begin_offscreen_pass(encoder, "Occlusion Pass", view, params.depth_view);
    for layer in params.layers {
        layer.draw_occlusion(params.occlusion, &mut rpass);
    }
}

/// Depth prepass parameters.
pub struct DepthPassParams<'a> {
    /// Layers to draw.
    pub layers: &'a [Layer],
    /// Depth renderer.
    pub depth: &'a DepthRenderer,
    /// Depth view to fill.
    pub depth_view: &'a wgpu::TextureView,
}

/// Execute a depth-only prepass (no color attachment).
pub fn render_depth_pass(encoder: &mut wgpu::CommandEncoder, params: &DepthPassParams<'_>) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Depth Pass"),
        color_attachments: &[],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: params.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    for layer in params.layers {
        layer.draw_depth(params.depth, &mut rpass);
    }
}

fn begin_offscreen_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &str,
    view: &'a wgpu::TextureView,
    depth_view: &'a wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
