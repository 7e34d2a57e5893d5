//! Drawables: one generated pipeline per render-pass variant.
//!
//! A [`DrawableSpec`] captures everything that differs between the
//! variants: the render-pass selector an object's flags are compared
//! against, the clip-space transform, which vertex outputs exist, and
//! the fragment effect. [`Drawable`] turns a spec into a shader module
//! and pipeline; a drawable whose program could not be generated stays
//! invalid and its draws are silently skipped.

mod wgsl;

pub use wgsl::ShaderGenError;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::layer::RenderPass;
use crate::texture::SharedLayouts;

/// Primitive topology of a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Triangle list addressed through the triangle index textures.
    Triangles,
    /// Line list addressed through the edge index textures.
    Edges,
}

impl GeometryKind {
    /// Vertices drawn per primitive.
    pub fn vertices_per_primitive(self) -> u32 {
        match self {
            GeometryKind::Triangles => 3,
            GeometryKind::Edges => 2,
        }
    }

    fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            GeometryKind::Triangles => wgpu::PrimitiveTopology::TriangleList,
            GeometryKind::Edges => wgpu::PrimitiveTopology::LineList,
        }
    }
}

/// How clip-space positions are finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassClip {
    /// Plain scene projection.
    Scene,
    /// Remap into the 1x1-ish picking viewport around the cursor.
    PickViewport,
}

/// Optional vertex-stage outputs. The generator unions these with what
/// the fragment effect reads and emits only what is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outputs {
    /// Per-object color from the attribute texture.
    pub vertex_color: bool,
    /// Per-object pick color.
    pub pick_color: bool,
    /// View-space position.
    pub view_position: bool,
    /// Origin-relative world position.
    pub world_position: bool,
}

impl Outputs {
    /// Union of two output sets.
    pub fn union(self, other: Outputs) -> Outputs {
        Outputs {
            vertex_color: self.vertex_color || other.vertex_color,
            pick_color: self.pick_color || other.pick_color,
            view_position: self.view_position || other.view_position,
            world_position: self.world_position || other.world_position,
        }
    }
}

/// Fragment-stage families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Shade with the object's color.
    FlatColor,
    /// Fill with the pass uniform color (silhouettes, emphasis edges).
    SilhouetteFill,
    /// Emit the object's pick color.
    PickColor,
    /// Emit depth packed into RGBA bytes.
    PackedDepth,
    /// Emit origin-relative position and view depth for snapping.
    SnapDepth,
    /// Solid white for occlusion probes.
    Occlusion,
    /// Depth-only, no color target.
    DepthOnly,
}

/// Declarative description of one render-pass variant.
#[derive(Debug, Clone, Copy)]
pub struct DrawableSpec {
    /// Pipeline label.
    pub label: &'static str,
    /// Render-pass selector objects are compared against.
    pub pass: RenderPass,
    /// Primitive topology family.
    pub geometry: GeometryKind,
    /// Clip-space finishing.
    pub clip: PassClip,
    /// Extra vertex outputs beyond what the effect needs.
    pub outputs: Outputs,
    /// Fragment effect.
    pub effect: Effect,
}

/// Per-pass uniform data bound at group 2.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PassUniforms {
    fill_color: [f32; 4],
    pick_clip: [f32; 4],
}

impl Default for PassUniforms {
    fn default() -> Self {
        Self {
            fill_color: [1.0, 1.0, 1.0, 1.0],
            pick_clip: [1.0, 1.0, 0.0, 0.0],
        }
    }
}

/// Color-target description of one variant.
pub struct DrawTarget {
    /// Color format; `None` for depth-only passes.
    pub format: Option<wgpu::TextureFormat>,
    /// Blend state for the color target.
    pub blend: Option<wgpu::BlendState>,
    /// Whether the pass writes depth.
    pub depth_write: bool,
}

impl DrawTarget {
    /// Opaque geometry into a color target.
    pub fn opaque(format: wgpu::TextureFormat) -> Self {
        Self {
            format: Some(format),
            blend: None,
            depth_write: true,
        }
    }

    /// Alpha-blended geometry; depth writes off.
    pub fn blended(format: wgpu::TextureFormat) -> Self {
        Self {
            format: Some(format),
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_write: false,
        }
    }

    /// Depth-only, no color target.
    pub fn depth_only() -> Self {
        Self {
            format: None,
            blend: None,
            depth_write: true,
        }
    }
}

/// One generated render pipeline plus its pass uniform.
pub struct Drawable {
    spec: DrawableSpec,
    pipeline: Option<wgpu::RenderPipeline>,
    pass_buffer: wgpu::Buffer,
    pass_group: wgpu::BindGroup,
}

impl Drawable {
    /// Generate the program for `spec` and build its pipeline. On
    /// generation failure the drawable is created invalid and logs a
    /// warning; rendering degrades by skipping the pass instead of
    /// failing the viewer.
    pub fn new(
        device: &wgpu::Device,
        layouts: &SharedLayouts,
        spec: DrawableSpec,
        target: DrawTarget,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let pass_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(spec.label),
            contents: bytemuck::bytes_of(&PassUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let pass_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(spec.label),
            layout: &layouts.pass,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: pass_buffer.as_entire_binding(),
            }],
        });

        let pipeline = match wgsl::compose(&spec) {
            Ok(source) => Some(build_pipeline(
                device,
                layouts,
                &spec,
                &source,
                &target,
                depth_format,
            )),
            Err(err) => {
                tracing::warn!(label = spec.label, error = %err, "drawable disabled");
                None
            }
        };

        Self {
            spec,
            pipeline,
            pass_buffer,
            pass_group,
        }
    }

    /// Whether the underlying program was built.
    pub fn is_valid(&self) -> bool {
        self.pipeline.is_some()
    }

    /// The pipeline, if the program was built.
    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    /// The variant's spec.
    pub fn spec(&self) -> &DrawableSpec {
        &self.spec
    }

    /// Bind the pass uniform (group 2).
    pub fn bind<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_bind_group(2, &self.pass_group, &[]);
    }

    /// Update the fill color used by silhouette-style effects.
    pub fn set_fill_color(&self, queue: &wgpu::Queue, color: [f32; 4]) {
        queue.write_buffer(&self.pass_buffer, 0, bytemuck::bytes_of(&color));
    }

    /// Update the pick-viewport clip remap (xy scale, zw offset).
    pub fn set_pick_clip(&self, queue: &wgpu::Queue, pick_clip: [f32; 4]) {
        queue.write_buffer(&self.pass_buffer, 16, bytemuck::bytes_of(&pick_clip));
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layouts: &SharedLayouts,
    spec: &DrawableSpec,
    source: &str,
    target: &DrawTarget,
    depth_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(spec.label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(spec.label),
        bind_group_layouts: &[&layouts.frame, &layouts.textures, &layouts.pass],
        push_constant_ranges: &[],
    });

    let targets = [target.format.map(|format| wgpu::ColorTargetState {
        format,
        blend: target.blend,
        write_mask: wgpu::ColorWrites::ALL,
    })];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            // Geometry is pulled from the data textures; no vertex buffers.
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: if target.format.is_some() { &targets } else { &[] },
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.geometry.topology(),
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: depth_format,
            depth_write_enabled: target.depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
