//! WGSL assembly for the drawable variants.
//!
//! Every variant shares one addressing block: primitive id to packed
//! object id texel, object record texels, primitive index texel plus
//! vertex base, position texel, decode and instance matrices, offset,
//! then view and projection. The block is one constant assembled in one
//! place so the dozen generated programs cannot drift apart. Everything
//! else (pass selector, optional outputs, fragment effect) is emitted
//! only when the variant's spec asks for it.

use super::{DrawableSpec, Effect, GeometryKind, Outputs, PassClip};
use crate::layer::RenderPass;

/// Spec combinations the generator refuses to emit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ShaderGenError {
    /// The fragment effect has no edge-geometry form.
    #[error("effect {0:?} cannot render edge geometry")]
    UnsupportedGeometry(Effect),
    /// The not-rendered selector never draws; building a program for it
    /// is a spec bug.
    #[error("cannot build a drawable for the not-rendered selector")]
    NotRenderable,
}

/// Bind group declarations common to every variant.
const DECLS: &str = r#"
struct FrameUniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    eye: vec3<f32>,
    _pad: f32,
}

struct PassUniforms {
    fill_color: vec4<f32>,
    pick_clip: vec4<f32>,
}

@group(0) @binding(0) var<uniform> frame: FrameUniforms;
@group(1) @binding(0) var object_attributes: texture_2d<u32>;
@group(1) @binding(1) var object_offsets: texture_2d<f32>;
@group(1) @binding(2) var object_matrices: texture_2d<f32>;
@group(1) @binding(3) var object_decode_matrices: texture_2d<f32>;
@group(1) @binding(4) var vertex_positions: texture_2d<u32>;
@group(1) @binding(5) var primitive_indices: texture_2d<u32>;
@group(1) @binding(6) var primitive_object_ids: texture_2d<u32>;
@group(2) @binding(0) var<uniform> pass_params: PassUniforms;
"#;

/// The shared addressing helpers. The texture widths baked in here must
/// match `crate::constants`.
const ADDRESSING: &str = r#"
fn wrap_coord(index: u32, width: u32) -> vec2<u32> {
    return vec2<u32>(index % width, index / width);
}

fn object_texel(object: u32, texel: u32) -> vec4<u32> {
    return textureLoad(object_attributes, wrap_coord(object * 8u + texel, 512u), 0);
}

fn unpack_u24(texel: vec4<u32>) -> u32 {
    return texel.x | (texel.y << 8u) | (texel.z << 16u);
}

fn instance_matrix(object: u32) -> mat4x4<f32> {
    let base = object * 4u;
    return mat4x4<f32>(
        textureLoad(object_matrices, wrap_coord(base, 512u), 0),
        textureLoad(object_matrices, wrap_coord(base + 1u, 512u), 0),
        textureLoad(object_matrices, wrap_coord(base + 2u, 512u), 0),
        textureLoad(object_matrices, wrap_coord(base + 3u, 512u), 0),
    );
}

fn decode_matrix(object: u32) -> mat4x4<f32> {
    let base = object * 4u;
    return mat4x4<f32>(
        textureLoad(object_decode_matrices, wrap_coord(base, 512u), 0),
        textureLoad(object_decode_matrices, wrap_coord(base + 1u, 512u), 0),
        textureLoad(object_decode_matrices, wrap_coord(base + 2u, 512u), 0),
        textureLoad(object_decode_matrices, wrap_coord(base + 3u, 512u), 0),
    );
}
"#;

const PACK_DEPTH: &str = r#"
fn pack_depth(depth: f32) -> vec4<f32> {
    let shift = vec4<f32>(16777216.0, 65536.0, 256.0, 1.0);
    let mask = vec4<f32>(0.0, 0.00390625, 0.00390625, 0.00390625);
    var packed = fract(depth * shift);
    packed = packed - packed.xxyz * mask;
    return packed;
}
"#;

/// Which byte of the render-pass selector texel a pass compares.
fn pass_channel(pass: RenderPass) -> u32 {
    match pass {
        RenderPass::ColorOpaque | RenderPass::ColorTransparent => 0,
        RenderPass::SilhouetteHighlighted
        | RenderPass::SilhouetteSelected
        | RenderPass::SilhouetteXrayed => 1,
        RenderPass::EdgesColorOpaque
        | RenderPass::EdgesColorTransparent
        | RenderPass::EdgesHighlighted
        | RenderPass::EdgesSelected
        | RenderPass::EdgesXrayed => 2,
        RenderPass::Pick => 3,
        RenderPass::NotRendered => 0,
    }
}

/// Emit the full shader module for one variant.
pub fn compose(spec: &DrawableSpec) -> Result<String, ShaderGenError> {
    if spec.pass == RenderPass::NotRendered {
        return Err(ShaderGenError::NotRenderable);
    }
    if spec.geometry == GeometryKind::Edges && !spec.effect.supports_edges() {
        return Err(ShaderGenError::UnsupportedGeometry(spec.effect));
    }

    // Resolve the outputs once: what the spec asks for plus what the
    // fragment effect reads.
    let outputs = spec.outputs.union(spec.effect.required_outputs());

    let mut source = String::with_capacity(4096);
    source.push_str(DECLS);
    source.push_str(ADDRESSING);
    if spec.effect == Effect::PackedDepth {
        source.push_str(PACK_DEPTH);
    }

    source.push_str(&format!(
        "\nconst RENDER_PASS: u32 = {}u;\nconst VERTS_PER_PRIM: u32 = {}u;\nconst PASS_CHANNEL: u32 = {}u;\n",
        spec.pass.byte(),
        spec.geometry.vertices_per_primitive(),
        pass_channel(spec.pass),
    ));

    source.push_str("\nstruct VsOut {\n    @builtin(position) clip_position: vec4<f32>,\n");
    if outputs.vertex_color {
        source.push_str("    @location(0) color: vec4<f32>,\n");
    }
    if outputs.pick_color {
        source.push_str("    @location(1) pick_color: vec4<f32>,\n");
    }
    if outputs.view_position {
        source.push_str("    @location(2) view_position: vec3<f32>,\n");
    }
    if outputs.world_position {
        source.push_str("    @location(3) world_position: vec3<f32>,\n");
    }
    source.push_str("}\n");

    source.push_str(
        r#"
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VsOut {
    var out: VsOut;
    let prim = vertex_index / VERTS_PER_PRIM;
    let corner = vertex_index % VERTS_PER_PRIM;
    let object = textureLoad(primitive_object_ids, wrap_coord(prim / 8u, 4096u), 0).x;
    let passes = object_texel(object, 2u);
    if (passes[PASS_CHANNEL] != RENDER_PASS) {
        out.clip_position = vec4<f32>(0.0, 0.0, 2.0, 1.0);
        return out;
    }
    let vertex_base = unpack_u24(object_texel(object, 4u));
    let prim_texel = textureLoad(primitive_indices, wrap_coord(prim, 4096u), 0);
    let vertex_id = vertex_base + prim_texel[corner];
    let quantized = vec3<f32>(textureLoad(vertex_positions, wrap_coord(vertex_id, 4096u), 0).xyz);
    let offset = textureLoad(object_offsets, wrap_coord(object, 512u), 0).xyz;
    let model = instance_matrix(object) * decode_matrix(object);
    let world_position = (model * vec4<f32>(quantized, 1.0)).xyz + offset;
    let view_position = frame.view * vec4<f32>(world_position, 1.0);
    var clip_position = frame.proj * view_position;
"#,
    );
    if spec.clip == PassClip::PickViewport {
        source.push_str(
            "    clip_position = vec4<f32>(clip_position.xy * pass_params.pick_clip.xy\n        + pass_params.pick_clip.zw * clip_position.w, clip_position.zw);\n",
        );
    }
    source.push_str("    out.clip_position = clip_position;\n");
    if outputs.vertex_color {
        source.push_str("    out.color = vec4<f32>(object_texel(object, 0u)) / 255.0;\n");
    }
    if outputs.pick_color {
        source.push_str("    out.pick_color = vec4<f32>(object_texel(object, 1u)) / 255.0;\n");
    }
    if outputs.view_position {
        source.push_str("    out.view_position = view_position.xyz;\n");
    }
    if outputs.world_position {
        source.push_str("    out.world_position = world_position;\n");
    }
    source.push_str("    return out;\n}\n");

    source.push_str(fragment_stage(spec.effect));
    Ok(source)
}

fn fragment_stage(effect: Effect) -> &'static str {
    match effect {
        Effect::FlatColor => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return in.color;\n}\n"
        }
        Effect::SilhouetteFill => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return pass_params.fill_color;\n}\n"
        }
        Effect::PickColor => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return in.pick_color;\n}\n"
        }
        Effect::PackedDepth => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return pack_depth(in.clip_position.z);\n}\n"
        }
        Effect::SnapDepth => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return vec4<f32>(in.world_position, -in.view_position.z);\n}\n"
        }
        Effect::Occlusion => {
            "\n@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4<f32> {\n    return vec4<f32>(1.0);\n}\n"
        }
        Effect::DepthOnly => "\n@fragment\nfn fs_main(in: VsOut) {\n}\n",
    }
}

impl Effect {
    /// Outputs the fragment stage reads; unioned into the spec's
    /// requested outputs before emission.
    pub(super) fn required_outputs(self) -> Outputs {
        match self {
            Effect::FlatColor => Outputs {
                vertex_color: true,
                ..Outputs::default()
            },
            Effect::PickColor => Outputs {
                pick_color: true,
                ..Outputs::default()
            },
            Effect::SnapDepth => Outputs {
                view_position: true,
                world_position: true,
                ..Outputs::default()
            },
            Effect::SilhouetteFill
            | Effect::PackedDepth
            | Effect::Occlusion
            | Effect::DepthOnly => Outputs::default(),
        }
    }

    /// Whether the effect has an edge-geometry form.
    pub(super) fn supports_edges(self) -> bool {
        matches!(
            self,
            Effect::FlatColor | Effect::SilhouetteFill | Effect::SnapDepth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(pass: RenderPass, geometry: GeometryKind, effect: Effect) -> DrawableSpec {
        DrawableSpec {
            label: "test",
            pass,
            geometry,
            clip: PassClip::Scene,
            outputs: Outputs::default(),
            effect,
        }
    }

    #[test]
    fn test_addressing_block_is_shared_verbatim() {
        let color = compose(&spec(
            RenderPass::ColorOpaque,
            GeometryKind::Triangles,
            Effect::FlatColor,
        ))
        .unwrap();
        let pick = compose(&spec(
            RenderPass::Pick,
            GeometryKind::Triangles,
            Effect::PickColor,
        ))
        .unwrap();
        // Bit-for-bit identical addressing in every variant.
        assert!(color.contains(ADDRESSING));
        assert!(pick.contains(ADDRESSING));
    }

    #[test]
    fn test_pass_constants() {
        let source = compose(&spec(
            RenderPass::SilhouetteSelected,
            GeometryKind::Triangles,
            Effect::SilhouetteFill,
        ))
        .unwrap();
        assert!(source.contains("const RENDER_PASS: u32 = 4u;"));
        assert!(source.contains("const VERTS_PER_PRIM: u32 = 3u;"));
        assert!(source.contains("const PASS_CHANNEL: u32 = 1u;"));
    }

    #[test]
    fn test_edges_use_two_vertices_per_primitive() {
        let source = compose(&spec(
            RenderPass::EdgesColorOpaque,
            GeometryKind::Edges,
            Effect::FlatColor,
        ))
        .unwrap();
        assert!(source.contains("const VERTS_PER_PRIM: u32 = 2u;"));
        assert!(source.contains("const PASS_CHANNEL: u32 = 2u;"));
    }

    #[test]
    fn test_unused_outputs_are_not_emitted() {
        let source = compose(&spec(
            RenderPass::ColorOpaque,
            GeometryKind::Triangles,
            Effect::SilhouetteFill,
        ))
        .unwrap();
        assert!(!source.contains("out.color"));
        assert!(!source.contains("out.pick_color"));
        assert!(!source.contains("pack_depth"));
    }

    #[test]
    fn test_requested_outputs_are_emitted() {
        let mut requested = spec(
            RenderPass::ColorOpaque,
            GeometryKind::Triangles,
            Effect::SilhouetteFill,
        );
        requested.outputs.world_position = true;
        let source = compose(&requested).unwrap();
        assert!(source.contains("out.world_position = world_position;"));
    }

    #[test]
    fn test_pick_viewport_clip_transform() {
        let mut picking = spec(RenderPass::Pick, GeometryKind::Triangles, Effect::PickColor);
        picking.clip = PassClip::PickViewport;
        let source = compose(&picking).unwrap();
        assert!(source.contains("pass_params.pick_clip"));
    }

    #[test]
    fn test_unsupported_combinations_fail() {
        assert!(matches!(
            compose(&spec(RenderPass::Pick, GeometryKind::Edges, Effect::PickColor)),
            Err(ShaderGenError::UnsupportedGeometry(_))
        ));
        assert!(matches!(
            compose(&spec(
                RenderPass::NotRendered,
                GeometryKind::Triangles,
                Effect::FlatColor
            )),
            Err(ShaderGenError::NotRenderable)
        ));
    }
}
