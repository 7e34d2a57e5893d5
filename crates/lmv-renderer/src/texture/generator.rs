//! Builds the data textures from accumulated buffers, once, at finalize.

use bytemuck::Pod;

use crate::constants::{
    INDICES_TEXTURE_WIDTH, OBJECT_ATTRIBUTES_TEXTURE_WIDTH, OBJECT_FLOATS_TEXTURE_WIDTH,
    POSITIONS_TEXTURE_WIDTH, PRIMITIVE_IDS_TEXTURE_WIDTH,
};

use super::DataTexture;

/// Create a texture sized for `data` and upload it. `data` is tightly
/// packed texels; the texture is padded up to whole rows.
fn texture_with_data(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    width: u32,
    data: &[u8],
) -> DataTexture {
    let bytes_per_texel = format
        .block_copy_size(None)
        .expect("data texture formats are uncompressed");
    let texels = data.len() as u32 / bytes_per_texel;
    let height = texels.div_ceil(width).max(1);
    let texture = DataTexture::new(device, label, format, width, height);
    if !data.is_empty() {
        texture.upload_all(queue, data);
    }
    texture
}

/// Vertex position texture: one RGBA16Uint texel per vertex, xyz used.
pub(super) fn build_positions_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    positions: &[u16],
) -> DataTexture {
    let mut data: Vec<u16> = Vec::with_capacity(positions.len() / 3 * 4);
    for vertex in positions.chunks_exact(3) {
        data.extend_from_slice(vertex);
        data.push(0);
    }
    texture_with_data(
        device,
        queue,
        "Vertex Position Texture",
        wgpu::TextureFormat::Rgba16Uint,
        POSITIONS_TEXTURE_WIDTH,
        bytemuck::cast_slice(&data),
    )
}

/// Triangle index texture for one bit-width family: one texel per
/// triangle, the fourth channel unused.
pub(super) fn build_triangle_index_texture<T: Pod + Default>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    indices: &[T],
) -> DataTexture {
    let mut data: Vec<T> = Vec::with_capacity(indices.len() / 3 * 4);
    for triangle in indices.chunks_exact(3) {
        data.extend_from_slice(triangle);
        data.push(T::default());
    }
    texture_with_data(
        device,
        queue,
        label,
        format,
        INDICES_TEXTURE_WIDTH,
        bytemuck::cast_slice(&data),
    )
}

/// Edge index texture for one bit-width family: one two-channel texel
/// per edge.
pub(super) fn build_edge_index_texture<T: Pod>(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    format: wgpu::TextureFormat,
    edge_indices: &[T],
) -> DataTexture {
    texture_with_data(
        device,
        queue,
        label,
        format,
        INDICES_TEXTURE_WIDTH,
        bytemuck::cast_slice(edge_indices),
    )
}

/// Primitive-to-object id texture: one R16Uint texel per group of eight
/// primitives.
pub(super) fn build_primitive_id_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    ids: &[u16],
) -> DataTexture {
    texture_with_data(
        device,
        queue,
        label,
        wgpu::TextureFormat::R16Uint,
        PRIMITIVE_IDS_TEXTURE_WIDTH,
        bytemuck::cast_slice(ids),
    )
}

/// Object attribute texture: eight RGBA8Uint texels per object, fed from
/// the object arena's mirror bytes.
pub(super) fn build_object_attributes_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    arena_bytes: &[u8],
) -> DataTexture {
    texture_with_data(
        device,
        queue,
        "Object Attribute Texture",
        wgpu::TextureFormat::Rgba8Uint,
        OBJECT_ATTRIBUTES_TEXTURE_WIDTH,
        arena_bytes,
    )
}

/// Object offset texture: one RGBA32Float texel per object, xyz used.
pub(super) fn build_object_offsets_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    offsets: &[f32],
) -> DataTexture {
    texture_with_data(
        device,
        queue,
        "Object Offset Texture",
        wgpu::TextureFormat::Rgba32Float,
        OBJECT_FLOATS_TEXTURE_WIDTH,
        bytemuck::cast_slice(offsets),
    )
}

/// Object matrix texture: four RGBA32Float texels per object, one
/// column-major mat4.
pub(super) fn build_object_matrix_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    matrices: &[f32],
) -> DataTexture {
    texture_with_data(
        device,
        queue,
        label,
        wgpu::TextureFormat::Rgba32Float,
        OBJECT_FLOATS_TEXTURE_WIDTH,
        bytemuck::cast_slice(matrices),
    )
}
