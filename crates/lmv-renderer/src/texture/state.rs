//! Texture set and bind groups for one finalized layer.

use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use crate::context::FrameUniforms;
use crate::drawable::GeometryKind;
use crate::layer::buffer::{Buffer, IndexFamily};

use super::{DataTexture, generator};

/// Bind group layouts shared by every generated pipeline and every
/// layer's bind groups. Group 0 is the per-layer frame uniform, group 1
/// the layer's data textures, group 2 the per-pass uniform owned by each
/// sub-renderer.
#[derive(Debug)]
pub struct SharedLayouts {
    /// Frame uniform layout (group 0).
    pub frame: wgpu::BindGroupLayout,
    /// Data texture layout (group 1).
    pub textures: wgpu::BindGroupLayout,
    /// Pass uniform layout (group 2).
    pub pass: wgpu::BindGroupLayout,
}

impl SharedLayouts {
    /// Create the shared layouts.
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let texture_entry = |binding, sample_type| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let uint = wgpu::TextureSampleType::Uint;
        let float = wgpu::TextureSampleType::Float { filterable: false };

        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Data Texture Bind Group Layout"),
            entries: &[
                texture_entry(0, uint),  // object attributes
                texture_entry(1, float), // object offsets
                texture_entry(2, float), // object instance matrices
                texture_entry(3, float), // object decode matrices
                texture_entry(4, uint),  // vertex positions
                texture_entry(5, uint),  // primitive indices
                texture_entry(6, uint),  // primitive object ids
            ],
        });
        let pass = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pass Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        Self {
            frame,
            textures,
            pass,
        }
    }
}

/// All GPU state of one finalized layer: the data textures, one bind
/// group per bit-width family and geometry kind, and the layer's frame
/// uniform.
#[derive(Debug)]
pub struct DataTextureState {
    attributes: DataTexture,
    offsets: DataTexture,
    instance_matrices: DataTexture,
    #[allow(dead_code)] // Held for GPU resource lifetime
    immutable: Vec<DataTexture>,
    triangle_groups: [wgpu::BindGroup; 3],
    edge_groups: [wgpu::BindGroup; 3],
    frame_buffer: wgpu::Buffer,
    frame_group: wgpu::BindGroup,
}

impl DataTextureState {
    /// Build every texture from the accumulation buffer and the object
    /// arena mirror, then the per-family bind groups.
    pub fn build(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: &Buffer,
        arena_bytes: &[u8],
        layouts: &SharedLayouts,
    ) -> Self {
        let attributes = generator::build_object_attributes_texture(device, queue, arena_bytes);
        let offsets = generator::build_object_offsets_texture(device, queue, &buffer.offsets);
        let instance_matrices = generator::build_object_matrix_texture(
            device,
            queue,
            "Object Instance Matrix Texture",
            &buffer.instance_matrices,
        );
        let decode_matrices = generator::build_object_matrix_texture(
            device,
            queue,
            "Object Decode Matrix Texture",
            &buffer.decode_matrices,
        );
        let positions = generator::build_positions_texture(device, queue, &buffer.positions);

        let tri_indices = [
            generator::build_triangle_index_texture(
                device,
                queue,
                "Triangle Index Texture 8",
                wgpu::TextureFormat::Rgba8Uint,
                &buffer.bits8.indices,
            ),
            generator::build_triangle_index_texture(
                device,
                queue,
                "Triangle Index Texture 16",
                wgpu::TextureFormat::Rgba16Uint,
                &buffer.bits16.indices,
            ),
            generator::build_triangle_index_texture(
                device,
                queue,
                "Triangle Index Texture 32",
                wgpu::TextureFormat::Rgba32Uint,
                &buffer.bits32.indices,
            ),
        ];
        let edge_indices = [
            generator::build_edge_index_texture(
                device,
                queue,
                "Edge Index Texture 8",
                wgpu::TextureFormat::Rg8Uint,
                &buffer.bits8.edge_indices,
            ),
            generator::build_edge_index_texture(
                device,
                queue,
                "Edge Index Texture 16",
                wgpu::TextureFormat::Rg16Uint,
                &buffer.bits16.edge_indices,
            ),
            generator::build_edge_index_texture(
                device,
                queue,
                "Edge Index Texture 32",
                wgpu::TextureFormat::Rg32Uint,
                &buffer.bits32.edge_indices,
            ),
        ];
        let tri_ids = [
            generator::build_primitive_id_texture(
                device,
                queue,
                "Triangle Object Id Texture 8",
                &buffer.bits8.triangle_ids,
            ),
            generator::build_primitive_id_texture(
                device,
                queue,
                "Triangle Object Id Texture 16",
                &buffer.bits16.triangle_ids,
            ),
            generator::build_primitive_id_texture(
                device,
                queue,
                "Triangle Object Id Texture 32",
                &buffer.bits32.triangle_ids,
            ),
        ];
        let edge_ids = [
            generator::build_primitive_id_texture(
                device,
                queue,
                "Edge Object Id Texture 8",
                &buffer.bits8.edge_ids,
            ),
            generator::build_primitive_id_texture(
                device,
                queue,
                "Edge Object Id Texture 16",
                &buffer.bits16.edge_ids,
            ),
            generator::build_primitive_id_texture(
                device,
                queue,
                "Edge Object Id Texture 32",
                &buffer.bits32.edge_ids,
            ),
        ];

        let make_group = |label: &str, indices: &DataTexture, ids: &DataTexture| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &layouts.textures,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(attributes.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(offsets.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(instance_matrices.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(decode_matrices.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(positions.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(indices.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 6,
                        resource: wgpu::BindingResource::TextureView(ids.view()),
                    },
                ],
            })
        };

        let triangle_groups = [
            make_group("Triangle Bind Group 8", &tri_indices[0], &tri_ids[0]),
            make_group("Triangle Bind Group 16", &tri_indices[1], &tri_ids[1]),
            make_group("Triangle Bind Group 32", &tri_indices[2], &tri_ids[2]),
        ];
        let edge_groups = [
            make_group("Edge Bind Group 8", &edge_indices[0], &edge_ids[0]),
            make_group("Edge Bind Group 16", &edge_indices[1], &edge_ids[1]),
            make_group("Edge Bind Group 32", &edge_indices[2], &edge_ids[2]),
        ];

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Layer Frame Buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Layer Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let mut immutable = vec![decode_matrices, positions];
        immutable.extend(tri_indices);
        immutable.extend(edge_indices);
        immutable.extend(tri_ids);
        immutable.extend(edge_ids);

        Self {
            attributes,
            offsets,
            instance_matrices,
            immutable,
            triangle_groups,
            edge_groups,
            frame_buffer,
            frame_group,
        }
    }

    /// Mutable object attribute texture.
    pub fn attributes(&self) -> &DataTexture {
        &self.attributes
    }

    /// Mutable object offset texture.
    pub fn offsets(&self) -> &DataTexture {
        &self.offsets
    }

    /// Mutable object instance matrix texture.
    pub fn instance_matrices(&self) -> &DataTexture {
        &self.instance_matrices
    }

    /// Update the layer's frame uniform.
    pub fn write_frame(&self, queue: &wgpu::Queue, uniforms: &FrameUniforms) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Bind groups 0 and 1 for one family of one geometry kind.
    pub fn bind<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        kind: GeometryKind,
        family: IndexFamily,
    ) {
        let group = match kind {
            GeometryKind::Triangles => &self.triangle_groups[family.slot()],
            GeometryKind::Edges => &self.edge_groups[family.slot()],
        };
        rpass.set_bind_group(0, &self.frame_group, &[]);
        rpass.set_bind_group(1, group, &[]);
    }
}
