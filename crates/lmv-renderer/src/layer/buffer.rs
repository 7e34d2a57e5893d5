//! Accumulation buffers for layer geometry.
//!
//! While portions are being added, everything destined for the GPU grows
//! in plain vectors here. The buffer dies at finalize, once the data
//! textures have been built from it.
//!
//! Triangle and edge indices are stored bucket-local (the shaders add the
//! object's vertex base), which keeps them within the bit width chosen
//! for the bucket's vertex count. The three bit-width families are three
//! monomorphic stores; [`IndexFamily`] is the only dispatch point.

use crate::constants::PRIMITIVES_PER_ID_ENTRY;

/// Index bit-width family of a bucket, selected once from its vertex
/// count when the bucket is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFamily {
    /// Buckets with at most 256 vertices.
    Bits8,
    /// Buckets with at most 65536 vertices.
    Bits16,
    /// Everything larger.
    Bits32,
}

impl IndexFamily {
    /// All families, in storage order.
    pub const ALL: [IndexFamily; 3] = [IndexFamily::Bits8, IndexFamily::Bits16, IndexFamily::Bits32];

    /// Family for a bucket with `vertex_count` vertices.
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= 1 << 8 {
            IndexFamily::Bits8
        } else if vertex_count <= 1 << 16 {
            IndexFamily::Bits16
        } else {
            IndexFamily::Bits32
        }
    }

    /// Storage-order index, for per-family arrays.
    pub fn slot(self) -> usize {
        match self {
            IndexFamily::Bits8 => 0,
            IndexFamily::Bits16 => 1,
            IndexFamily::Bits32 => 2,
        }
    }
}

/// Integer type of one index family's storage.
pub trait IndexInt: Copy {
    /// Zero, used for padding.
    const ZERO: Self;
    /// Narrow from the loader's u32 indices. Callers guarantee the value
    /// fits the family's bit width.
    fn from_u32(value: u32) -> Self;
}

impl IndexInt for u8 {
    const ZERO: Self = 0;
    fn from_u32(value: u32) -> Self {
        value as u8
    }
}

impl IndexInt for u16 {
    const ZERO: Self = 0;
    fn from_u32(value: u32) -> Self {
        value as u16
    }
}

impl IndexInt for u32 {
    const ZERO: Self = 0;
    fn from_u32(value: u32) -> Self {
        value
    }
}

/// Index storage for one bit-width family.
#[derive(Debug, Default)]
pub struct IndexBin<T> {
    /// Triangle indices, three per triangle, padded to 8-triangle groups.
    pub indices: Vec<T>,
    /// Edge indices, two per edge, padded to 8-edge groups.
    pub edge_indices: Vec<T>,
    /// Object id per 8-triangle group.
    pub triangle_ids: Vec<u16>,
    /// Object id per 8-edge group.
    pub edge_ids: Vec<u16>,
}

impl<T: IndexInt> IndexBin<T> {
    /// Triangle texel count (one texel per triangle, padding included).
    pub fn triangle_texels(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Edge texel count (one texel per edge, padding included).
    pub fn edge_texels(&self) -> u32 {
        (self.edge_indices.len() / 2) as u32
    }

    fn push_triangles(&mut self, indices: &[u32], object_id: u16) -> u32 {
        let base = self.triangle_texels();
        let triangles = indices.len() / 3;
        let padded = pad_to_id_group(triangles);
        self.indices.reserve(padded * 3);
        self.indices.extend(indices.iter().map(|&i| T::from_u32(i)));
        self.indices
            .extend(std::iter::repeat_n(T::ZERO, (padded - triangles) * 3));
        self.triangle_ids
            .extend(std::iter::repeat_n(object_id, padded / PRIMITIVES_PER_ID_ENTRY));
        base
    }

    fn push_edges(&mut self, edge_indices: &[u32], object_id: u16) -> u32 {
        let base = self.edge_texels();
        let edges = edge_indices.len() / 2;
        let padded = pad_to_id_group(edges);
        self.edge_indices.reserve(padded * 2);
        self.edge_indices
            .extend(edge_indices.iter().map(|&i| T::from_u32(i)));
        self.edge_indices
            .extend(std::iter::repeat_n(T::ZERO, (padded - edges) * 2));
        self.edge_ids
            .extend(std::iter::repeat_n(object_id, padded / PRIMITIVES_PER_ID_ENTRY));
        base
    }
}

/// Round a primitive count up to a whole number of id-texture groups.
pub fn pad_to_id_group(primitives: usize) -> usize {
    primitives.div_ceil(PRIMITIVES_PER_ID_ENTRY) * PRIMITIVES_PER_ID_ENTRY
}

/// All accumulation state of one layer.
#[derive(Debug, Default)]
pub struct Buffer {
    /// Quantized vertex positions, three u16 per vertex.
    pub positions: Vec<u16>,
    /// 8-bit index family.
    pub bits8: IndexBin<u8>,
    /// 16-bit index family.
    pub bits16: IndexBin<u16>,
    /// 32-bit index family.
    pub bits32: IndexBin<u32>,
    /// Per-object instancing matrices, column-major mat4.
    pub instance_matrices: Vec<f32>,
    /// Per-object dequantization matrices, column-major mat4.
    pub decode_matrices: Vec<f32>,
    /// Per-object translation offsets, one xyz + pad texel per object.
    pub offsets: Vec<f32>,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total accumulated vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Accumulated index entries for one family, padding included.
    pub fn index_count(&self, family: IndexFamily) -> usize {
        match family {
            IndexFamily::Bits8 => self.bits8.indices.len(),
            IndexFamily::Bits16 => self.bits16.indices.len(),
            IndexFamily::Bits32 => self.bits32.indices.len(),
        }
    }

    /// Append bucket positions, returning the bucket's vertex base.
    pub fn push_positions(&mut self, positions: &[u16]) -> u32 {
        let base = self.vertex_count() as u32;
        self.positions.extend_from_slice(positions);
        base
    }

    /// Append one object's triangles to its family store, returning the
    /// object's first triangle texel.
    pub fn push_triangles(&mut self, family: IndexFamily, indices: &[u32], object_id: u16) -> u32 {
        match family {
            IndexFamily::Bits8 => self.bits8.push_triangles(indices, object_id),
            IndexFamily::Bits16 => self.bits16.push_triangles(indices, object_id),
            IndexFamily::Bits32 => self.bits32.push_triangles(indices, object_id),
        }
    }

    /// Append one object's edges to its family store, returning the
    /// object's first edge texel.
    pub fn push_edges(&mut self, family: IndexFamily, edge_indices: &[u32], object_id: u16) -> u32 {
        match family {
            IndexFamily::Bits8 => self.bits8.push_edges(edge_indices, object_id),
            IndexFamily::Bits16 => self.bits16.push_edges(edge_indices, object_id),
            IndexFamily::Bits32 => self.bits32.push_edges(edge_indices, object_id),
        }
    }

    /// Append one object's float attributes (matrices and offset).
    pub fn push_object_floats(&mut self, instance: &glam::Mat4, decode: &glam::Mat4) {
        self.instance_matrices
            .extend_from_slice(&instance.to_cols_array());
        self.decode_matrices
            .extend_from_slice(&decode.to_cols_array());
        self.offsets.extend_from_slice(&[0.0, 0.0, 0.0, 0.0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_selection() {
        assert_eq!(IndexFamily::for_vertex_count(1), IndexFamily::Bits8);
        assert_eq!(IndexFamily::for_vertex_count(256), IndexFamily::Bits8);
        assert_eq!(IndexFamily::for_vertex_count(257), IndexFamily::Bits16);
        assert_eq!(IndexFamily::for_vertex_count(65536), IndexFamily::Bits16);
        assert_eq!(IndexFamily::for_vertex_count(65537), IndexFamily::Bits32);
    }

    #[test]
    fn test_triangle_padding_and_zero_fill() {
        let mut buffer = Buffer::new();
        // k triangles store ceil(k/8)*8*3 index entries, zero padded.
        let indices: Vec<u32> = (0..9).flat_map(|t| [t, t + 1, t + 2]).collect();
        let base = buffer.push_triangles(IndexFamily::Bits8, &indices, 7);
        assert_eq!(base, 0);
        assert_eq!(buffer.bits8.indices.len(), 16 * 3);
        assert!(buffer.bits8.indices[27..].iter().all(|&i| i == 0));
        // One id entry per 8 triangles, padding included.
        assert_eq!(buffer.bits8.triangle_ids, vec![7, 7]);
    }

    #[test]
    fn test_sequential_buckets_stack() {
        let mut buffer = Buffer::new();
        let tri = [0u32, 1, 2];
        assert_eq!(buffer.push_triangles(IndexFamily::Bits16, &tri, 0), 0);
        assert_eq!(buffer.push_triangles(IndexFamily::Bits16, &tri, 1), 8);
        assert_eq!(buffer.bits16.triangle_ids, vec![0, 1]);
        // Families do not interleave.
        assert_eq!(buffer.push_triangles(IndexFamily::Bits32, &tri, 2), 0);
    }

    #[test]
    fn test_edge_padding() {
        let mut buffer = Buffer::new();
        let edges = [0u32, 1, 1, 2, 2, 3];
        buffer.push_edges(IndexFamily::Bits8, &edges, 3);
        assert_eq!(buffer.bits8.edge_indices.len(), 8 * 2);
        assert_eq!(buffer.bits8.edge_ids, vec![3]);
    }
}
