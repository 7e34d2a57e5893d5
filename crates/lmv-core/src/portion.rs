//! Portion configuration handed from loaders to the renderer.
//!
//! A portion is one renderable object. Its geometry arrives pre-quantized
//! and already split into one or more buckets, each small enough to be
//! indexed with at most 32-bit indices. Loaders that reuse geometry across
//! many objects set [`PortionConfig::geometry_id`] so the renderer can
//! deduplicate the vertex data.

use glam::Mat4;
use uuid::Uuid;

use crate::color::PackedRgba;

/// One bucket of quantized geometry.
#[derive(Debug, Clone)]
pub struct BucketSource {
    /// Quantized vertex positions, three u16 coordinates per vertex.
    pub positions: Vec<u16>,
    /// Triangle indices into `positions` (three per triangle).
    pub indices: Vec<u32>,
    /// Display edge indices into `positions` (two per edge). May be empty;
    /// see [`crate::mesh::build_edge_indices`] to derive them.
    pub edge_indices: Vec<u32>,
}

impl BucketSource {
    /// Number of vertices in this bucket.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles in this bucket.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of display edges in this bucket.
    pub fn edge_count(&self) -> usize {
        self.edge_indices.len() / 2
    }
}

/// Configuration for one renderable object.
#[derive(Debug, Clone)]
pub struct PortionConfig {
    /// Geometry buckets. At least one.
    pub buckets: Vec<BucketSource>,
    /// Shared geometry id. When set, buckets are looked up in the layer's
    /// geometry cache instead of being uploaded again, so instanced objects
    /// share vertex data.
    pub geometry_id: Option<Uuid>,
    /// Dequantization matrix mapping u16 coordinates back to model space.
    pub positions_decode_matrix: Mat4,
    /// Optional instancing transform applied after dequantization.
    pub matrix: Option<Mat4>,
    /// Quantized material color; alpha is the opacity.
    pub color: PackedRgba,
    /// Pick color, unique per object within a scene.
    pub pick_color: PackedRgba,
    /// True when the object is watertight. Drives backface handling in
    /// pick and snap shading.
    pub solid: bool,
}

impl PortionConfig {
    /// Total vertex count across all buckets.
    pub fn vertex_count(&self) -> usize {
        self.buckets.iter().map(BucketSource::vertex_count).sum()
    }

    /// Total triangle-index count across all buckets.
    pub fn index_count(&self) -> usize {
        self.buckets.iter().map(|b| b.indices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(vertices: usize, triangles: usize) -> BucketSource {
        BucketSource {
            positions: vec![0; vertices * 3],
            indices: vec![0; triangles * 3],
            edge_indices: Vec::new(),
        }
    }

    #[test]
    fn test_counts() {
        let cfg = PortionConfig {
            buckets: vec![bucket(4, 2), bucket(3, 1)],
            geometry_id: None,
            positions_decode_matrix: Mat4::IDENTITY,
            matrix: None,
            color: PackedRgba::WHITE,
            pick_color: PackedRgba::WHITE,
            solid: true,
        };
        assert_eq!(cfg.vertex_count(), 7);
        assert_eq!(cfg.index_count(), 9);
    }
}
