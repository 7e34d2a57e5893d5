//! Deduplicated bucket geometry.
//!
//! One [`BucketGeometry`] exists per unique (geometry source, bucket)
//! pair in a layer. Portions that share a geometry id reference the same
//! entry, so instanced objects never duplicate vertex data. Triangle and
//! edge indices are not shared: every instance appends its own index run
//! so the primitive-to-object id textures stay unambiguous.

use glam::Vec3;
use uuid::Uuid;

use crate::layer::buffer::IndexFamily;

/// Cache key of one bucket's geometry: the portion's shared geometry id
/// (or a per-portion generated id) plus the bucket position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    /// Geometry source id.
    pub source: Uuid,
    /// Bucket index within the source.
    pub bucket: usize,
}

/// Axis-aligned bounds in quantized coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantizedAabb {
    /// Minimum corner.
    pub min: [u16; 3],
    /// Maximum corner.
    pub max: [u16; 3],
}

impl QuantizedAabb {
    /// The eight box corners, widened to f32 for matrix transforms.
    pub fn corners(&self) -> [Vec3; 8] {
        let lo = Vec3::new(self.min[0] as f32, self.min[1] as f32, self.min[2] as f32);
        let hi = Vec3::new(self.max[0] as f32, self.max[1] as f32, self.max[2] as f32);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }
}

/// One deduplicated bucket of geometry in a layer.
#[derive(Debug)]
pub struct BucketGeometry {
    /// First vertex of this bucket in the position texture.
    pub vertex_base: u32,
    /// Vertex count.
    pub num_vertices: u32,
    /// Triangle count, before padding.
    pub num_triangles: u32,
    /// Edge count, before padding.
    pub num_edges: u32,
    /// Index bit-width family, fixed at creation from the vertex count.
    pub family: IndexFamily,
    aabb: Option<QuantizedAabb>,
}

impl BucketGeometry {
    /// Record a freshly uploaded bucket. The bounds are computed lazily
    /// on first use, so instanced reuse pays for them once.
    pub fn new(vertex_base: u32, num_vertices: u32, num_triangles: u32, num_edges: u32) -> Self {
        Self {
            vertex_base,
            num_vertices,
            num_triangles,
            num_edges,
            family: IndexFamily::for_vertex_count(num_vertices as usize),
            aabb: None,
        }
    }

    /// Quantized-space bounds of this bucket, computed from the shared
    /// position buffer on first call and cached after.
    pub fn quantized_aabb(&mut self, positions: &[u16]) -> QuantizedAabb {
        if let Some(aabb) = self.aabb {
            return aabb;
        }
        let mut min = [u16::MAX; 3];
        let mut max = [u16::MIN; 3];
        let start = self.vertex_base as usize * 3;
        let end = start + self.num_vertices as usize * 3;
        for vertex in positions[start..end].chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(vertex[axis]);
                max[axis] = max[axis].max(vertex[axis]);
            }
        }
        let aabb = QuantizedAabb { min, max };
        self.aabb = Some(aabb);
        aabb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_aabb() {
        let positions = [0u16, 10, 20, 100, 5, 60, 50, 50, 50];
        let mut geometry = BucketGeometry::new(0, 3, 1, 0);
        let aabb = geometry.quantized_aabb(&positions);
        assert_eq!(aabb.min, [0, 5, 20]);
        assert_eq!(aabb.max, [100, 50, 60]);
        // Cached: a second call ignores the slice contents.
        let aabb2 = geometry.quantized_aabb(&[]);
        assert_eq!(aabb, aabb2);
    }

    #[test]
    fn test_aabb_respects_vertex_base() {
        let positions = [9, 9, 9, 1, 2, 3, 4, 5, 6];
        let mut geometry = BucketGeometry::new(1, 2, 1, 0);
        let aabb = geometry.quantized_aabb(&positions);
        assert_eq!(aabb.min, [1, 2, 3]);
        assert_eq!(aabb.max, [4, 5, 6]);
    }

    #[test]
    fn test_corners() {
        let aabb = QuantizedAabb {
            min: [0, 0, 0],
            max: [1, 2, 3],
        };
        let corners = aabb.corners();
        assert_eq!(corners[0], Vec3::ZERO);
        assert_eq!(corners[7], Vec3::new(1.0, 2.0, 3.0));
    }
}
