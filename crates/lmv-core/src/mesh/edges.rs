//! Display edge derivation.
//!
//! Builds the edge index list a loader would otherwise supply: one line
//! segment per triangle edge that is either a surface boundary or sits on
//! a crease sharper than the dihedral threshold. Coplanar interior edges
//! (triangulation diagonals) produce no lines.

use std::collections::HashMap;

use glam::Vec3;

use crate::mesh::uniquify::PositionDeduper;

#[derive(Clone, Copy)]
struct EdgeFaces {
    /// Representative original indices for the two endpoints.
    endpoints: [u32; 2],
    first_face: u32,
    second_face: Option<u32>,
}

/// Derive display edge indices from quantized triangle geometry.
///
/// `threshold_degrees` is the dihedral angle above which a shared edge is
/// kept. Returned indices refer to the original `positions` array.
pub fn build_edge_indices(positions: &[u16], indices: &[u32], threshold_degrees: f32) -> Vec<u32> {
    if indices.len() < 3 {
        return Vec::new();
    }

    // Weld duplicates first so seams between co-located vertices do not
    // read as boundaries.
    let mut deduper = PositionDeduper::new();
    let welded = deduper.uniquify(positions, indices, &[]);
    let remap = deduper.remap();

    // Representative original index per welded vertex (smallest original).
    let mut representative = vec![u32::MAX; welded.positions.len() / 3];
    for (original, &unique_id) in remap.iter().enumerate() {
        let slot = &mut representative[unique_id as usize];
        *slot = (*slot).min(original as u32);
    }

    let face_normal = |face: usize| {
        let corner = |c: usize| {
            let o = welded.indices[face * 3 + c] as usize * 3;
            Vec3::new(
                welded.positions[o] as f32,
                welded.positions[o + 1] as f32,
                welded.positions[o + 2] as f32,
            )
        };
        let (a, b, c) = (corner(0), corner(1), corner(2));
        (b - a).cross(c - a).normalize_or_zero()
    };

    let num_faces = welded.indices.len() / 3;
    let mut edges: HashMap<(u32, u32), EdgeFaces> = HashMap::with_capacity(num_faces * 2);
    for face in 0..num_faces {
        for corner in 0..3 {
            let a = welded.indices[face * 3 + corner];
            let b = welded.indices[face * 3 + (corner + 1) % 3];
            if a == b {
                continue;
            }
            let key = (a.min(b), a.max(b));
            edges
                .entry(key)
                .and_modify(|e| {
                    if e.second_face.is_none() {
                        e.second_face = Some(face as u32);
                    }
                })
                .or_insert(EdgeFaces {
                    endpoints: [representative[a as usize], representative[b as usize]],
                    first_face: face as u32,
                    second_face: None,
                });
        }
    }

    let threshold_cos = threshold_degrees.to_radians().cos();
    let mut edge_indices = Vec::new();
    for edge in edges.values() {
        let keep = match edge.second_face {
            // Boundary edge: always a silhouette candidate.
            None => true,
            Some(second) => {
                let dot = face_normal(edge.first_face as usize).dot(face_normal(second as usize));
                dot < threshold_cos
            }
        };
        if keep {
            edge_indices.push(edge.endpoints[0]);
            edge_indices.push(edge.endpoints[1]);
        }
    }
    edge_indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_quad_keeps_boundary_only() {
        // Two coplanar triangles: the diagonal disappears, the four outer
        // edges stay.
        let positions = [0, 0, 0, 1000, 0, 0, 1000, 1000, 0, 0, 1000, 0];
        let indices = [0, 1, 2, 0, 2, 3];
        let edges = build_edge_indices(&positions, &indices, 10.0);
        assert_eq!(edges.len(), 8);
    }

    #[test]
    fn test_cube_keeps_creases() {
        let positions = [
            0, 0, 0, 1000, 0, 0, 1000, 1000, 0, 0, 1000, 0, //
            0, 0, 1000, 1000, 0, 1000, 1000, 1000, 1000, 0, 1000, 1000,
        ];
        let indices = [
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        let edges = build_edge_indices(&positions, &indices, 10.0);
        // Twelve 90-degree cube edges kept, six face diagonals dropped.
        assert_eq!(edges.len(), 24);
    }

    #[test]
    fn test_welded_seam_is_not_a_boundary() {
        // Same quad as above, but the second triangle duplicates its
        // shared vertices instead of reusing indices.
        let positions = [
            0, 0, 0, 1000, 0, 0, 1000, 1000, 0, // triangle A
            0, 0, 0, 1000, 1000, 0, 0, 1000, 0, // triangle B duplicates two
        ];
        let indices = [0, 1, 2, 3, 4, 5];
        let edges = build_edge_indices(&positions, &indices, 10.0);
        assert_eq!(edges.len(), 8);
    }
}
