//! Bounding box and frustum for culling.

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a bounding box from min and max points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) bounding box.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Return this box grown to include `point`.
    pub fn expanded(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Return the union of two boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// True when min does not exceed max on any axis.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// A plane in 3D space (`normal . p + distance = 0`).
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Plane normal.
    pub normal: Vec3,
    /// Distance from the origin along the normal.
    pub distance: f32,
}

impl Plane {
    /// Signed distance from `point` to the plane.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// View frustum for box culling.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

impl Frustum {
    /// Extract the six frustum planes from a view-projection matrix
    /// (Gribb/Hartmann).
    pub fn from_view_proj(view_proj: Mat4) -> Self {
        let m = view_proj.to_cols_array_2d();
        let plane = |a: usize, sign: f32| {
            let normal = Vec3::new(
                m[0][3] + sign * m[0][a],
                m[1][3] + sign * m[1][a],
                m[2][3] + sign * m[2][a],
            );
            let length = normal.length().max(f32::MIN_POSITIVE);
            Plane {
                normal: normal / length,
                distance: (m[3][3] + sign * m[3][a]) / length,
            }
        };
        Self {
            planes: [
                plane(0, 1.0),  // left
                plane(0, -1.0), // right
                plane(1, 1.0),  // bottom
                plane(1, -1.0), // top
                plane(2, 1.0),  // near
                plane(2, -1.0), // far
            ],
        }
    }

    /// True when `bbox` at least partially intersects the frustum.
    pub fn intersects_box(&self, bbox: &BoundingBox) -> bool {
        for plane in &self.planes {
            // The box corner farthest along the plane normal.
            let p = Vec3::new(
                if plane.normal.x >= 0.0 { bbox.max.x } else { bbox.min.x },
                if plane.normal.y >= 0.0 { bbox.max.y } else { bbox.min.y },
                if plane.normal.z >= 0.0 { bbox.max.z } else { bbox.min.z },
            );
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_and_union() {
        let b = BoundingBox::empty()
            .expanded(Vec3::new(-1.0, 0.0, 2.0))
            .expanded(Vec3::new(1.0, -3.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, -3.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 0.0, 2.0));
        let u = b.union(&BoundingBox::new(Vec3::ZERO, Vec3::splat(5.0)));
        assert_eq!(u.max, Vec3::splat(5.0));
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(!BoundingBox::empty().is_valid());
        assert!(BoundingBox::new(Vec3::ZERO, Vec3::ONE).is_valid());
    }

    #[test]
    fn test_frustum_culls_box_behind_camera() {
        // Looking down -Z from the origin.
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 100.0);
        let frustum = Frustum::from_view_proj(proj * view);

        let in_front = BoundingBox::new(Vec3::new(-1.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(frustum.intersects_box(&in_front));

        let behind = BoundingBox::new(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert!(!frustum.intersects_box(&behind));
    }
}
