//! Per-frame render inputs.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, Mat4, Vec3};

/// Camera state for one frame, supplied by the embedding scene.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// World-space view matrix.
    pub view: Mat4,
    /// Projection matrix.
    pub proj: Mat4,
    /// Camera eye position, world space.
    pub eye: Vec3,
}

/// GPU form of [`FrameContext`], rebased onto one layer's origin.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Origin-relative view matrix.
    pub view: [[f32; 4]; 4],
    /// Projection matrix.
    pub proj: [[f32; 4]; 4],
    /// Camera eye position relative to the layer origin.
    pub eye: [f32; 3],
    /// Alignment padding.
    pub _pad: f32,
}

impl FrameUniforms {
    /// Rebase the frame onto `origin`, the layer's relative-to-center
    /// reference point. Vertex positions are stored origin-relative, so
    /// the translation folds into the view matrix and the large world
    /// coordinates never reach f32 precision limits on the GPU.
    pub fn for_origin(frame: &FrameContext, origin: DVec3) -> Self {
        let rtc_view = frame.view * Mat4::from_translation(origin.as_vec3());
        Self {
            view: rtc_view.to_cols_array_2d(),
            proj: frame.proj.to_cols_array_2d(),
            eye: (frame.eye.as_dvec3() - origin).as_vec3().to_array(),
            _pad: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_origin_preserves_view() {
        let frame = FrameContext {
            view: Mat4::look_at_rh(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y),
            proj: Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0),
            eye: Vec3::new(1.0, 2.0, 3.0),
        };
        let uniforms = FrameUniforms::for_origin(&frame, DVec3::ZERO);
        assert_eq!(uniforms.view, frame.view.to_cols_array_2d());
        assert_eq!(uniforms.eye, frame.eye.to_array());
    }

    #[test]
    fn test_origin_folds_into_view() {
        let frame = FrameContext {
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            eye: Vec3::new(10.0, 0.0, 0.0),
        };
        let origin = DVec3::new(10.0, 0.0, 0.0);
        let uniforms = FrameUniforms::for_origin(&frame, origin);
        // A point at the origin reference maps where the world point did.
        let rebased = Mat4::from_cols_array_2d(&uniforms.view);
        assert_eq!(rebased.transform_point3(Vec3::ZERO), Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(uniforms.eye, [0.0, 0.0, 0.0]);
    }
}
