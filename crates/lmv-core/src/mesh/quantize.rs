//! Position quantization

use glam::{Mat4, Vec3};

use crate::constants::QUANTIZATION_RANGE;

/// Quantize float positions to u16 coordinates.
///
/// Returns the quantized coordinates and the decode matrix that maps them
/// back into model space. The matrix is what travels to the GPU; shaders
/// never see float positions.
pub fn quantize_positions(positions: &[f32]) -> (Vec<u16>, Mat4) {
    if positions.is_empty() {
        return (Vec::new(), Mat4::IDENTITY);
    }

    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);
    for p in positions.chunks_exact(3) {
        let v = Vec3::new(p[0], p[1], p[2]);
        min = min.min(v);
        max = max.max(v);
    }

    let extent = max - min;
    let multiplier = Vec3::new(
        if extent.x > 0.0 { QUANTIZATION_RANGE / extent.x } else { 0.0 },
        if extent.y > 0.0 { QUANTIZATION_RANGE / extent.y } else { 0.0 },
        if extent.z > 0.0 { QUANTIZATION_RANGE / extent.z } else { 0.0 },
    );

    let mut quantized = Vec::with_capacity(positions.len());
    for p in positions.chunks_exact(3) {
        let v = (Vec3::new(p[0], p[1], p[2]) - min) * multiplier;
        quantized.push(v.x.round().clamp(0.0, QUANTIZATION_RANGE) as u16);
        quantized.push(v.y.round().clamp(0.0, QUANTIZATION_RANGE) as u16);
        quantized.push(v.z.round().clamp(0.0, QUANTIZATION_RANGE) as u16);
    }

    let decode = Mat4::from_translation(min) * Mat4::from_scale(extent / QUANTIZATION_RANGE);
    (quantized, decode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_round_trip() {
        let positions = [0.0, -1.0, 2.0, 10.0, 1.0, 4.0, 5.0, 0.0, 3.0];
        let (quantized, decode) = quantize_positions(&positions);
        for (q, p) in quantized.chunks_exact(3).zip(positions.chunks_exact(3)) {
            let decoded =
                decode.transform_point3(Vec3::new(q[0] as f32, q[1] as f32, q[2] as f32));
            assert!((decoded - Vec3::new(p[0], p[1], p[2])).length() < 1e-3);
        }
    }

    #[test]
    fn test_quantize_flat_axis() {
        // Zero extent on one axis must not divide by zero.
        let positions = [1.0, 5.0, 0.0, 2.0, 5.0, 1.0];
        let (quantized, _) = quantize_positions(&positions);
        assert_eq!(quantized[1], 0);
        assert_eq!(quantized[4], 0);
    }
}
