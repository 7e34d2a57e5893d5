//! Quantized RGBA colors

use serde::{Deserialize, Serialize};

/// An RGBA color quantized to one byte per channel.
///
/// This is the wire form colors take all the way into the GPU object
/// record, so loaders quantize once and everything downstream copies
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedRgba(pub [u8; 4]);

impl PackedRgba {
    /// Opaque white.
    pub const WHITE: Self = Self([255, 255, 255, 255]);

    /// Quantize a float color with components in `[0, 1]`.
    pub fn from_f32(color: [f32; 4]) -> Self {
        Self(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
    }

    /// Expand back to float components in `[0, 1]`.
    pub fn to_f32(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }

    /// Alpha channel byte.
    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    /// True when the alpha channel is below fully opaque.
    pub fn is_transparent(self) -> bool {
        self.0[3] < 255
    }
}

impl Default for PackedRgba {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_COLOR)
    }
}

impl From<[u8; 4]> for PackedRgba {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_clamps() {
        let c = PackedRgba::from_f32([1.5, -0.2, 0.5, 1.0]);
        assert_eq!(c.0, [255, 0, 128, 255]);
    }

    #[test]
    fn test_transparency() {
        assert!(!PackedRgba([0, 0, 0, 255]).is_transparent());
        assert!(PackedRgba([0, 0, 0, 254]).is_transparent());
    }
}
