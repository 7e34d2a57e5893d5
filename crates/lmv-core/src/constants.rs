//! Global constants for lmv-core

/// Quantized position range (16-bit unsigned coordinates)
pub const QUANTIZATION_RANGE: f32 = 65535.0;

/// Default dihedral angle threshold (degrees) above which a shared
/// triangle edge is emitted as a display edge
pub const DEFAULT_EDGE_THRESHOLD_DEGREES: f32 = 10.0;

/// Default object color (gray, quantized RGBA)
pub const DEFAULT_COLOR: [u8; 4] = [180, 180, 180, 255];
