//! Quantized mesh processing (quantization, welding, edge derivation)

mod edges;
mod quantize;
mod uniquify;

pub use edges::build_edge_indices;
pub use quantize::quantize_positions;
pub use uniquify::{PositionDeduper, UniquifiedGeometry};
