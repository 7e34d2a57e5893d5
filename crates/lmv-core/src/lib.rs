//! Core domain model for the LMV large-model viewer.
//!
//! GPU-independent building blocks consumed by `lmv-renderer`:
//!
//! - [`portion`]: portion/bucket configuration handed over by loaders
//! - [`color`]: quantized RGBA colors
//! - [`mesh`]: position quantization, vertex welding, edge derivation
//! - [`constants`]: shared defaults

pub mod color;
pub mod constants;
pub mod mesh;
pub mod portion;

pub use color::PackedRgba;
pub use mesh::{PositionDeduper, UniquifiedGeometry, build_edge_indices, quantize_positions};
pub use portion::{BucketSource, PortionConfig};
