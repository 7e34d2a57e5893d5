//! Per-pass renderers.
//!
//! Thin consumers of the drawable abstraction: each owns the generated
//! pipelines for one family of passes and selects one render-pass
//! selector value per pipeline. All real work (addressing, pass
//! routing) lives in the generated programs and the layer's counters.

mod color;
mod depth;
mod edges;
mod occlusion;
mod pick;
mod snap;
mod silhouette;

pub use color::ColorRenderer;
pub use depth::DepthRenderer;
pub use edges::EdgesRenderer;
pub use occlusion::OcclusionRenderer;
pub use pick::PickRenderer;
pub use silhouette::SilhouetteRenderer;
pub use snap::SnapRenderer;

/// Color format of pick and occlusion targets.
pub const PICK_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Color format of snap targets (origin-relative position + view depth).
pub const SNAP_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
