//! LMV Renderer
//!
//! WGPU-based data-texture rendering for large triangle models.
//!
//! # Architecture
//!
//! Thousands of objects live in one [`layer::Layer`], which packs their
//! geometry, transforms, colors and render state into a small set of 2D
//! data textures. Shaders pull everything by `vertex_index` arithmetic;
//! there are no vertex buffers. Per-object state changes rewrite texture
//! sub-regions, and one generated pipeline exists per render pass
//! (color, silhouette, edges, pick, snap, occlusion, depth).
//!
//! # Module Structure
//!
//! ```text
//! lmv-renderer/
//! ├── layer/           # The central store: portions, flags, counters, mutators
//! ├── texture/         # Data textures, generator, bind group state
//! ├── drawable/        # Declarative shader generation, one pipeline per pass
//! ├── sub_renderers/   # Thin per-pass renderers (color, pick, snap, ...)
//! ├── renderer/        # Orchestration and the per-frame flush hook
//! ├── scene/           # Bounds and frustum helpers
//! ├── context.rs       # Per-frame camera inputs
//! ├── config.rs        # Serializable settings
//! └── constants.rs     # Texture layout constants
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod drawable;
pub mod error;
pub mod layer;
pub mod renderer;
pub mod scene;
pub mod sub_renderers;
pub mod texture;

// Re-exports for convenience
pub use config::{EmphasisConfig, RendererConfig};
pub use context::FrameContext;
pub use error::LayerError;
pub use layer::{
    IndexFamily, Layer, LayerCounts, ObjectFlags, PortionId, RenderPass, derive_passes,
};
pub use renderer::{LayerId, Renderer};
pub use scene::{BoundingBox, Frustum};
pub use texture::SharedLayouts;
