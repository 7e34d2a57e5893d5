//! Renderer error types

/// Errors raised by [`crate::layer::Layer`] lifecycle misuse.
///
/// Capacity pressure is deliberately not an error:
/// [`crate::layer::Layer::can_create_portion`] answers `Ok(false)` and the
/// caller is expected to open a new layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// A mutator or draw-side operation was called before `finalize`.
    #[error("layer not finalized")]
    NotFinalized,

    /// An accumulation-side operation was called after `finalize`.
    #[error("layer already finalized")]
    Finalized,

    /// A mutator addressed a portion id this layer never produced.
    #[error("unknown portion id: {0}")]
    UnknownPortion(u32),

    /// A renderer operation addressed a layer handle it never issued.
    #[error("unknown layer: {0}")]
    UnknownLayer(usize),
}
