//! Renderer configuration structures
//!
//! Configurable settings for the renderer that can be serialized and
//! loaded from configuration files.

use serde::{Deserialize, Serialize};

use crate::constants::DEFERRED_UPDATE_THRESHOLD;

/// Emphasis material colors (RGBA) for the silhouette and edge passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmphasisConfig {
    /// X-ray silhouette fill color.
    pub xrayed_fill_color: [f32; 4],
    /// X-ray edge color.
    pub xrayed_edge_color: [f32; 4],
    /// Highlight silhouette fill color.
    pub highlighted_fill_color: [f32; 4],
    /// Highlight edge color.
    pub highlighted_edge_color: [f32; 4],
    /// Selection silhouette fill color.
    pub selected_fill_color: [f32; 4],
    /// Selection edge color.
    pub selected_edge_color: [f32; 4],
}

impl Default for EmphasisConfig {
    fn default() -> Self {
        Self {
            xrayed_fill_color: [0.35, 0.41, 0.60, 0.4],
            xrayed_edge_color: [0.35, 0.41, 0.60, 1.0],
            highlighted_fill_color: [1.0, 1.0, 0.0, 0.5],
            highlighted_edge_color: [1.0, 1.0, 0.3, 1.0],
            selected_fill_color: [0.0, 1.0, 0.0, 0.5],
            selected_edge_color: [0.3, 1.0, 0.3, 1.0],
        }
    }
}

/// Complete renderer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RendererConfig {
    /// Single-object texture uploads tolerated per frame before a layer
    /// switches to one batched whole-texture upload at the frame
    /// boundary.
    #[serde(default)]
    pub deferred_update_threshold: u32,
    /// Emphasis materials.
    #[serde(default)]
    pub emphasis: EmphasisConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            deferred_update_threshold: DEFERRED_UPDATE_THRESHOLD,
            emphasis: EmphasisConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Create a renderer configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
