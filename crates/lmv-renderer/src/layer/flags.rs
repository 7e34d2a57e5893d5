//! Per-object render flags and render-pass derivation.
//!
//! The four render-pass selector bytes stored in each object record are a
//! pure function of the object's flags word plus its transparency. They
//! are recomputed on every flag mutation and written to the GPU, so the
//! shaders only ever compare one byte against the pass they implement;
//! no visibility logic runs per fragment.

/// Packed per-object state flags, as maintained by the scene layer above
/// this crate and handed into every flag mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectFlags(pub u32);

impl ObjectFlags {
    /// Object is visible.
    pub const VISIBLE: u32 = 1 << 0;
    /// Object is culled (e.g. by view-frustum tests).
    pub const CULLED: u32 = 1 << 1;
    /// Object participates in picking.
    pub const PICKABLE: u32 = 1 << 2;
    /// Object is clipped by section planes.
    pub const CLIPPABLE: u32 = 1 << 3;
    /// Display edges are emphasized.
    pub const EDGES: u32 = 1 << 4;
    /// Object is x-rayed.
    pub const XRAYED: u32 = 1 << 5;
    /// Object is highlighted.
    pub const HIGHLIGHTED: u32 = 1 << 6;
    /// Object is selected.
    pub const SELECTED: u32 = 1 << 7;

    /// True when `bit` is set.
    pub fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

impl From<u32> for ObjectFlags {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

/// Render passes an object can be routed to. The discriminants are the
/// byte values stored in the object record and compared in the shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderPass {
    /// Object does not draw in the corresponding pass.
    NotRendered = 0,
    /// Opaque color pass.
    ColorOpaque = 1,
    /// Transparent color pass.
    ColorTransparent = 2,
    /// Silhouette fill for highlighted objects.
    SilhouetteHighlighted = 3,
    /// Silhouette fill for selected objects.
    SilhouetteSelected = 4,
    /// Silhouette fill for x-rayed objects.
    SilhouetteXrayed = 5,
    /// Edge lines of opaque objects.
    EdgesColorOpaque = 6,
    /// Edge lines of transparent objects.
    EdgesColorTransparent = 7,
    /// Edge lines of highlighted objects.
    EdgesHighlighted = 8,
    /// Edge lines of selected objects.
    EdgesSelected = 9,
    /// Edge lines of x-rayed objects.
    EdgesXrayed = 10,
    /// Pick pass (mesh, depth and snap variants share it).
    Pick = 11,
}

impl RenderPass {
    /// Byte value stored in the object record.
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// The four derived render-pass selector bytes of one object, in record
/// order: color, silhouette, edges, pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassBytes {
    /// Color pass selector.
    pub color: RenderPass,
    /// Silhouette pass selector.
    pub silhouette: RenderPass,
    /// Edges pass selector.
    pub edges: RenderPass,
    /// Pick pass selector.
    pub pick: RenderPass,
}

impl PassBytes {
    /// Record layout form.
    pub fn to_bytes(self) -> [u8; 4] {
        [
            self.color.byte(),
            self.silhouette.byte(),
            self.edges.byte(),
            self.pick.byte(),
        ]
    }
}

/// Derive the render-pass routing for one object.
///
/// Silhouette and edge emphasis follow a fixed priority:
/// selected over highlighted over x-rayed.
pub fn derive_passes(flags: ObjectFlags, transparent: bool) -> PassBytes {
    let visible = flags.has(ObjectFlags::VISIBLE);
    let culled = flags.has(ObjectFlags::CULLED);
    let xrayed = flags.has(ObjectFlags::XRAYED);
    let highlighted = flags.has(ObjectFlags::HIGHLIGHTED);
    let selected = flags.has(ObjectFlags::SELECTED);

    let color = if !visible || culled || xrayed {
        RenderPass::NotRendered
    } else if transparent {
        RenderPass::ColorTransparent
    } else {
        RenderPass::ColorOpaque
    };

    let silhouette = if !visible || culled {
        RenderPass::NotRendered
    } else if selected {
        RenderPass::SilhouetteSelected
    } else if highlighted {
        RenderPass::SilhouetteHighlighted
    } else if xrayed {
        RenderPass::SilhouetteXrayed
    } else {
        RenderPass::NotRendered
    };

    let edges = if !visible || culled {
        RenderPass::NotRendered
    } else if selected {
        RenderPass::EdgesSelected
    } else if highlighted {
        RenderPass::EdgesHighlighted
    } else if xrayed {
        RenderPass::EdgesXrayed
    } else if flags.has(ObjectFlags::EDGES) {
        if transparent {
            RenderPass::EdgesColorTransparent
        } else {
            RenderPass::EdgesColorOpaque
        }
    } else {
        RenderPass::NotRendered
    };

    let pick = if visible && flags.has(ObjectFlags::PICKABLE) {
        RenderPass::Pick
    } else {
        RenderPass::NotRendered
    };

    PassBytes {
        color,
        silhouette,
        edges,
        pick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(bits: u32) -> ObjectFlags {
        ObjectFlags(bits)
    }

    #[test]
    fn test_color_pass() {
        let p = derive_passes(flags(ObjectFlags::VISIBLE), false);
        assert_eq!(p.color, RenderPass::ColorOpaque);
        let p = derive_passes(flags(ObjectFlags::VISIBLE), true);
        assert_eq!(p.color, RenderPass::ColorTransparent);
        // Invisible, culled or x-rayed objects never draw color.
        assert_eq!(derive_passes(flags(0), false).color, RenderPass::NotRendered);
        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::CULLED), false);
        assert_eq!(p.color, RenderPass::NotRendered);
        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::XRAYED), false);
        assert_eq!(p.color, RenderPass::NotRendered);
    }

    #[test]
    fn test_silhouette_priority() {
        // Selected wins over highlighted and x-rayed, regardless of order.
        let all = ObjectFlags::VISIBLE
            | ObjectFlags::SELECTED
            | ObjectFlags::HIGHLIGHTED
            | ObjectFlags::XRAYED;
        let p = derive_passes(flags(all), false);
        assert_eq!(p.silhouette, RenderPass::SilhouetteSelected);

        let p = derive_passes(
            flags(ObjectFlags::VISIBLE | ObjectFlags::HIGHLIGHTED | ObjectFlags::XRAYED),
            false,
        );
        assert_eq!(p.silhouette, RenderPass::SilhouetteHighlighted);

        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::XRAYED), false);
        assert_eq!(p.silhouette, RenderPass::SilhouetteXrayed);

        let p = derive_passes(flags(ObjectFlags::VISIBLE), false);
        assert_eq!(p.silhouette, RenderPass::NotRendered);
    }

    #[test]
    fn test_edges_fall_back_to_color_edges() {
        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::EDGES), false);
        assert_eq!(p.edges, RenderPass::EdgesColorOpaque);
        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::EDGES), true);
        assert_eq!(p.edges, RenderPass::EdgesColorTransparent);
        let p = derive_passes(flags(ObjectFlags::VISIBLE), false);
        assert_eq!(p.edges, RenderPass::NotRendered);
        let p = derive_passes(
            flags(ObjectFlags::VISIBLE | ObjectFlags::EDGES | ObjectFlags::SELECTED),
            false,
        );
        assert_eq!(p.edges, RenderPass::EdgesSelected);
    }

    #[test]
    fn test_pick_pass() {
        let p = derive_passes(flags(ObjectFlags::VISIBLE | ObjectFlags::PICKABLE), false);
        assert_eq!(p.pick, RenderPass::Pick);
        let p = derive_passes(flags(ObjectFlags::PICKABLE), false);
        assert_eq!(p.pick, RenderPass::NotRendered);
    }

    #[test]
    fn test_derivation_is_pure() {
        let f = flags(ObjectFlags::VISIBLE | ObjectFlags::EDGES | ObjectFlags::PICKABLE);
        assert_eq!(derive_passes(f, true), derive_passes(f, true));
    }
}
