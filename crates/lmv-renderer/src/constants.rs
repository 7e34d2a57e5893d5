//! Data texture layout constants.
//!
//! Every shader variant and every upload path assumes these values; they
//! are compiled into the generated WGSL and must match the textures built
//! at finalize time.

/// Width in texels of the vertex position texture (one vertex per texel).
pub const POSITIONS_TEXTURE_WIDTH: u32 = 4096;

/// Width in texels of the triangle and edge index textures
/// (one primitive per texel).
pub const INDICES_TEXTURE_WIDTH: u32 = 4096;

/// Width in texels of the primitive-to-object id textures.
pub const PRIMITIVE_IDS_TEXTURE_WIDTH: u32 = 4096;

/// Width in texels of the per-object attribute texture.
pub const OBJECT_ATTRIBUTES_TEXTURE_WIDTH: u32 = 512;

/// Width in texels of the per-object float textures (offsets, matrices).
pub const OBJECT_FLOATS_TEXTURE_WIDTH: u32 = 512;

/// Texels per object in the attribute texture (32 bytes per object).
pub const OBJECT_ATTRIBUTE_TEXELS: u32 = 8;

/// Texels per object in the matrix textures (one mat4 per object).
pub const OBJECT_MATRIX_TEXELS: u32 = 4;

/// One object id entry in the id textures covers this many primitives.
/// Index arrays are padded to a multiple of this so the entry boundary
/// never crosses an object.
pub const PRIMITIVES_PER_ID_ENTRY: usize = 8;

/// Vertex budget per layer: the position texture holds at most
/// 4096 x 4096 texels.
pub const MAX_VERTICES_PER_LAYER: usize = 4096 * 4096;

/// Index-entry budget per layer, per bit-width family.
pub const MAX_INDICES_PER_LAYER: usize = 4096 * 4096;

/// Object budget per layer: object ids are 16-bit in the id textures.
pub const MAX_OBJECTS_PER_LAYER: usize = 65536;

/// Single-object texture uploads tolerated per frame before a layer
/// escalates to one whole-texture upload at the frame boundary. Roughly
/// where per-call driver overhead starts to cost more than the bulk
/// transfer; tunable through
/// [`crate::config::RendererConfig::deferred_update_threshold`].
pub const DEFERRED_UPDATE_THRESHOLD: u32 = 10;
