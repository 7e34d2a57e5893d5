//! Scene-space geometry helpers (bounds, frustum culling)

mod bounds;

pub use bounds::{BoundingBox, Frustum, Plane};
