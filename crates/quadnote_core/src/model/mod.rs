//! Multi-resolution grid data model.
//!
//! # Responsibility
//! - Define colors, payloads, layers and the per-context matrix.
//! - Keep cell addressing and bounds checks in one place.
//!
//! # Invariants
//! - Every cell is addressed by `(depth, linear index)`.
//! - Layers are independent raster snapshots; depths are not linked.

pub mod color;
pub mod layer;
pub mod matrix;
pub mod payload;
