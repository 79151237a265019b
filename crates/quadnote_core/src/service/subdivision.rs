//! Subdivision and reset operations on one matrix.
//!
//! # Responsibility
//! - Copy a cell's color and payload into its four children one depth down.
//! - Clear a single cell at a single depth.
//!
//! # Invariants
//! - Failed operations leave the matrix unchanged.
//! - Subdivision never modifies the parent and never recurses past one level.
//! - Children are overwritten unconditionally; a missing parent payload
//!   leaves existing child payloads untouched.
//! - Copied payloads are independent values per child.
//!
//! Depths are not kept coherent: editing a parent after subdividing does not
//! reach its children, and resetting a cell does not touch other depths.

use crate::model::color::EMPTY;
use crate::model::matrix::{CellKey, Matrix, MatrixError, MatrixResult};
use crate::model::payload::Payload;
use log::debug;

/// Returns the four child keys of `(depth, index)` in row-major order:
/// top-left, top-right, bottom-left, bottom-right.
///
/// # Errors
/// - `DepthExceeded` when `depth >= max_depth`.
/// - `IndexOutOfRange` when `index` is outside the parent layer.
pub fn child_keys(matrix: &Matrix, depth: u32, index: usize) -> MatrixResult<[CellKey; 4]> {
    if depth >= matrix.max_depth() {
        return Err(MatrixError::DepthExceeded {
            depth,
            max_depth: matrix.max_depth(),
        });
    }
    let parent = matrix.cell_key(depth, index)?;
    let (px, py) = matrix.layer(parent.depth)?.coords(parent.index);
    let child_layer = matrix.layer(depth + 1)?;
    let (bx, by) = (px * 2, py * 2);

    Ok([
        CellKey::new(depth + 1, child_layer.index_of(bx, by)),
        CellKey::new(depth + 1, child_layer.index_of(bx + 1, by)),
        CellKey::new(depth + 1, child_layer.index_of(bx, by + 1)),
        CellKey::new(depth + 1, child_layer.index_of(bx + 1, by + 1)),
    ])
}

/// Copies the state of `(depth, index)` into its four children.
///
/// Returns the child keys that were written.
pub fn subdivide(matrix: &mut Matrix, depth: u32, index: usize) -> MatrixResult<[CellKey; 4]> {
    let children = child_keys(matrix, depth, index)?;
    let color = matrix.color(depth, index)?;
    let payload: Option<Payload> = matrix.payload(depth, index)?.cloned();
    let max_depth = matrix.max_depth();

    let child_layer = matrix
        .layer_mut(depth + 1)
        .ok_or(MatrixError::DepthOutOfRange {
            depth: depth + 1,
            max_depth,
        })?;
    for child in &children {
        child_layer.nodes[child.index] = color;
    }

    if let Some(payload) = &payload {
        let pool = matrix.payload_pool_mut();
        for child in children {
            pool.insert(child, payload.clone());
        }
    }

    debug!(
        "event=cell_subdivide module=service status=ok cell={} color={:06x} payload={}",
        CellKey::new(depth, index),
        color,
        payload
            .as_ref()
            .map(|payload| payload.kind().as_str())
            .unwrap_or("none")
    );
    Ok(children)
}

/// Clears one cell's color and detaches its payload.
///
/// Returns the removed payload, if there was one.
pub fn reset_cell(matrix: &mut Matrix, depth: u32, index: usize) -> MatrixResult<Option<Payload>> {
    matrix.set_color(depth, index, EMPTY)?;
    let removed = matrix.remove_payload(depth, index)?;
    debug!(
        "event=cell_reset module=service status=ok cell={} had_payload={}",
        CellKey::new(depth, index),
        removed.is_some()
    );
    Ok(removed)
}
