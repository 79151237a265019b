//! One depth of the multi-resolution grid.

use crate::model::color::EMPTY;
use serde::{Deserialize, Serialize};

/// Row-major color grid for one depth.
///
/// `size` is the edge length in cells (`2^depth`); `nodes` holds
/// `size * size` packed colors where `nodes[y * size + x]` is cell `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub size: u32,
    pub nodes: Vec<u32>,
}

impl Layer {
    /// Creates the empty layer for `depth`.
    pub fn empty_for_depth(depth: u32) -> Self {
        let size = 1u32 << depth;
        Self {
            size,
            nodes: vec![EMPTY; (size as usize) * (size as usize)],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Maps a linear index to `(x, y)` grid coordinates.
    pub fn coords(&self, index: usize) -> (u32, u32) {
        let size = self.size as usize;
        ((index % size) as u32, (index / size) as u32)
    }

    /// Maps `(x, y)` grid coordinates to a linear index.
    pub fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.size as usize) + (x as usize)
    }

    /// Number of non-empty cells.
    pub fn painted_count(&self) -> usize {
        self.nodes.iter().filter(|node| **node != EMPTY).count()
    }

    /// Returns whether `size` and `nodes` agree with the shape of `depth`.
    pub fn has_shape_of_depth(&self, depth: u32) -> bool {
        let expected = 1u32 << depth;
        self.size == expected && self.nodes.len() == (expected as usize) * (expected as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::Layer;

    #[test]
    fn empty_layer_has_square_shape() {
        let layer = Layer::empty_for_depth(3);
        assert_eq!(layer.size, 8);
        assert_eq!(layer.len(), 64);
        assert!(layer.nodes.iter().all(|node| *node == 0));
        assert!(layer.has_shape_of_depth(3));
        assert!(!layer.has_shape_of_depth(2));
    }

    #[test]
    fn coords_are_row_major() {
        let layer = Layer::empty_for_depth(2);
        assert_eq!(layer.coords(5), (1, 1));
        assert_eq!(layer.coords(7), (3, 1));
        assert_eq!(layer.index_of(3, 1), 7);
    }
}
