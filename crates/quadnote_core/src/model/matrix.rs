//! Multi-resolution matrix model.
//!
//! # Responsibility
//! - Own the per-depth layers and the payload pool of one context.
//! - Bounds-check every cell address before reads and writes.
//!
//! # Invariants
//! - `layers.len() == max_depth + 1`.
//! - `layers[d].size == 2^d` and `layers[d].nodes.len() == 4^d`.
//! - Payload keys are independent per `(depth, index)`; no parent/child
//!   links are maintained and nothing is cleaned up implicitly.

use crate::config::{CURRENT_FORMAT_VERSION, MAX_SUPPORTED_DEPTH};
use crate::model::layer::Layer;
use crate::model::payload::Payload;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static CELL_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d+)$").expect("valid cell key regex"));

pub type MatrixResult<T> = Result<T, MatrixError>;

/// Cell addressing and matrix construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// `index` is outside the layer at `depth`.
    IndexOutOfRange {
        depth: u32,
        index: usize,
        len: usize,
    },
    /// `depth` names a layer the matrix does not have.
    DepthOutOfRange { depth: u32, max_depth: u32 },
    /// Subdivision requested at the deepest layer.
    DepthExceeded { depth: u32, max_depth: u32 },
    /// `max_depth` is above `MAX_SUPPORTED_DEPTH`.
    UnsupportedDepth { max_depth: u32, limit: u32 },
    /// Quadtree pixel size must be positive.
    InvalidQuadtreeSize(u32),
    /// Layer count disagrees with `max_depth + 1`.
    LayerCountMismatch { expected: usize, actual: usize },
    /// Layer at `depth` does not have the `2^depth` square shape.
    InvalidLayerShape { depth: u32, size: u32, len: usize },
    /// Cell key text is not `<depth>:<index>`.
    InvalidCellKey(String),
}

impl Display for MatrixError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { depth, index, len } => write!(
                f,
                "cell index {index} out of range for depth {depth} ({len} cells)"
            ),
            Self::DepthOutOfRange { depth, max_depth } => {
                write!(f, "depth {depth} out of range (max depth {max_depth})")
            }
            Self::DepthExceeded { depth, max_depth } => write!(
                f,
                "cannot subdivide at depth {depth}: max depth is {max_depth}"
            ),
            Self::UnsupportedDepth { max_depth, limit } => {
                write!(f, "max depth {max_depth} exceeds supported limit {limit}")
            }
            Self::InvalidQuadtreeSize(size) => {
                write!(f, "quadtree size must be positive, got {size}")
            }
            Self::LayerCountMismatch { expected, actual } => {
                write!(f, "expected {expected} layers, found {actual}")
            }
            Self::InvalidLayerShape { depth, size, len } => write!(
                f,
                "layer {depth} has size {size} with {len} nodes; expected size {} with {} nodes",
                1u64 << depth,
                1u64 << (2 * depth)
            ),
            Self::InvalidCellKey(value) => write!(f, "invalid cell key `{value}`"),
        }
    }
}

impl Error for MatrixError {}

/// Address of one cell: depth plus linear index within that depth's layer.
///
/// Rendered as `"<depth>:<index>"`, which is also the payload pool key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub depth: u32,
    pub index: usize,
}

impl CellKey {
    pub fn new(depth: u32, index: usize) -> Self {
        Self { depth, index }
    }
}

impl Display for CellKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.depth, self.index)
    }
}

impl FromStr for CellKey {
    type Err = MatrixError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || MatrixError::InvalidCellKey(value.to_string());
        let captures = CELL_KEY_RE.captures(value).ok_or_else(invalid)?;
        let depth = captures[1].parse::<u32>().map_err(|_| invalid())?;
        let index = captures[2].parse::<usize>().map_err(|_| invalid())?;
        Ok(Self { depth, index })
    }
}

/// Full multi-resolution grid of one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    quadtree_size: u32,
    max_depth: u32,
    layers: Vec<Layer>,
    payload_pool: BTreeMap<CellKey, Payload>,
    format_version: u32,
}

impl Matrix {
    /// Creates a fully populated, empty matrix.
    ///
    /// # Errors
    /// - `UnsupportedDepth` when `max_depth > MAX_SUPPORTED_DEPTH`.
    /// - `InvalidQuadtreeSize` when `quadtree_size == 0`.
    pub fn new(quadtree_size: u32, max_depth: u32) -> MatrixResult<Self> {
        ensure_supported_depth(max_depth)?;
        if quadtree_size == 0 {
            return Err(MatrixError::InvalidQuadtreeSize(quadtree_size));
        }

        Ok(Self {
            quadtree_size,
            max_depth,
            layers: (0..=max_depth).map(Layer::empty_for_depth).collect(),
            payload_pool: BTreeMap::new(),
            format_version: CURRENT_FORMAT_VERSION,
        })
    }

    /// Assembles a matrix from decoded parts, enforcing layer invariants.
    ///
    /// Payload keys are not checked against layer bounds: the pool may hold
    /// entries for any depth independently.
    pub fn from_parts(
        format_version: u32,
        quadtree_size: u32,
        max_depth: u32,
        layers: Vec<Layer>,
        payload_pool: BTreeMap<CellKey, Payload>,
    ) -> MatrixResult<Self> {
        ensure_supported_depth(max_depth)?;
        if quadtree_size == 0 {
            return Err(MatrixError::InvalidQuadtreeSize(quadtree_size));
        }
        let expected = max_depth as usize + 1;
        if layers.len() != expected {
            return Err(MatrixError::LayerCountMismatch {
                expected,
                actual: layers.len(),
            });
        }
        for (depth, layer) in (0u32..).zip(layers.iter()) {
            if !layer.has_shape_of_depth(depth) {
                return Err(MatrixError::InvalidLayerShape {
                    depth,
                    size: layer.size,
                    len: layer.nodes.len(),
                });
            }
        }

        Ok(Self {
            quadtree_size,
            max_depth,
            layers,
            payload_pool,
            format_version,
        })
    }

    pub fn quadtree_size(&self) -> u32 {
        self.quadtree_size
    }

    /// Changes the render extent of the depth-0 cell.
    pub fn set_quadtree_size(&mut self, quadtree_size: u32) -> MatrixResult<()> {
        if quadtree_size == 0 {
            return Err(MatrixError::InvalidQuadtreeSize(quadtree_size));
        }
        self.quadtree_size = quadtree_size;
        Ok(())
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, depth: u32) -> MatrixResult<&Layer> {
        self.layers
            .get(depth as usize)
            .ok_or(MatrixError::DepthOutOfRange {
                depth,
                max_depth: self.max_depth,
            })
    }

    pub fn payload_pool(&self) -> &BTreeMap<CellKey, Payload> {
        &self.payload_pool
    }

    /// Validates `(depth, index)` and returns its key.
    pub fn cell_key(&self, depth: u32, index: usize) -> MatrixResult<CellKey> {
        let layer = self.layer(depth)?;
        if index >= layer.len() {
            return Err(MatrixError::IndexOutOfRange {
                depth,
                index,
                len: layer.len(),
            });
        }
        Ok(CellKey::new(depth, index))
    }

    /// Packed color of one cell (`0` when empty).
    pub fn color(&self, depth: u32, index: usize) -> MatrixResult<u32> {
        let key = self.cell_key(depth, index)?;
        Ok(self.layers[key.depth as usize].nodes[key.index])
    }

    /// Overwrites one cell color.
    pub fn set_color(&mut self, depth: u32, index: usize, packed: u32) -> MatrixResult<()> {
        let key = self.cell_key(depth, index)?;
        self.layers[key.depth as usize].nodes[key.index] = packed;
        Ok(())
    }

    pub fn payload(&self, depth: u32, index: usize) -> MatrixResult<Option<&Payload>> {
        let key = self.cell_key(depth, index)?;
        Ok(self.payload_pool.get(&key))
    }

    pub fn payload_mut(&mut self, depth: u32, index: usize) -> MatrixResult<Option<&mut Payload>> {
        let key = self.cell_key(depth, index)?;
        Ok(self.payload_pool.get_mut(&key))
    }

    /// Attaches `payload` to one cell, returning the replaced payload.
    pub fn set_payload(
        &mut self,
        depth: u32,
        index: usize,
        payload: Payload,
    ) -> MatrixResult<Option<Payload>> {
        let key = self.cell_key(depth, index)?;
        Ok(self.payload_pool.insert(key, payload))
    }

    /// Detaches the payload of one cell, if any.
    pub fn remove_payload(&mut self, depth: u32, index: usize) -> MatrixResult<Option<Payload>> {
        let key = self.cell_key(depth, index)?;
        Ok(self.payload_pool.remove(&key))
    }

    /// Resolves a position relative to the quadtree's top-left corner.
    ///
    /// Returns `None` for positions outside `[0, quadtree_size)` on either
    /// axis or for a depth the matrix does not have.
    pub fn resolve_cell(&self, depth: u32, x: f64, y: f64) -> Option<CellKey> {
        let layer = self.layers.get(depth as usize)?;
        let extent = f64::from(self.quadtree_size);
        if !(0.0..extent).contains(&x) || !(0.0..extent).contains(&y) {
            return None;
        }

        let cell_size = extent / f64::from(layer.size);
        let max_coord = layer.size - 1;
        let cx = ((x / cell_size).floor() as u32).min(max_coord);
        let cy = ((y / cell_size).floor() as u32).min(max_coord);
        Some(CellKey::new(depth, layer.index_of(cx, cy)))
    }

    /// Non-empty cell counts, one entry per depth.
    pub fn painted_counts(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::painted_count).collect()
    }

    pub(crate) fn layer_mut(&mut self, depth: u32) -> Option<&mut Layer> {
        self.layers.get_mut(depth as usize)
    }

    pub(crate) fn payload_pool_mut(&mut self) -> &mut BTreeMap<CellKey, Payload> {
        &mut self.payload_pool
    }
}

fn ensure_supported_depth(max_depth: u32) -> MatrixResult<()> {
    if max_depth > MAX_SUPPORTED_DEPTH {
        return Err(MatrixError::UnsupportedDepth {
            max_depth,
            limit: MAX_SUPPORTED_DEPTH,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CellKey, Matrix, MatrixError};

    #[test]
    fn cell_key_round_trips_through_text() {
        let key: CellKey = "2:5".parse().expect("key should parse");
        assert_eq!(key, CellKey::new(2, 5));
        assert_eq!(key.to_string(), "2:5");
    }

    #[test]
    fn cell_key_rejects_malformed_text() {
        for value in ["", "2", "2:", ":5", "a:1", "1:-1", " 1:2", "1:2:3"] {
            let err = value.parse::<CellKey>().expect_err("malformed key must fail");
            assert_eq!(err, MatrixError::InvalidCellKey(value.to_string()));
        }
    }

    #[test]
    fn resolve_cell_maps_pixels_to_row_major_index() {
        let matrix = Matrix::new(400, 2).expect("matrix should build");

        assert_eq!(matrix.resolve_cell(0, 399.9, 0.0), Some(CellKey::new(0, 0)));
        assert_eq!(matrix.resolve_cell(2, 0.0, 0.0), Some(CellKey::new(2, 0)));
        assert_eq!(matrix.resolve_cell(2, 150.0, 120.0), Some(CellKey::new(2, 5)));
        assert_eq!(matrix.resolve_cell(2, 399.0, 399.0), Some(CellKey::new(2, 15)));
    }

    #[test]
    fn resolve_cell_rejects_outside_positions() {
        let matrix = Matrix::new(400, 2).expect("matrix should build");

        assert_eq!(matrix.resolve_cell(1, -0.5, 10.0), None);
        assert_eq!(matrix.resolve_cell(1, 10.0, 400.0), None);
        assert_eq!(matrix.resolve_cell(3, 10.0, 10.0), None);
    }

    #[test]
    fn quadtree_size_must_be_positive() {
        let err = Matrix::new(0, 1).expect_err("zero size must fail");
        assert_eq!(err, MatrixError::InvalidQuadtreeSize(0));

        let mut matrix = Matrix::new(10, 1).expect("matrix should build");
        matrix.set_quadtree_size(640).expect("positive size should apply");
        assert_eq!(matrix.quadtree_size(), 640);
        assert!(matrix.set_quadtree_size(0).is_err());
    }
}
