//! Persisted matrix document codec.
//!
//! # Responsibility
//! - Map `Matrix` to the on-disk JSON schema and back.
//! - Reject incomplete or structurally invalid documents with `Format`.
//!
//! # Invariants
//! - `quadtree_size`, `max_depth` and `layers` are required on load.
//! - `version` defaults to 1 and `payload_pool` to empty when absent.
//! - Unknown payload `type` values are skipped with a warning, never kept.
//! - `decode(encode(m)) == m` for every matrix.

use crate::config::CURRENT_FORMAT_VERSION;
use crate::model::layer::Layer;
use crate::model::matrix::{CellKey, Matrix};
use crate::model::payload::{Payload, PayloadKind};
use crate::store::{StoreError, StoreResult};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

#[derive(Serialize)]
struct MatrixDocumentRef<'a> {
    version: u32,
    quadtree_size: u32,
    max_depth: u32,
    layers: &'a [Layer],
    payload_pool: BTreeMap<String, &'a Payload>,
}

#[derive(Deserialize)]
struct MatrixDocument {
    version: Option<u32>,
    quadtree_size: Option<u32>,
    max_depth: Option<u32>,
    layers: Option<Vec<Layer>>,
    payload_pool: Option<BTreeMap<String, Value>>,
}

/// Encodes a matrix as pretty-printed JSON text.
pub fn encode_matrix(matrix: &Matrix) -> StoreResult<String> {
    let document = MatrixDocumentRef {
        version: matrix.format_version(),
        quadtree_size: matrix.quadtree_size(),
        max_depth: matrix.max_depth(),
        layers: matrix.layers(),
        payload_pool: matrix
            .payload_pool()
            .iter()
            .map(|(key, payload)| (key.to_string(), payload))
            .collect(),
    };

    serde_json::to_string_pretty(&document)
        .map_err(|err| StoreError::Format(format!("failed to encode matrix: {err}")))
}

/// Decodes a matrix from JSON text.
///
/// # Errors
/// - `Format` when a required field is missing, a field has the wrong type,
///   a payload key or payload body is malformed, or layer shapes violate the
///   matrix invariants.
pub fn decode_matrix(text: &str) -> StoreResult<Matrix> {
    let document: MatrixDocument = serde_json::from_str(text)
        .map_err(|err| StoreError::Format(format!("unreadable document: {err}")))?;

    let quadtree_size = require(document.quadtree_size, "quadtree_size")?;
    let max_depth = require(document.max_depth, "max_depth")?;
    let layers = require(document.layers, "layers")?;
    let payload_pool = decode_payload_pool(document.payload_pool.unwrap_or_default())?;

    Matrix::from_parts(
        document.version.unwrap_or(CURRENT_FORMAT_VERSION),
        quadtree_size,
        max_depth,
        layers,
        payload_pool,
    )
    .map_err(|err| StoreError::Format(err.to_string()))
}

/// Reads and decodes a matrix file.
pub fn load_matrix(path: impl AsRef<Path>) -> StoreResult<Matrix> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let result = std::fs::read_to_string(path)
        .map_err(|err| StoreError::io(path, err))
        .and_then(|text| decode_matrix(&text));

    match &result {
        Ok(matrix) => info!(
            "event=matrix_load module=store status=ok max_depth={} payloads={} duration_ms={}",
            matrix.max_depth(),
            matrix.payload_pool().len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=matrix_load module=store status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

/// Encodes and writes a matrix file, replacing any existing content.
pub fn save_matrix(matrix: &Matrix, path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let result = encode_matrix(matrix)
        .and_then(|text| std::fs::write(path, text).map_err(|err| StoreError::io(path, err)));

    match &result {
        Ok(()) => info!(
            "event=matrix_save module=store status=ok max_depth={} payloads={} duration_ms={}",
            matrix.max_depth(),
            matrix.payload_pool().len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=matrix_save module=store status=error duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn require<T>(value: Option<T>, field: &str) -> StoreResult<T> {
    value.ok_or_else(|| StoreError::Format(format!("missing required field `{field}`")))
}

fn decode_payload_pool(raw: BTreeMap<String, Value>) -> StoreResult<BTreeMap<CellKey, Payload>> {
    let mut pool = BTreeMap::new();

    for (raw_key, value) in raw {
        let key: CellKey = raw_key
            .parse()
            .map_err(|err| StoreError::Format(format!("payload_pool: {err}")))?;

        let type_name = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                StoreError::Format(format!("payload `{key}` has no string `type` field"))
            })?;
        if PayloadKind::parse(type_name).is_none() {
            warn!(
                "event=payload_skip module=store status=ignored key={} type={}",
                key, type_name
            );
            continue;
        }

        let payload: Payload = serde_json::from_value(value)
            .map_err(|err| StoreError::Format(format!("payload `{key}`: {err}")))?;
        pool.insert(key, payload);
    }

    Ok(pool)
}
