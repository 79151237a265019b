//! Named context collection.
//!
//! # Responsibility
//! - Create, list, look up and remove matrices by context id.
//! - Import/export contexts through the persisted document format.
//!
//! # Invariants
//! - `list_contexts` preserves insertion order.
//! - `create_context` overwrites an existing id in place (same position).
//! - `import_from_file` derives a fresh id and never overwrites.

use crate::model::matrix::Matrix;
use crate::store::document::{load_matrix, save_matrix};
use crate::store::{StoreError, StoreResult};
use indexmap::IndexMap;
use log::{debug, info};
use std::path::Path;

const FALLBACK_CONTEXT_ID: &str = "context";

/// In-memory owner of every context matrix.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: IndexMap<String, Matrix>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty matrix under `id`, replacing any existing one.
    ///
    /// Callers that must not overwrite should check `contains` first.
    pub fn create_context(
        &mut self,
        id: impl Into<String>,
        quadtree_size: u32,
        max_depth: u32,
    ) -> StoreResult<&mut Matrix> {
        let id = id.into();
        let matrix = Matrix::new(quadtree_size, max_depth)?;
        info!(
            "event=context_create module=store status=ok id={} size={} max_depth={} replaced={}",
            id,
            quadtree_size,
            max_depth,
            self.contains(&id)
        );

        let (position, _) = self.contexts.insert_full(id, matrix);
        Ok(&mut self.contexts[position])
    }

    /// Context ids in insertion order.
    pub fn list_contexts(&self) -> Vec<String> {
        self.contexts.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.contexts.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Matrix> {
        self.contexts.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Matrix> {
        self.contexts.get_mut(id)
    }

    /// Looks up a context or fails with `NotFound`.
    pub fn require(&self, id: &str) -> StoreResult<&Matrix> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn require_mut(&mut self, id: &str) -> StoreResult<&mut Matrix> {
        self.contexts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Removes a context, keeping the order of the remaining ones.
    pub fn remove_context(&mut self, id: &str) -> Option<Matrix> {
        let removed = self.contexts.shift_remove(id);
        if removed.is_some() {
            info!("event=context_remove module=store status=ok id={}", id);
        }
        removed
    }

    /// Inserts `matrix` under the first free id derived from `base_id`.
    ///
    /// Returns the assigned id: `base_id` itself, else `base_id_1`,
    /// `base_id_2`, ... (first unused suffix).
    pub fn insert_unique(&mut self, base_id: &str, matrix: Matrix) -> String {
        let id = self.unique_id(base_id);
        self.contexts.insert(id.clone(), matrix);
        id
    }

    /// Loads a context file and registers it under a unique id.
    ///
    /// # Errors
    /// - `Io` when the file cannot be read.
    /// - `Format` when the document is malformed or incomplete.
    pub fn import_from_file(&mut self, path: impl AsRef<Path>) -> StoreResult<String> {
        let path = path.as_ref();
        let matrix = load_matrix(path)?;
        let base_id = derive_context_id(path);
        let id = self.insert_unique(&base_id, matrix);
        info!(
            "event=context_import module=store status=ok id={} renamed={}",
            id,
            id != base_id
        );
        Ok(id)
    }

    /// Writes one context to `path`.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `Io` when the write fails; the file content is then undefined.
    pub fn export_to_file(&self, id: &str, path: impl AsRef<Path>) -> StoreResult<()> {
        let matrix = self.require(id)?;
        save_matrix(matrix, path)?;
        info!("event=context_export module=store status=ok id={}", id);
        Ok(())
    }

    fn unique_id(&self, base_id: &str) -> String {
        if !self.contains(base_id) {
            return base_id.to_string();
        }
        let mut counter = 1usize;
        loop {
            let candidate = format!("{base_id}_{counter}");
            if !self.contains(&candidate) {
                debug!(
                    "event=context_rename module=store status=ok base={} assigned={}",
                    base_id, candidate
                );
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Derives a context id from a file path: the file name with every `.json`
/// occurrence removed.
pub fn derive_context_id(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = file_name.replace(".json", "");
    if id.trim().is_empty() {
        FALLBACK_CONTEXT_ID.to_string()
    } else {
        id
    }
}
