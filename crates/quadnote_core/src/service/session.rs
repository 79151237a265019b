//! Editor session facade consumed by presentation layers.
//!
//! # Responsibility
//! - Track the current context and current depth.
//! - Expose cell resolution, reads and mutations by `(depth, index)`.
//! - Fold routine failures (file I/O, bad files, code execution) into
//!   renderable envelopes.
//!
//! # Invariants
//! - Contract violations by the caller (bad depth/index, no context) are
//!   returned as `SessionError`, never folded into envelopes.
//! - `current_depth <= max_depth` of the current context at all times.
//! - Import selects the imported context; creating a context selects it.
//! - Removing the current context clears the selection; cell operations
//!   then fail with `NoActiveContext`.

use crate::config::SessionConfig;
use crate::model::color::Rgb;
use crate::model::matrix::{CellKey, Matrix, MatrixError};
use crate::model::payload::{Payload, PayloadKind};
use crate::sandbox::{CodeSandbox, ExecutionReport, SandboxError};
use crate::service::subdivision::{reset_cell, subdivide};
use crate::store::context_store::ContextStore;
use crate::store::StoreError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Session-level contract violations and setup failures.
#[derive(Debug)]
pub enum SessionError {
    /// No context is selected.
    NoActiveContext,
    /// Context id is blank.
    InvalidContextId,
    /// Cell carries no code payload to execute.
    NoCodePayload(CellKey),
    Matrix(MatrixError),
    Store(StoreError),
    Sandbox(SandboxError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveContext => write!(f, "no context selected"),
            Self::InvalidContextId => write!(f, "context id must not be blank"),
            Self::NoCodePayload(key) => write!(f, "cell {key} has no code payload"),
            Self::Matrix(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Sandbox(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Matrix(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Sandbox(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MatrixError> for SessionError {
    fn from(value: MatrixError) -> Self {
        Self::Matrix(value)
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Matrix(err) => Self::Matrix(err),
            other => Self::Store(other),
        }
    }
}

impl From<SandboxError> for SessionError {
    fn from(value: SandboxError) -> Self {
        Self::Sandbox(value)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Outcome envelope for routine user actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether the action succeeded.
    pub ok: bool,
    /// Context affected by the action, when there is one.
    pub context_id: Option<String>,
    /// Human-readable message for status display.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, context_id: Option<String>) -> Self {
        Self {
            ok: true,
            context_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            context_id: None,
            message: message.into(),
        }
    }
}

/// Actions offered for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    ChangeColor,
    AddText,
    AddCode,
    EditCode,
    ExecuteCode,
    AddImage,
    Subdivide,
    ResetCell,
}

/// Stateful entry point for one editor instance.
pub struct EditorSession {
    store: ContextStore,
    sandbox: CodeSandbox,
    config: SessionConfig,
    current_context: Option<String>,
    current_depth: u32,
}

impl EditorSession {
    /// Creates the store with the default context selected and the sandbox
    /// with its built-in executors.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let sandbox = CodeSandbox::new(config.sandbox.clone())?;
        Self::with_sandbox(config, sandbox)
    }

    /// Same as `new` with a caller-assembled sandbox.
    pub fn with_sandbox(config: SessionConfig, sandbox: CodeSandbox) -> SessionResult<Self> {
        let mut store = ContextStore::new();
        store.create_context(
            config.default_context.clone(),
            config.quadtree_size,
            config.max_depth,
        )?;
        let current_context = Some(config.default_context.clone());

        Ok(Self {
            store,
            sandbox,
            config,
            current_context,
            current_depth: 0,
        })
    }

    pub fn store(&self) -> &ContextStore {
        &self.store
    }

    pub fn sandbox(&self) -> &CodeSandbox {
        &self.sandbox
    }

    pub fn sandbox_mut(&mut self) -> &mut CodeSandbox {
        &mut self.sandbox
    }

    pub fn list_contexts(&self) -> Vec<String> {
        self.store.list_contexts()
    }

    pub fn current_context(&self) -> Option<&str> {
        self.current_context.as_deref()
    }

    pub fn current_depth(&self) -> u32 {
        self.current_depth
    }

    pub fn current_matrix(&self) -> SessionResult<&Matrix> {
        let id = self
            .current_context
            .as_deref()
            .ok_or(SessionError::NoActiveContext)?;
        Ok(self.store.require(id)?)
    }

    fn current_matrix_mut(&mut self) -> SessionResult<&mut Matrix> {
        let id = self
            .current_context
            .as_deref()
            .ok_or(SessionError::NoActiveContext)?;
        Ok(self.store.require_mut(id)?)
    }

    /// Switches the current context.
    pub fn select_context(&mut self, id: &str) -> SessionResult<()> {
        if !self.store.contains(id) {
            return Err(StoreError::NotFound(id.to_string()).into());
        }
        self.current_context = Some(id.to_string());
        self.clamp_depth();
        Ok(())
    }

    /// Removes a context. Removing the current one leaves no context
    /// selected until `select_context`, `new_context` or an import.
    pub fn remove_context(&mut self, id: &str) -> ActionResponse {
        if self.store.remove_context(id).is_none() {
            return ActionResponse::failure(format!("Unknown context {id}"));
        }
        if self.current_context.as_deref() == Some(id) {
            self.current_context = None;
            self.current_depth = 0;
        }
        ActionResponse::success(format!("Removed context {id}"), Some(id.to_string()))
    }

    /// Sets the viewed depth, clamped to the current matrix. Returns the
    /// depth actually applied.
    pub fn set_depth(&mut self, depth: u32) -> u32 {
        self.current_depth = depth;
        self.clamp_depth();
        self.current_depth
    }

    /// Creates an empty context with the session's size and depth and
    /// selects it. An existing context with the same id is replaced.
    pub fn new_context(&mut self, id: &str) -> SessionResult<ActionResponse> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SessionError::InvalidContextId);
        }
        let replaced = self.store.contains(id);
        self.store
            .create_context(id, self.config.quadtree_size, self.config.max_depth)?;
        self.current_context = Some(id.to_string());
        self.clamp_depth();

        let message = if replaced {
            format!("Replaced context {id}")
        } else {
            format!("Created context {id}")
        };
        Ok(ActionResponse::success(message, Some(id.to_string())))
    }

    /// Imports a context file and selects it.
    pub fn import_context(&mut self, path: impl AsRef<Path>) -> ActionResponse {
        match self.store.import_from_file(path.as_ref()) {
            Ok(id) => {
                self.current_context = Some(id.clone());
                self.clamp_depth();
                ActionResponse::success(format!("Imported context {id}"), Some(id))
            }
            Err(err) => {
                warn!(
                    "event=context_import module=session status=error error={}",
                    err
                );
                ActionResponse::failure(format!("Import failed: {err}"))
            }
        }
    }

    /// Exports the current context.
    pub fn export_context(&self, path: impl AsRef<Path>) -> ActionResponse {
        let Some(id) = self.current_context.clone() else {
            return ActionResponse::failure("Export failed: no context selected");
        };
        match self.store.export_to_file(&id, path.as_ref()) {
            Ok(()) => ActionResponse::success(format!("Exported context {id}"), Some(id)),
            Err(err) => ActionResponse::failure(format!("Export failed: {err}")),
        }
    }

    /// Changes the render size of the current context.
    pub fn set_quadtree_size(&mut self, size: u32) -> SessionResult<()> {
        self.current_matrix_mut()?.set_quadtree_size(size)?;
        Ok(())
    }

    /// Resolves a position relative to the quadtree origin at the current
    /// depth.
    pub fn resolve_cell(&self, x: f64, y: f64) -> Option<CellKey> {
        self.current_matrix()
            .ok()?
            .resolve_cell(self.current_depth, x, y)
    }

    pub fn cell_color(&self, depth: u32, index: usize) -> SessionResult<u32> {
        Ok(self.current_matrix()?.color(depth, index)?)
    }

    pub fn cell_payload(&self, depth: u32, index: usize) -> SessionResult<Option<&Payload>> {
        Ok(self.current_matrix()?.payload(depth, index)?)
    }

    /// Actions valid for one cell of the current context.
    pub fn cell_actions(&self, depth: u32, index: usize) -> SessionResult<Vec<CellAction>> {
        let matrix = self.current_matrix()?;
        let has_code = matches!(
            matrix.payload(depth, index)?.map(Payload::kind),
            Some(PayloadKind::Code)
        );

        let mut actions = vec![CellAction::ChangeColor, CellAction::AddText, CellAction::AddCode];
        if has_code {
            actions.push(CellAction::EditCode);
            actions.push(CellAction::ExecuteCode);
        }
        actions.push(CellAction::AddImage);
        if depth < matrix.max_depth() {
            actions.push(CellAction::Subdivide);
        }
        actions.push(CellAction::ResetCell);
        Ok(actions)
    }

    pub fn paint(&mut self, depth: u32, index: usize, color: Rgb) -> SessionResult<()> {
        self.current_matrix_mut()?
            .set_color(depth, index, color.pack())?;
        Ok(())
    }

    pub fn set_text(
        &mut self,
        depth: u32,
        index: usize,
        text: impl Into<String>,
        color: Rgb,
    ) -> SessionResult<()> {
        self.current_matrix_mut()?
            .set_payload(depth, index, Payload::text(text, color))?;
        Ok(())
    }

    /// Saves editor code onto a cell.
    pub fn save_code(
        &mut self,
        depth: u32,
        index: usize,
        code: impl Into<String>,
        language: &str,
    ) -> SessionResult<()> {
        self.current_matrix_mut()?
            .set_payload(depth, index, Payload::code(code, language))?;
        Ok(())
    }

    /// Reads an image file and attaches its bytes to a cell.
    ///
    /// Read failures are returned as a failed envelope; bad addresses are
    /// returned as errors.
    pub fn attach_image_file(
        &mut self,
        depth: u32,
        index: usize,
        path: impl AsRef<Path>,
    ) -> SessionResult<ActionResponse> {
        let key = self.current_matrix()?.cell_key(depth, index)?;
        let path = path.as_ref();
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = StoreError::io(path, err);
                warn!(
                    "event=image_attach module=session status=error cell={} error={}",
                    key, err
                );
                return Ok(ActionResponse::failure(format!("Image load failed: {err}")));
            }
        };

        let size = bytes.len();
        self.current_matrix_mut()?
            .set_payload(depth, index, Payload::image(bytes))?;
        info!(
            "event=image_attach module=session status=ok cell={} bytes={}",
            key, size
        );
        Ok(ActionResponse::success(
            format!("Attached image ({size} bytes) to {key}"),
            self.current_context.clone(),
        ))
    }

    pub fn subdivide(&mut self, depth: u32, index: usize) -> SessionResult<[CellKey; 4]> {
        Ok(subdivide(self.current_matrix_mut()?, depth, index)?)
    }

    pub fn reset_cell(&mut self, depth: u32, index: usize) -> SessionResult<Option<Payload>> {
        Ok(reset_cell(self.current_matrix_mut()?, depth, index)?)
    }

    /// Executes the code payload of a cell.
    pub fn execute_cell(&self, depth: u32, index: usize) -> SessionResult<ExecutionReport> {
        let matrix = self.current_matrix()?;
        let key = matrix.cell_key(depth, index)?;
        let (code, language) = matrix
            .payload(depth, index)?
            .and_then(Payload::as_code)
            .ok_or(SessionError::NoCodePayload(key))?;
        Ok(self.sandbox.execute(code, language))
    }

    /// Executes code straight from the editor.
    pub fn execute_code(&self, code: &str, language: &str) -> ExecutionReport {
        self.sandbox.execute(code, language)
    }

    fn clamp_depth(&mut self) {
        let max_depth = self.current_matrix().map(Matrix::max_depth).unwrap_or(0);
        self.current_depth = self.current_depth.min(max_depth);
    }
}
