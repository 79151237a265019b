//! Core of the quadnote multi-resolution grid editor.
//! This crate owns the grid model, its persistence and the code sandbox;
//! rendering and input handling live in front ends.

pub mod config;
pub mod logging;
pub mod model;
pub mod sandbox;
pub mod service;
pub mod store;

pub use config::{SandboxConfig, SessionConfig};
pub use logging::{init_logging, logging_status, LogLevel, LogSettings, LogTarget};
pub use model::color::Rgb;
pub use model::layer::Layer;
pub use model::matrix::{CellKey, Matrix, MatrixError, MatrixResult};
pub use model::payload::{Payload, PayloadKind};
pub use sandbox::{CodeSandbox, ExecutionOutcome, ExecutionReport, Executor, SandboxError};
pub use service::session::{ActionResponse, CellAction, EditorSession, SessionError};
pub use service::subdivision::{child_keys, reset_cell, subdivide};
pub use store::context_store::{derive_context_id, ContextStore};
pub use store::document::{decode_matrix, encode_matrix, load_matrix, save_matrix};
pub use store::{StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
