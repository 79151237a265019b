//! Context storage and JSON persistence.
//!
//! # Responsibility
//! - Own named matrices and their creation, lookup and removal.
//! - Convert matrices to and from the persisted JSON document.
//!
//! # Invariants
//! - Context ids are unique; import never overwrites an existing context.
//! - Loaded matrices satisfy every layer-shape invariant of `Matrix`.
//! - Partial writes are not rolled back; a failed export leaves the target
//!   file in an undefined state.

use crate::model::matrix::MatrixError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod context_store;
pub mod document;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level failure.
#[derive(Debug)]
pub enum StoreError {
    /// Persisted document is malformed or incomplete.
    Format(String),
    /// Unknown context id.
    NotFound(String),
    /// Filesystem failure on read or write.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Matrix construction or addressing failure.
    Matrix(MatrixError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format(message) => write!(f, "invalid matrix format: {message}"),
            Self::NotFound(id) => write!(f, "context not found: {id}"),
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::Matrix(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Matrix(err) => Some(err),
            Self::Format(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<MatrixError> for StoreError {
    fn from(value: MatrixError) -> Self {
        Self::Matrix(value)
    }
}
