//! Out-of-process code execution.
//!
//! # Responsibility
//! - Run embedded cell code in a child process under a wall-clock budget.
//! - Dispatch by language through a registry of `Executor` implementations.
//! - Own the scratch directory that holds per-run source files.
//!
//! # Invariants
//! - `CodeSandbox::execute` never returns `Err` and never panics on bad
//!   input; every outcome is a renderable `ExecutionReport`.
//! - The scratch file of a run is removed (or removal attempted) on every
//!   exit path; removal failures are discarded.
//! - No isolation beyond the timeout: memory, CPU and network are not
//!   restricted.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod executor;
pub mod registry;
pub mod scratch;
pub mod script;

pub use executor::{extension_for_language, ExecutionOutcome, ExecutionReport, Executor};
pub use registry::CodeSandbox;
pub use scratch::{ScratchDir, ScratchFile};
pub use script::ScriptExecutor;

/// Sandbox setup and registration errors.
#[derive(Debug)]
pub enum SandboxError {
    /// Scratch directory could not be created.
    ScratchDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Language id is empty or not lowercase `[a-z0-9_+-]`.
    InvalidLanguageId(String),
    /// An executor for this language is already registered.
    DuplicateLanguage(String),
}

impl Display for SandboxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScratchDir { path, source } => write!(
                f,
                "failed to create scratch directory `{}`: {source}",
                path.display()
            ),
            Self::InvalidLanguageId(value) => write!(f, "language id is invalid: `{value}`"),
            Self::DuplicateLanguage(value) => {
                write!(f, "executor already registered for language: {value}")
            }
        }
    }
}

impl Error for SandboxError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ScratchDir { source, .. } => Some(source),
            Self::InvalidLanguageId(_) | Self::DuplicateLanguage(_) => None,
        }
    }
}
