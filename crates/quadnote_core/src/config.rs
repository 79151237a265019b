//! Runtime configuration defaults.
//!
//! # Responsibility
//! - Centralize store and sandbox defaults used by sessions and the CLI.
//! - Resolve the Python interpreter from the environment once per config.
//!
//! # Invariants
//! - `MAX_SUPPORTED_DEPTH` bounds every matrix allocation (`4^depth` cells).
//! - Sandbox timeout is a wall-clock budget, never zero.

use std::path::PathBuf;
use std::time::Duration;

/// Pixel extent of the depth-0 cell for new contexts.
pub const DEFAULT_QUADTREE_SIZE: u32 = 400;
/// Deepest layer index for new contexts.
pub const DEFAULT_MAX_DEPTH: u32 = 4;
/// Context created when a session starts.
pub const DEFAULT_CONTEXT_ID: &str = "default";
/// Upper bound for `max_depth`; depth 12 already holds 16M cells.
pub const MAX_SUPPORTED_DEPTH: u32 = 12;
/// Persisted file format version written by this build.
pub const CURRENT_FORMAT_VERSION: u32 = 1;
/// Wall-clock budget for one sandbox execution.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(5);
/// Environment variable overriding the Python interpreter path.
pub const PYTHON_ENV_VAR: &str = "QUADNOTE_PYTHON";

const SCRATCH_DIR_NAME: &str = "quadtree_code";

/// Code sandbox settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    /// Parent of the per-sandbox scratch directory.
    pub scratch_root: PathBuf,
    /// Hard wall-clock limit per execution.
    pub timeout: Duration,
    /// Interpreter used by the built-in `python` executor.
    pub python_interpreter: PathBuf,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir().join(SCRATCH_DIR_NAME),
            timeout: DEFAULT_EXECUTION_TIMEOUT,
            python_interpreter: default_python_interpreter(),
        }
    }
}

impl SandboxConfig {
    pub fn with_scratch_root(mut self, scratch_root: impl Into<PathBuf>) -> Self {
        self.scratch_root = scratch_root.into();
        self
    }

    /// Overrides the execution budget. A zero duration is ignored.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    pub fn with_python_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.python_interpreter = interpreter.into();
        self
    }
}

/// Editor session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Size used for contexts created through the session.
    pub quadtree_size: u32,
    /// Max depth used for contexts created through the session.
    pub max_depth: u32,
    /// Context created and selected on startup.
    pub default_context: String,
    pub sandbox: SandboxConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quadtree_size: DEFAULT_QUADTREE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            default_context: DEFAULT_CONTEXT_ID.to_string(),
            sandbox: SandboxConfig::default(),
        }
    }
}

fn default_python_interpreter() -> PathBuf {
    match std::env::var_os(PYTHON_ENV_VAR) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(if cfg!(windows) { "python" } else { "python3" }),
    }
}
