//! Matrix use-case services.
//!
//! # Responsibility
//! - Implement multi-cell mutations (subdivide, reset) on top of the model.
//! - Provide the session facade used by presentation layers.
//!
//! # See also
//! - `store` for persistence and `sandbox` for code execution.

pub mod session;
pub mod subdivision;
