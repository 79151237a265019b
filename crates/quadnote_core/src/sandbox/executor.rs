//! Executor capability and execution reports.

use crate::sandbox::scratch::ScratchDir;
use std::time::Duration;

const FALLBACK_EXTENSION: &str = "txt";

/// Scratch file extension for a language id.
pub fn extension_for_language(language: &str) -> &'static str {
    match language {
        "python" => "py",
        "javascript" => "js",
        "c" => "c",
        "cpp" => "cpp",
        "java" => "java",
        "html" => "html",
        _ => FALLBACK_EXTENSION,
    }
}

/// How one execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Child exited with code 0 inside the budget.
    Completed,
    /// Child exited with a nonzero code (or was killed by a signal).
    Failed { exit_code: Option<i32> },
    /// Budget elapsed; the child was killed.
    TimedOut,
    /// No executor is registered for the language.
    Unsupported,
    /// Scratch write or process spawn failed before the code ran.
    LaunchFailed,
}

/// Result of one `execute` call, always renderable as `(success, output)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub outcome: ExecutionOutcome,
    /// Captured stdout on success, otherwise a user-facing message.
    pub output: String,
}

impl ExecutionReport {
    pub fn completed(stdout: String) -> Self {
        Self {
            outcome: ExecutionOutcome::Completed,
            output: stdout,
        }
    }

    pub fn failed(exit_code: Option<i32>, stderr: &str) -> Self {
        Self {
            outcome: ExecutionOutcome::Failed { exit_code },
            output: format!("Error:\n{stderr}"),
        }
    }

    pub fn timed_out(budget: Duration) -> Self {
        Self {
            outcome: ExecutionOutcome::TimedOut,
            output: format!("Execution timed out ({} limit)", format_budget(budget)),
        }
    }

    pub fn unsupported(language: &str) -> Self {
        Self {
            outcome: ExecutionOutcome::Unsupported,
            output: format!(
                "No executor available for {language}. Would you like to create one?"
            ),
        }
    }

    pub fn launch_failed(err: impl std::fmt::Display) -> Self {
        Self {
            outcome: ExecutionOutcome::LaunchFailed,
            output: format!("Execution error: {err}"),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == ExecutionOutcome::Completed
    }

    /// `(success, output)` pair consumed by presentation code.
    pub fn into_pair(self) -> (bool, String) {
        (self.success(), self.output)
    }

    pub(crate) fn status_label(&self) -> &'static str {
        match self.outcome {
            ExecutionOutcome::Completed => "ok",
            ExecutionOutcome::Failed { .. } => "error",
            ExecutionOutcome::TimedOut => "timeout",
            ExecutionOutcome::Unsupported => "unsupported",
            ExecutionOutcome::LaunchFailed => "launch_failed",
        }
    }
}

/// One language runtime.
///
/// Implementations must fold every failure into the returned report and
/// remove whatever scratch files they create.
pub trait Executor: Send + Sync {
    /// Lowercase language id used as the registry key.
    fn language(&self) -> &str;

    /// Extension (without dot) for scratch source files.
    fn file_extension(&self) -> &str {
        extension_for_language(self.language())
    }

    /// Runs `code` to completion, failure or timeout.
    fn run(&self, code: &str, scratch: &ScratchDir) -> ExecutionReport;
}

fn format_budget(budget: Duration) -> String {
    if budget.subsec_nanos() == 0 {
        format!("{}s", budget.as_secs())
    } else {
        format!("{}ms", budget.as_millis())
    }
}
