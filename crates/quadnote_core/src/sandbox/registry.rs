//! Language registry and execution entry point.

use crate::config::SandboxConfig;
use crate::sandbox::executor::{ExecutionReport, Executor};
use crate::sandbox::scratch::ScratchDir;
use crate::sandbox::script::ScriptExecutor;
use crate::sandbox::SandboxError;
use log::info;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Registry of executors plus the scratch directory they share.
///
/// The scratch directory is created by the constructor and purged when the
/// sandbox is dropped.
pub struct CodeSandbox {
    executors: BTreeMap<String, Arc<dyn Executor>>,
    scratch: ScratchDir,
    config: SandboxConfig,
}

impl CodeSandbox {
    /// Creates a sandbox with the built-in `python` executor.
    pub fn new(config: SandboxConfig) -> Result<Self, SandboxError> {
        let mut sandbox = Self::without_executors(config)?;
        let python = ScriptExecutor::python(&sandbox.config);
        sandbox.register(Arc::new(python))?;
        Ok(sandbox)
    }

    /// Creates a sandbox with an empty registry.
    pub fn without_executors(config: SandboxConfig) -> Result<Self, SandboxError> {
        let scratch = ScratchDir::create(&config.scratch_root)?;
        Ok(Self {
            executors: BTreeMap::new(),
            scratch,
            config,
        })
    }

    /// Registers one executor under its language id.
    pub fn register(&mut self, executor: Arc<dyn Executor>) -> Result<(), SandboxError> {
        let language = executor.language().trim().to_string();
        if !is_valid_language_id(&language) {
            return Err(SandboxError::InvalidLanguageId(language));
        }
        if self.executors.contains_key(&language) {
            return Err(SandboxError::DuplicateLanguage(language));
        }
        info!(
            "event=executor_register module=sandbox status=ok language={}",
            language
        );
        self.executors.insert(language, executor);
        Ok(())
    }

    /// Sorted language ids with a registered executor.
    pub fn languages(&self) -> Vec<String> {
        self.executors.keys().cloned().collect()
    }

    pub fn supports(&self, language: &str) -> bool {
        self.executors.contains_key(&normalize_language(language))
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Runs `code` with the executor registered for `language`.
    ///
    /// Lookup is case-insensitive. An unknown language yields an
    /// `Unsupported` report without touching the filesystem.
    pub fn execute(&self, code: &str, language: &str) -> ExecutionReport {
        let started_at = Instant::now();
        let normalized = normalize_language(language);

        let report = match self.executors.get(&normalized) {
            Some(executor) => executor.run(code, &self.scratch),
            None => ExecutionReport::unsupported(language),
        };

        info!(
            "event=code_execute module=sandbox status={} language={} code_bytes={} output_bytes={} duration_ms={}",
            report.status_label(),
            normalized,
            code.len(),
            report.output.len(),
            started_at.elapsed().as_millis()
        );
        report
    }
}

fn normalize_language(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}

fn is_valid_language_id(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '+'
        })
}
