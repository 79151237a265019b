//! Scratch directory and scratch file lifecycle.
//!
//! # Invariants
//! - One `ScratchDir` per sandbox instance, under its own unique subdirectory.
//! - Dropping a `ScratchDir` purges the directory best-effort.
//! - Dropping a `ScratchFile` removes the file best-effort.
//! - File names are content-addressed: identical code maps to the same name.

use crate::sandbox::SandboxError;
use log::debug;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CODE_HASH_CHARS: usize = 16;

/// Directory holding scratch files of one sandbox.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates `<root>/<uuid>` (and `root` if missing).
    pub fn create(root: &Path) -> Result<Self, SandboxError> {
        let path = root.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&path).map_err(|source| SandboxError::ScratchDir {
            path: path.clone(),
            source,
        })?;
        debug!(
            "event=scratch_create module=sandbox status=ok path={}",
            path.display()
        );
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `code` to a content-addressed file and returns its guard.
    pub fn write(&self, code: &str, extension: &str) -> std::io::Result<ScratchFile> {
        if !self.path.is_dir() {
            std::fs::create_dir_all(&self.path)?;
        }
        let path = self.path.join(scratch_file_name(code, extension));
        std::fs::write(&path, code)?;
        Ok(ScratchFile { path })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_dir_all(&self.path) {
            debug!(
                "event=scratch_purge module=sandbox status=ignored path={} error={}",
                self.path.display(),
                err
            );
        }
    }
}

/// One scratch source file, removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!(
                "event=scratch_cleanup module=sandbox status=ignored path={} error={}",
                self.path.display(),
                err
            );
        }
    }
}

/// `temp_<hash>.<ext>` where `<hash>` is a sha256 prefix of `code`.
pub fn scratch_file_name(code: &str, extension: &str) -> String {
    let digest = hex::encode(Sha256::digest(code.as_bytes()));
    let extension = extension.trim_start_matches('.');
    format!("temp_{}.{extension}", &digest[..CODE_HASH_CHARS])
}
