use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::Builder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Directory a file path lives in; a bare file name lives in `.`.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Creates `dir` when missing and proves it accepts new files.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |e: io::Error| PersistError::OutputDir(format!("{}: {e}", dir.display()));

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(unusable)?;
    } else if !dir.is_dir() {
        return Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    tempfile::tempfile_in(dir).map_err(unusable)?;
    Ok(())
}

/// Writes whole artifacts into one directory via temp file and rename, so a
/// reader never sees a half-written file.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replaces `{dir}/{filename}` if it already exists.
    pub fn write(&self, filename: &str, content: impl AsRef<[u8]>) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let mut tmp = Builder::new()
            .prefix(".partial-")
            .tempfile_in(&self.dir)?;
        tmp.write_all(content.as_ref())?;
        tmp.as_file().sync_all()?;

        let target = self.dir.join(filename);
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    pub fn write_json(&self, filename: &str, value: &Value) -> Result<PathBuf, PersistError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write(filename, bytes)
    }
}
