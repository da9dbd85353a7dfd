//! Filesystem destination for mirrored resources.

use crate::error::{Result, ScanError};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// Destination for materialized resources.
pub trait OutputSink: Send {
    /// Create parent directories and write `bytes`, replacing any existing file.
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Create parent directories and write `bytes` to a file that must not
    /// exist yet.
    fn write_new(&mut self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Writes straight to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl OutputSink for FsSink {
    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        create_parent(path)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn write_new(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        create_parent(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ScanError::PathCollision {
                    path: path.to_path_buf(),
                },
                _ => ScanError::IoError(e),
            })?;
        file.write_all(bytes)?;
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
