//! Errors raised while crawling and saving.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Refusing to overwrite existing binary file: {}", path.display())]
    PathCollision { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, ScanError>;
