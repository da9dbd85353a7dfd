//! Per-URL records of what the crawl did.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What happened to a single fetched URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrawlOutcome {
    Saved,
    Skipped { reason: String },
    /// The resource could not be fetched.
    Failed { error: String },
    /// The resource was fetched but writing it out failed.
    WriteFailed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response_time: Duration,
    pub output_path: Option<PathBuf>,
    pub references_found: usize,
    pub outcome: CrawlOutcome,
}

impl CrawlResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            content_type: None,
            content_length: None,
            response_time: Duration::from_secs(0),
            output_path: None,
            references_found: 0,
            outcome: CrawlOutcome::Saved,
        }
    }

    pub fn with_error(url: String, error: String) -> Self {
        Self {
            outcome: CrawlOutcome::Failed { error },
            ..Self::new(url)
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::Saved)
    }

    pub fn is_failed(&self) -> bool {
        matches!(
            self.outcome,
            CrawlOutcome::Failed { .. } | CrawlOutcome::WriteFailed { .. }
        )
    }

    pub fn is_write_failure(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::WriteFailed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::Skipped { .. })
    }
}
