// Run summaries rendered from crawl results

use colored::Colorize;
use prerender_scanner::{CrawlOutcome, CrawlResult};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSummary {
    pub fetched: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
    pub write_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorReport {
    pub summary: MirrorSummary,
    pub resources: Vec<CrawlResult>,
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() { "/".to_string() } else { path }
        })
        .unwrap_or_else(|| url.to_string())
}

pub fn summarize(results: &[CrawlResult]) -> MirrorSummary {
    MirrorSummary {
        fetched: results.len(),
        saved: results.iter().filter(|r| r.is_saved()).count(),
        skipped: results.iter().filter(|r| r.is_skipped()).count(),
        failed: results.iter().filter(|r| r.is_failed()).count(),
        write_failed: results.iter().filter(|r| r.is_write_failure()).count(),
    }
}

/// Human-readable report, one line per fetched resource.
pub fn generate_mirror_report(results: &[CrawlResult]) -> String {
    let summary = summarize(results);

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Resources fetched: {}\n", summary.fetched));
    report.push_str(&format!("  Saved: {}\n", summary.saved));
    report.push_str(&format!("  Skipped: {}\n", summary.skipped));
    report.push_str(&format!("  Failed: {}\n", summary.failed));
    if summary.write_failed > 0 {
        report.push_str(&format!("  Write failures: {}\n", summary.write_failed));
    }
    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    let mut sorted: Vec<&CrawlResult> = results.iter().collect();
    sorted.sort_by_key(|r| extract_url_path(&r.url));

    for result in sorted {
        let path = extract_url_path(&result.url);

        let status = match result.status_code {
            0 => "---".dimmed().to_string(),
            200..=299 => result.status_code.to_string().green().to_string(),
            300..=399 => result.status_code.to_string().cyan().to_string(),
            400..=499 => result.status_code.to_string().yellow().to_string(),
            _ => result.status_code.to_string().red().to_string(),
        };

        let mut line = format!("  {} {}", status, path);
        match &result.outcome {
            CrawlOutcome::Saved => {
                if let Some(ref output) = result.output_path {
                    line.push_str(&format!(" {} {}", "→".blue(), output.display()));
                }
            }
            CrawlOutcome::Skipped { reason } => {
                line.push_str(&format!(" {}", format!("skipped: {}", reason).dimmed()));
            }
            CrawlOutcome::Failed { error } => {
                line.push_str(&format!(" {}", format!("failed: {}", error).red()));
            }
            CrawlOutcome::WriteFailed { error } => {
                line.push_str(&format!(" {}", format!("write failed: {}", error).red().bold()));
            }
        }

        report.push_str(&line);
        report.push('\n');
    }

    report
}

pub fn generate_json_report(results: &[CrawlResult]) -> serde_json::Result<String> {
    let report = MirrorReport {
        summary: summarize(results),
        resources: results.to_vec(),
    };
    serde_json::to_string_pretty(&report)
}
