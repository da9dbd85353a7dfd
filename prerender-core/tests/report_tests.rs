// Tests for report generation functionality

use prerender_core::report::{ReportFormat, generate_json_report, generate_mirror_report};
use prerender_scanner::{CrawlOutcome, CrawlResult};
use std::path::PathBuf;

fn sample_results() -> Vec<CrawlResult> {
    let mut index = CrawlResult::new("https://example.test/".to_string());
    index.status_code = 200;
    index.content_type = Some("text/html".to_string());
    index.output_path = Some(PathBuf::from("dist/index.html"));
    index.references_found = 2;

    let mut api = CrawlResult::new("https://example.test/api/".to_string());
    api.status_code = 200;
    api.outcome = CrawlOutcome::Skipped {
        reason: "ambiguous directory path".to_string(),
    };

    let mut gone = CrawlResult::with_error(
        "https://example.test/gone".to_string(),
        "https://example.test/gone responded with status 404".to_string(),
    );
    gone.status_code = 404;

    vec![index, api, gone]
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json)));
    assert!(ReportFormat::from_str("csv").is_none());
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contains_summary_and_paths() {
    colored::control::set_override(false);
    let report = generate_mirror_report(&sample_results());

    assert!(report.contains("Resources fetched: 3"));
    assert!(report.contains("Saved: 1"));
    assert!(report.contains("Skipped: 1"));
    assert!(report.contains("Failed: 1"));
    assert!(report.contains("200 / → dist/index.html"));
    assert!(report.contains("200 /api/ skipped: ambiguous directory path"));
    assert!(report.contains("404 /gone failed:"));
}

#[test]
fn test_text_report_empty() {
    colored::control::set_override(false);
    let report = generate_mirror_report(&[]);
    assert!(report.contains("Resources fetched: 0"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&sample_results()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["summary"]["fetched"], 3);
    assert_eq!(value["summary"]["failed"], 1);
    assert_eq!(value["resources"][0]["outcome"]["kind"], "saved");
    assert_eq!(value["resources"][1]["outcome"]["kind"], "skipped");
    assert_eq!(value["resources"][2]["status_code"], 404);
}
