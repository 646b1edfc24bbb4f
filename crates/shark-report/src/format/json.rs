//! The JSON formatter: always a complete, parseable document, even for a
//! partial/aborted run — callers never need to special-case `status =
//! "failure"` to get valid JSON back.

use crate::schema::{ScanReport, ValidationReport};

pub fn render_scan_report(report: &ScanReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render_validation_report(report: &ValidationReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
