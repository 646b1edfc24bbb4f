//! Human-readable rendering of a `ScanReport`/`ValidationReport`.
//! Section order is fixed: header, summary table, per-kind breakdown,
//! errors grouped by kind, warnings, footer. Color is opt-in by terminal
//! detection, never forced — callers pass `no_color` straight through from
//! `--no-color` or a piped stdout.

use std::fmt::Write as _;

use colored::{Color, Colorize};

use shark_core::errors::Severity;

use crate::schema::{ScanReport, ValidationReport};

fn symbol(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✗",
        Severity::Warning => "⚠",
        Severity::Info => "·",
    }
}

fn colorize(text: &str, color: Color, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        text.color(color).to_string()
    }
}

pub fn render_scan_report(report: &ScanReport, no_color: bool) -> String {
    let mut out = String::new();

    let status_line = match report.status {
        crate::schema::ReportStatus::Success => colorize("✓ sync succeeded", Color::Green, no_color),
        crate::schema::ReportStatus::Failure => colorize("✗ sync failed", Color::Red, no_color),
        crate::schema::ReportStatus::Cancelled => colorize("⚠ sync cancelled", Color::Yellow, no_color),
    };
    let _ = writeln!(out, "{status_line}");
    let _ = writeln!(
        out,
        "{} {} ({:.2}s){}",
        report.metadata.timestamp.to_rfc3339(),
        report.metadata.documentation_root.display(),
        report.metadata.duration_seconds,
        if report.dry_run { " [dry-run]" } else { "" }
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "summary:");
    let _ = writeln!(out, "  scanned   {}", report.counts.scanned);
    let _ = writeln!(out, "  matched   {}", report.counts.matched);
    let _ = writeln!(out, "  skipped   {}", report.counts.skipped);
    let _ = writeln!(out, "  imported  {}", report.summary.imported);
    let _ = writeln!(out, "  updated   {}", report.summary.updated);
    let _ = writeln!(out, "  errors    {}", report.summary.errors);
    let _ = writeln!(out, "  warnings  {}", report.summary.warnings);
    let _ = writeln!(out);

    let _ = writeln!(out, "by kind:");
    for (label, counts) in [
        ("epics", &report.entities.epics),
        ("features", &report.entities.features),
        ("tasks", &report.entities.tasks),
    ] {
        let _ = writeln!(
            out,
            "  {:<9} matched={} skipped={} imported={} updated={}",
            label, counts.matched, counts.skipped, counts.imported, counts.updated
        );
    }
    let _ = writeln!(
        out,
        "  {:<9} linked={} skipped={}",
        "docs", report.entities.related_docs.linked, report.entities.related_docs.skipped
    );

    if !report.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "errors:");
        render_grouped(&mut out, &report.errors, no_color);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "warnings:");
        render_grouped(&mut out, &report.warnings, no_color);
    }

    out
}

pub fn render_validation_report(report: &ValidationReport, no_color: bool) -> String {
    let mut out = String::new();

    let status_line = match report.status {
        crate::schema::ReportStatus::Success => colorize("✓ validation clean", Color::Green, no_color),
        crate::schema::ReportStatus::Failure => colorize("✗ validation found issues", Color::Red, no_color),
        crate::schema::ReportStatus::Cancelled => colorize("⚠ validation cancelled", Color::Yellow, no_color),
    };
    let _ = writeln!(out, "{status_line}");
    let _ = writeln!(out, "{} ({:.2}s)", report.metadata.timestamp.to_rfc3339(), report.metadata.duration_seconds);
    let _ = writeln!(out);

    let _ = writeln!(out, "checks:");
    let _ = writeln!(out, "  file_path_existence       {}", report.validation_checks.file_path_existence);
    let _ = writeln!(out, "  relationship_integrity    {}", report.validation_checks.relationship_integrity);
    let _ = writeln!(out, "  document_link_integrity   {}", report.validation_checks.document_link_integrity);

    if !report.failures.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "failures:");
        render_grouped(&mut out, &report.failures, no_color);
    }

    out
}

/// Groups details by `error_type`, first occurrence of each kind showing
/// its suggested fix, later occurrences of the same kind showing only the
/// file and line.
fn render_grouped(out: &mut String, details: &[shark_core::errors::ErrorDetail], no_color: bool) {
    use std::collections::HashSet;
    let mut seen = HashSet::new();
    let mut last_kind = None;
    for detail in details {
        if last_kind != Some(detail.error_type) {
            if last_kind.is_some() {
                let _ = writeln!(out);
            }
            last_kind = Some(detail.error_type);
        }
        let sym = colorize(
            symbol(detail.severity),
            match detail.severity {
                Severity::Error => Color::Red,
                Severity::Warning => Color::Yellow,
                Severity::Info => Color::BrightBlack,
            },
            no_color,
        );
        if seen.insert(detail.error_type) {
            let line = detail.line_number.map(|n| format!(":{n}")).unwrap_or_default();
            let _ = writeln!(out, "  {sym} [{}] {}{}: {}", detail.error_type.as_str(), detail.file_path, line, detail.message);
            let _ = writeln!(out, "      fix: {}", detail.suggested_fix);
        } else {
            let line = detail.line_number.map(|n| format!(":{n}")).unwrap_or_default();
            let _ = writeln!(out, "  {sym} {}{}", detail.file_path, line);
        }
    }
}
