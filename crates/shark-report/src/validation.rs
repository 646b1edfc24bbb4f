//! Builds a `ValidationReport` from a `shark_sync::validator::ValidationOutcome`.
//! The Validator itself is timing-agnostic; the caller supplies the
//! wall-clock duration it measured around the `validate()` call.

use shark_core::errors::ErrorKind;
use shark_sync::validator::ValidationOutcome;

use crate::schema::{ReportStatus, ValidationChecks, ValidationMetadata, ValidationReport};

pub fn build(outcome: &ValidationOutcome, duration_seconds: f64) -> ValidationReport {
    let failures: Vec<_> = outcome.findings.iter().map(|f| f.detail.clone()).collect();

    let mut checks = ValidationChecks::default();
    for finding in &outcome.findings {
        match finding.detail.error_type {
            ErrorKind::BrokenFilePath => checks.file_path_existence += 1,
            ErrorKind::OrphanedFeature | ErrorKind::OrphanedTask => checks.relationship_integrity += 1,
            ErrorKind::BrokenDocumentLink => checks.document_link_integrity += 1,
            _ => {}
        }
    }

    let status = if outcome.is_clean() { ReportStatus::Success } else { ReportStatus::Failure };

    ValidationReport {
        schema_version: crate::schema::SCHEMA_VERSION.to_string(),
        status,
        metadata: ValidationMetadata { timestamp: chrono::Utc::now(), duration_seconds },
        validation_checks: checks,
        summary: crate::schema::ScanSummary {
            imported: 0,
            updated: 0,
            errors: failures.len() as u64,
            warnings: 0,
        },
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shark_core::entities::EntityKind;
    use shark_core::errors::{ErrorDetail, Severity};
    use shark_sync::validator::ValidationFinding;

    #[test]
    fn clean_outcome_is_success() {
        let outcome = ValidationOutcome { findings: Vec::new() };
        let report = build(&outcome, 0.1);
        assert_eq!(report.status, ReportStatus::Success);
        assert_eq!(report.validation_checks.file_path_existence, 0);
    }

    #[test]
    fn broken_file_path_counts_toward_file_path_existence() {
        let outcome = ValidationOutcome {
            findings: vec![ValidationFinding {
                entity_kind: EntityKind::Epic,
                key: "E01".to_string(),
                detail: ErrorDetail::new(
                    Severity::Error,
                    ErrorKind::BrokenFilePath,
                    "docs/plan/E01/epic.md",
                    "missing file",
                    "re-run shark sync",
                ),
            }],
        };
        let report = build(&outcome, 0.1);
        assert_eq!(report.status, ReportStatus::Failure);
        assert_eq!(report.validation_checks.file_path_existence, 1);
        assert_eq!(report.failures.len(), 1);
    }
}
