//! PDPA screening for harvested documents.
//!
//! Records are screened field-by-field against a small set of suspect
//! patterns (Thai national ID shape, phone-number shape, email shape).
//! Policy is record-level: one flagged field excludes the whole record and
//! produces a compliance note; no partial redaction is ever applied. The
//! patterns are deliberately blunt and will false-positive on benign
//! numeric strings; that is the documented screening posture, not a bug to
//! strengthen here.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, info};

use energydocs_shared::types::COMPLIANCE_ACTION_EXCLUDED;
use energydocs_shared::{ComplianceNote, DocumentRecord};

static SUSPECT_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // Thai national ID shape.
        Regex::new(r"\b\d{13}\b").expect("valid regex"),
        // Phone-number shape.
        Regex::new(r"\b\d{10}\b").expect("valid regex"),
        // Email-address shape.
        Regex::new(r"\b[\w.\-]+@[\w.\-]+\.[A-Za-z]{2,}\b").expect("valid regex"),
    ]
});

/// Whether a single field value matches any suspect pattern.
/// Empty values never flag.
pub fn flags_personal_data(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    SUSPECT_PATTERNS.iter().any(|pattern| pattern.is_match(value))
}

/// Partition records into a sanitized subset and compliance notes.
///
/// Every input record lands in exactly one output: either it passes through
/// untouched, or it is excluded and one note records which fields flagged,
/// in order of appearance.
pub fn sanitize_documents(
    records: &[DocumentRecord],
) -> (Vec<DocumentRecord>, Vec<ComplianceNote>) {
    let mut sanitized = Vec::with_capacity(records.len());
    let mut notes = Vec::new();

    for record in records {
        let flagged_fields: Vec<String> = record
            .string_fields()
            .iter()
            .filter(|(_, value)| flags_personal_data(value))
            .map(|(name, _)| name.to_string())
            .collect();

        if flagged_fields.is_empty() {
            sanitized.push(record.clone());
        } else {
            debug!(
                record_hash = %record.content_fingerprint,
                fields = ?flagged_fields,
                "record excluded for suspected personal data"
            );
            notes.push(ComplianceNote {
                record_hash: record.content_fingerprint.clone(),
                flagged_fields,
                observed_at: Utc::now(),
                action: COMPLIANCE_ACTION_EXCLUDED.into(),
            });
        }
    }

    info!(
        input = records.len(),
        sanitized = sanitized.len(),
        excluded = notes.len(),
        "sanitization complete"
    );

    (sanitized, notes)
}
