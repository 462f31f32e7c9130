//! Core domain types for energydocs harvesting runs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Fixed language tag for the corpus.
pub const CORPUS_LANGUAGE: &str = "Thai";

/// Fixed action recorded on every compliance note.
pub const COMPLIANCE_ACTION_EXCLUDED: &str = "excluded";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for harvest-run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Document classification enums
// ---------------------------------------------------------------------------

/// Document category, assigned by ordered keyword rules over the anchor text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    Policy,
    Plan,
    Regulation,
    Standard,
    Report,
    Statistics,
    /// Fallback when no classification rule matches.
    Document,
}

/// Collection priority, from signal phrases or the document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Lifecycle status of a harvested record. Only `Collected` exists today;
/// the enum leaves room for future states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Collected,
}

// ---------------------------------------------------------------------------
// DocumentRecord
// ---------------------------------------------------------------------------

/// One harvested unit: a relevant document link admitted exactly once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Cleaned source-language anchor text.
    pub title: String,
    /// Absolute URL, resolved against the source base.
    pub url: String,
    /// Configured site identifier (EGAT, PEA, ...).
    pub source_organization: String,
    /// Calendar date of capture (UTC).
    pub collection_date: NaiveDate,
    /// Fixed corpus language tag.
    pub language: String,
    /// Classified document category.
    pub document_type: DocumentType,
    /// Assigned collection priority.
    pub priority: Priority,
    /// Lifecycle status.
    pub status: DocumentStatus,
    /// Logical storage path hint derived from the organization.
    pub folder_path: String,
    /// SHA-256 hex digest of the cleaned title text.
    pub content_fingerprint: String,
}

impl DocumentRecord {
    /// The record's string fields in declaration order, paired with their
    /// names. This is the field set the sanitizer screens.
    pub fn string_fields(&self) -> [(&'static str, &str); 6] {
        [
            ("title", &self.title),
            ("url", &self.url),
            ("source_organization", &self.source_organization),
            ("language", &self.language),
            ("folder_path", &self.folder_path),
            ("content_fingerprint", &self.content_fingerprint),
        ]
    }
}

// ---------------------------------------------------------------------------
// ComplianceNote
// ---------------------------------------------------------------------------

/// Audit record produced when a document is excluded for suspected
/// personal data. One note per excluded record, never per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceNote {
    /// The excluded document's content fingerprint.
    pub record_hash: String,
    /// Field names that triggered exclusion, in order of appearance.
    pub flagged_fields: Vec<String>,
    /// When the exclusion was observed.
    pub observed_at: DateTime<Utc>,
    /// Always [`COMPLIANCE_ACTION_EXCLUDED`].
    pub action: String,
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Terminal state of a pipeline run. Every stage folds its outcome in here
/// regardless of later failures; distribution fields are `None` when a
/// target was unconfigured or unavailable this run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: RunId,
    /// Run timestamp used in artifact file names (`%Y%m%d-%H%M%S`).
    pub timestamp: String,
    pub documents_collected: usize,
    pub documents_sanitized: usize,
    pub documents_excluded: usize,
    pub raw_file: PathBuf,
    pub processed_file: PathBuf,
    pub compliance_report: PathBuf,
    pub drive_raw_link: Option<String>,
    pub drive_processed_link: Option<String>,
    pub drive_report_link: Option<String>,
    pub dataset_link: Option<String>,
    /// Webhook response body, or `{"error": ...}` when the call failed,
    /// or `None` when no webhook is configured.
    pub training_response: Option<serde_json::Value>,
}
