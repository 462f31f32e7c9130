//! Document type and priority heuristics.
//!
//! Classification is an ordered rule list over the cleaned anchor text:
//! the first rule whose keyword matches wins, and `Document` is the
//! fallback. Priority comes from signal phrases first, then from the type.

use energydocs_shared::{DocumentType, Priority};

/// Ordered classification rules. Order matters: a title like
/// "นโยบายและแผนพลังงาน" matches both Policy and Plan, and Policy wins.
const TYPE_RULES: &[(&[&str], DocumentType)] = &[
    (&["นโยบาย", "policy"], DocumentType::Policy),
    (&["แผน", "plan", "ยุทธศาสตร์"], DocumentType::Plan),
    (&["กฎ", "ระเบียบ", "กฎหมาย", "regulation"], DocumentType::Regulation),
    (&["มาตรฐาน", "standard", "เทคนิค"], DocumentType::Standard),
    (&["รายงาน", "report"], DocumentType::Report),
    (&["สถิติ", "statistic"], DocumentType::Statistics),
];

/// Phrases that force High priority regardless of type.
const HIGH_SIGNAL: &[&str] = &["แผนแม่บท", "นโยบายหลัก", "ยุทธศาสตร์หลัก", "มาตรฐานหลัก"];

/// Phrases that force Medium priority regardless of type.
const MEDIUM_SIGNAL: &[&str] = &["รายงานประจำปี", "แผนปฏิบัติ", "ระเบียบปฏิบัติ"];

/// Classify a document by its cleaned title. First matching rule wins.
pub fn classify_document_type(title: &str) -> DocumentType {
    let lower = title.to_lowercase();
    for (keywords, doc_type) in TYPE_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *doc_type;
        }
    }
    DocumentType::Document
}

/// Assign priority from signal phrases, falling back to the document type.
pub fn assign_priority(title: &str, doc_type: DocumentType) -> Priority {
    let lower = title.to_lowercase();
    if HIGH_SIGNAL.iter().any(|kw| lower.contains(kw)) {
        return Priority::High;
    }
    if MEDIUM_SIGNAL.iter().any(|kw| lower.contains(kw)) {
        return Priority::Medium;
    }
    match doc_type {
        DocumentType::Policy | DocumentType::Plan | DocumentType::Regulation => Priority::High,
        DocumentType::Standard | DocumentType::Report => Priority::Medium,
        _ => Priority::Low,
    }
}
