//! Artifact persistence: raw JSON, processed JSONL, and the compliance
//! report.
//!
//! Writers are deterministic and side-effect-only; parent directories are
//! created as needed. Once written, a run's artifact set is never updated —
//! the next run produces a fresh timestamped set.

use std::io::Write;
use std::path::Path;

use tracing::info;

use energydocs_shared::{ComplianceNote, DocumentRecord, EnergyDocsError, Result};

/// Sentinel line written when a run produced no compliance notes.
pub const NO_RISK_SENTINEL: &str = "No PDPA risks detected during this run.";

/// Compliance report header row.
pub const REPORT_HEADER: &str = "record_hash,flagged_fields,observed_at,action";

// ---------------------------------------------------------------------------
// File naming
// ---------------------------------------------------------------------------

/// Run timestamp string used in every artifact name (`%Y%m%d-%H%M%S`).
pub fn run_timestamp() -> String {
    chrono::Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

pub fn raw_filename(timestamp: &str) -> String {
    format!("energy_docs_raw_{timestamp}.json")
}

pub fn processed_filename(timestamp: &str) -> String {
    format!("energy_docs_processed_{timestamp}.jsonl")
}

pub fn report_filename(timestamp: &str) -> String {
    format!("pdpa_report_{timestamp}.csv")
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| EnergyDocsError::io(parent, e))?;
    }
    Ok(())
}

/// Write the full document list as one pretty-printed JSON array.
pub fn write_raw(records: &[DocumentRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| EnergyDocsError::validation(format!("raw serialization: {e}")))?;
    std::fs::write(path, json).map_err(|e| EnergyDocsError::io(path, e))?;
    info!(path = %path.display(), records = records.len(), "raw artifact written");
    Ok(())
}

/// Read a raw artifact back. Used by tests and downstream tooling.
pub fn read_raw(path: &Path) -> Result<Vec<DocumentRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| EnergyDocsError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| EnergyDocsError::validation(format!("raw deserialization: {e}")))
}

/// Write the sanitized list one JSON record per line, for streaming
/// consumption downstream.
pub fn write_processed(records: &[DocumentRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut file = std::fs::File::create(path).map_err(|e| EnergyDocsError::io(path, e))?;
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|e| EnergyDocsError::validation(format!("processed serialization: {e}")))?;
        writeln!(file, "{line}").map_err(|e| EnergyDocsError::io(path, e))?;
    }
    info!(path = %path.display(), records = records.len(), "processed artifact written");
    Ok(())
}

/// Render the compliance report: the no-risk sentinel when empty, otherwise
/// a header plus one row per note.
///
/// Unlike the system this replaces, fields are quoted per RFC 4180 when they
/// contain commas, quotes, or newlines — a naive join would corrupt column
/// alignment as soon as a flagged-field list has more than one entry.
pub fn render_compliance_report(notes: &[ComplianceNote]) -> String {
    if notes.is_empty() {
        return NO_RISK_SENTINEL.to_string();
    }

    let mut lines = vec![REPORT_HEADER.to_string()];
    for note in notes {
        let row = [
            csv_escape(&note.record_hash),
            csv_escape(&note.flagged_fields.join(",")),
            csv_escape(&note.observed_at.to_rfc3339()),
            csv_escape(&note.action),
        ];
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Write the rendered compliance report.
pub fn write_compliance_report(notes: &[ComplianceNote], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, render_compliance_report(notes))
        .map_err(|e| EnergyDocsError::io(path, e))?;
    info!(path = %path.display(), notes = notes.len(), "compliance report written");
    Ok(())
}

/// RFC 4180 quoting: wrap in quotes when the field contains a comma, quote,
/// or newline; embedded quotes are doubled.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use energydocs_shared::{DocumentStatus, DocumentType, Priority};

    fn temp_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("energydocs-artifacts-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn thai_record(title: &str) -> DocumentRecord {
        DocumentRecord {
            title: title.into(),
            url: "https://www.egat.co.th/th/docs/1".into(),
            source_organization: "EGAT".into(),
            collection_date: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
            language: "Thai".into(),
            document_type: DocumentType::Plan,
            priority: Priority::High,
            status: DocumentStatus::Collected,
            folder_path: "State_Enterprises/EGAT/".into(),
            content_fingerprint: "cafe".repeat(16),
        }
    }

    fn note(fields: &[&str]) -> ComplianceNote {
        ComplianceNote {
            record_hash: "deadbeef".into(),
            flagged_fields: fields.iter().map(|f| f.to_string()).collect(),
            observed_at: Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap(),
            action: "excluded".into(),
        }
    }

    #[test]
    fn raw_roundtrip_preserves_thai_text() {
        let dir = temp_dir();
        let path = dir.join("deep/nested").join(raw_filename("20260830-120000"));
        let records = vec![
            thai_record("แผนพัฒนากำลังผลิตไฟฟ้าของประเทศ"),
            thai_record("นโยบายอนุรักษ์พลังงาน"),
        ];

        write_raw(&records, &path).expect("write");
        let parsed = read_raw(&path).expect("read");
        assert_eq!(parsed, records);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn processed_is_one_record_per_line() {
        let dir = temp_dir();
        let path = dir.join(processed_filename("20260830-120000"));
        let records = vec![thai_record("ก"), thai_record("ข"), thai_record("ค")];

        write_processed(&records, &path).expect("write");
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for (line, record) in lines.iter().zip(&records) {
            let parsed: DocumentRecord = serde_json::from_str(line).expect("line parses alone");
            assert_eq!(&parsed, record);
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_report_is_the_sentinel_line() {
        assert_eq!(render_compliance_report(&[]), NO_RISK_SENTINEL);
    }

    #[test]
    fn report_has_header_and_one_row_per_note() {
        let notes = vec![note(&["title"]), note(&["url"])];
        let report = render_compliance_report(&notes);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], REPORT_HEADER);
        assert!(lines[1].starts_with("deadbeef,title,"));
        assert!(lines[1].ends_with(",excluded"));
    }

    #[test]
    fn report_quotes_embedded_commas() {
        // Two flagged fields join with a comma; the original system's naive
        // join corrupted the column count here. The quoted form keeps the
        // row at exactly four columns.
        let notes = vec![note(&["title", "url"])];
        let report = render_compliance_report(&notes);
        let row = report.lines().nth(1).unwrap();
        assert!(row.contains("\"title,url\""));

        // Splitting outside quotes yields the four header columns.
        let mut columns = 1;
        let mut in_quotes = false;
        for c in row.chars() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => columns += 1,
                _ => {}
            }
        }
        assert_eq!(columns, 4);
    }

    #[test]
    fn csv_escape_doubles_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn filenames_embed_the_run_timestamp() {
        assert_eq!(raw_filename("20260830-120000"), "energy_docs_raw_20260830-120000.json");
        assert_eq!(
            processed_filename("20260830-120000"),
            "energy_docs_processed_20260830-120000.jsonl"
        );
        assert_eq!(report_filename("20260830-120000"), "pdpa_report_20260830-120000.csv");
        // run_timestamp produces the same shape.
        assert_eq!(run_timestamp().len(), "20260830-120000".len());
    }

    #[test]
    fn compliance_report_writes_to_disk() {
        let dir = temp_dir();
        let path = dir.join(report_filename("20260830-120000"));
        write_compliance_report(&[], &path).expect("write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), NO_RISK_SENTINEL);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
