//! End-to-end harvest pipeline: crawl → screen → persist → distribute.
//!
//! The local artifact set (raw JSON, processed JSONL, compliance CSV) is
//! the run's source of truth and is written before any network
//! distribution. Distribution is best-effort: every remote failure is
//! logged and folded into the summary as an absent link, never an abort.

use std::path::Path;
use std::sync::atomic::AtomicBool;

use tracing::{info, instrument, warn};

use energydocs_artifacts as artifacts;
use energydocs_crawler::{Crawler, SourceSite};
use energydocs_distribution::{DriveClient, RegistryClient, webhook};
use energydocs_sanitizer::sanitize_documents;
use energydocs_shared::{EnergyDocsError, PipelineConfig, Result, RunSummary};
use energydocs_shared::types::RunId;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the harvest finishes.
    fn harvested(&self, documents: usize, pages_visited: usize, pages_failed: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn harvested(&self, _documents: usize, _pages_visited: usize, _pages_failed: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full pipeline over `sources`.
///
/// `shutdown` interrupts the harvest between fetches; the stages after it
/// still run, so an interrupted run flushes whatever was collected.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn run_pipeline(
    config: &PipelineConfig,
    sources: &[SourceSite],
    shutdown: &AtomicBool,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let run_id = RunId::new();
    let timestamp = artifacts::run_timestamp();
    info!(%run_id, timestamp, timezone = %config.timezone, "pipeline run starting");

    config.ensure_output_dirs()?;

    // Harvest.
    progress.phase("harvest");
    let crawler = Crawler::new(config.crawl.clone())?;
    let harvest = crawler.harvest(sources, shutdown).await?;
    progress.harvested(
        harvest.documents.len(),
        harvest.pages_visited,
        harvest.pages_failed,
    );

    // Persist raw before screening: the raw artifact is the audit trail of
    // everything collected, personal data included.
    progress.phase("persist-raw");
    let raw_file = config.raw_output_dir.join(artifacts::raw_filename(&timestamp));
    artifacts::write_raw(&harvest.documents, &raw_file)?;

    // Screen and persist processed + compliance.
    progress.phase("screen");
    let (sanitized, notes) = sanitize_documents(&harvest.documents);

    progress.phase("persist-processed");
    let processed_file = config
        .processed_output_dir
        .join(artifacts::processed_filename(&timestamp));
    artifacts::write_processed(&sanitized, &processed_file)?;

    let compliance_report = config
        .compliance_output_dir
        .join(artifacts::report_filename(&timestamp));
    artifacts::write_compliance_report(&notes, &compliance_report)?;

    let mut summary = RunSummary {
        run_id,
        timestamp,
        documents_collected: harvest.documents.len(),
        documents_sanitized: sanitized.len(),
        documents_excluded: notes.len(),
        raw_file,
        processed_file,
        compliance_report,
        drive_raw_link: None,
        drive_processed_link: None,
        drive_report_link: None,
        dataset_link: None,
        training_response: None,
    };

    progress.phase("distribute");
    distribute(config, &mut summary).await;

    info!(
        run_id = %summary.run_id,
        collected = summary.documents_collected,
        sanitized = summary.documents_sanitized,
        excluded = summary.documents_excluded,
        "pipeline run complete"
    );
    progress.done(&summary);
    Ok(summary)
}

/// Best-effort distribution: remote storage, dataset registry, then the
/// training webhook. Failures degrade each target independently.
async fn distribute(config: &PipelineConfig, summary: &mut RunSummary) {
    match DriveClient::connect(config).await {
        Ok(drive) => {
            summary.drive_raw_link = try_upload(
                &drive,
                &summary.raw_file,
                config.drive_raw_folder_id.as_deref(),
            )
            .await;
            summary.drive_processed_link = try_upload(
                &drive,
                &summary.processed_file,
                config.drive_processed_folder_id.as_deref(),
            )
            .await;
            summary.drive_report_link = try_upload(
                &drive,
                &summary.compliance_report,
                config.drive_compliance_folder_id.as_deref(),
            )
            .await;
        }
        Err(e) => warn!(error = %e, "remote storage unavailable, skipping uploads"),
    }

    summary.dataset_link = publish_dataset(config, &summary.processed_file).await;

    if let Some(settings) = &config.training_webhook {
        let processed_name = file_name(&summary.processed_file);
        let response = match webhook_client() {
            Ok(client) => {
                webhook::trigger_training(
                    &client,
                    settings,
                    config.dataset_token.as_deref(),
                    &config.dataset_repo,
                    &processed_name,
                )
                .await
            }
            Err(e) => Err(e),
        };
        summary.training_response = Some(match response {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "training webhook failed");
                serde_json::json!({"error": e.to_string()})
            }
        });
    }
}

async fn try_upload(
    drive: &DriveClient,
    file: &Path,
    folder_id: Option<&str>,
) -> Option<String> {
    match drive.upload(file, folder_id).await {
        Ok(link) => link,
        Err(e) => {
            warn!(file = %file.display(), error = %e, "remote storage upload failed");
            None
        }
    }
}

async fn publish_dataset(config: &PipelineConfig, processed_file: &Path) -> Option<String> {
    let registry = match RegistryClient::new(&config.dataset_repo, config.dataset_token.as_deref())
    {
        Ok(registry) => registry,
        Err(e) => {
            warn!(error = %e, "dataset registry unavailable, skipping publish");
            return None;
        }
    };
    let repo_path = format!("data/{}", file_name(processed_file));
    match registry.upload_file(processed_file, &repo_path).await {
        Ok(link) => Some(link),
        Err(e) => {
            warn!(error = %e, "dataset publish failed");
            None
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn webhook_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("energydocs/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EnergyDocsError::Network(format!("http client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use energydocs_shared::WebhookSettings;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_config() -> (PipelineConfig, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("energydocs-pipeline-{}", uuid::Uuid::now_v7()));
        let map = HashMap::from([
            ("ENERGYDOCS_RAW_DIR", dir.join("raw").to_str().unwrap().to_string()),
            (
                "ENERGYDOCS_PROCESSED_DIR",
                dir.join("processed").to_str().unwrap().to_string(),
            ),
            ("ENERGYDOCS_COMPLIANCE_DIR", dir.join("pdpa").to_str().unwrap().to_string()),
            ("ENERGYDOCS_RATE_LIMIT_MS", "0".to_string()),
        ]);
        let mut config =
            PipelineConfig::from_lookup(|key| map.get(key).cloned()).expect("config");
        // Keep distribution fully unconfigured regardless of the host.
        config.service_account_file = None;
        config.dataset_token = None;
        (config, dir)
    }

    fn source_page() -> &'static str {
        r#"<html><body>
            <a href="/docs/plan.pdf">แผนพัฒนากำลังผลิตไฟฟ้าของประเทศ</a>
            <a href="/docs/contact.pdf">ติดต่อ 0812345678 เรื่องพลังงาน</a>
            <a href="/about">เกี่ยวกับเรา</a>
        </body></html>"#
    }

    async fn mock_source(server: &MockServer) -> SourceSite {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(source_page()))
            .mount(server)
            .await;
        SourceSite::new(
            "EGAT",
            &server.uri(),
            &format!("{}/", server.uri()),
            &["พลังงาน", "แผน"],
            "State_Enterprises/EGAT/",
        )
    }

    #[tokio::test]
    async fn run_without_distribution_writes_all_three_artifacts() {
        let server = MockServer::start().await;
        let source = mock_source(&server).await;
        let (config, dir) = temp_config();

        let shutdown = AtomicBool::new(false);
        let summary = run_pipeline(&config, &[source], &shutdown, &SilentProgress)
            .await
            .expect("pipeline");

        // One clean document, one excluded for the phone-shaped digit run.
        assert_eq!(summary.documents_collected, 2);
        assert_eq!(summary.documents_sanitized, 1);
        assert_eq!(summary.documents_excluded, 1);

        assert!(summary.raw_file.exists());
        assert!(summary.processed_file.exists());
        assert!(summary.compliance_report.exists());

        let raw = artifacts::read_raw(&summary.raw_file).expect("raw parses");
        assert_eq!(raw.len(), 2);
        let processed = std::fs::read_to_string(&summary.processed_file).unwrap();
        assert_eq!(processed.lines().count(), 1);
        let report = std::fs::read_to_string(&summary.compliance_report).unwrap();
        assert!(report.starts_with(artifacts::REPORT_HEADER));

        // Unconfigured targets leave every link absent.
        assert!(summary.drive_raw_link.is_none());
        assert!(summary.drive_processed_link.is_none());
        assert!(summary.drive_report_link.is_none());
        assert!(summary.dataset_link.is_none());
        assert!(summary.training_response.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn webhook_fires_with_the_processed_file_name() {
        let server = MockServer::start().await;
        let source = mock_source(&server).await;
        Mock::given(method("POST"))
            .and(path("/train"))
            .and(body_string_contains("energy_docs_processed_"))
            .and(body_string_contains("jackyanghxc/peallm-poc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"job": "queued"})),
            )
            .mount(&server)
            .await;

        let (mut config, dir) = temp_config();
        config.training_webhook = Some(WebhookSettings {
            url: format!("{}/train", server.uri()),
            method: "POST".into(),
            payload_template: None,
            timeout_secs: 5,
        });

        let shutdown = AtomicBool::new(false);
        let summary = run_pipeline(&config, &[source], &shutdown, &SilentProgress)
            .await
            .expect("pipeline");
        assert_eq!(
            summary.training_response,
            Some(serde_json::json!({"job": "queued"}))
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn webhook_failure_is_folded_into_the_summary() {
        let server = MockServer::start().await;
        let source = mock_source(&server).await;
        Mock::given(method("POST"))
            .and(path("/train"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let (mut config, dir) = temp_config();
        config.training_webhook = Some(WebhookSettings {
            url: format!("{}/train", server.uri()),
            method: "POST".into(),
            payload_template: None,
            timeout_secs: 5,
        });

        let shutdown = AtomicBool::new(false);
        let summary = run_pipeline(&config, &[source], &shutdown, &SilentProgress)
            .await
            .expect("pipeline survives webhook failure");
        let response = summary.training_response.expect("error folded in");
        assert!(response["error"].as_str().unwrap().contains("500"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn partial_oauth_degrades_to_a_local_only_run() {
        let server = MockServer::start().await;
        let source = mock_source(&server).await;
        let (mut config, dir) = temp_config();
        // A lone client id is a misconfiguration; the run must still
        // complete with local artifacts and no remote links.
        config.oauth_client_id = Some("client-id".into());

        let shutdown = AtomicBool::new(false);
        let summary = run_pipeline(&config, &[source], &shutdown, &SilentProgress)
            .await
            .expect("pipeline survives credential misconfiguration");

        assert!(summary.raw_file.exists());
        assert!(summary.processed_file.exists());
        assert!(summary.drive_raw_link.is_none());
        assert!(summary.drive_processed_link.is_none());
        assert!(summary.drive_report_link.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn interrupted_run_still_flushes_artifacts() {
        let server = MockServer::start().await;
        let source = mock_source(&server).await;
        let (config, dir) = temp_config();

        let shutdown = AtomicBool::new(true);
        let summary = run_pipeline(&config, &[source], &shutdown, &SilentProgress)
            .await
            .expect("pipeline");

        // Nothing harvested, but the artifact set exists and is well formed.
        assert_eq!(summary.documents_collected, 0);
        assert!(summary.raw_file.exists());
        assert!(summary.processed_file.exists());
        let report = std::fs::read_to_string(&summary.compliance_report).unwrap();
        assert_eq!(report, artifacts::NO_RISK_SENTINEL);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
