//! Run configuration for the energydocs pipeline.
//!
//! Everything is environment-sourced. `PipelineConfig::from_env` reads the
//! process environment; tests use [`PipelineConfig::from_lookup`] with an
//! injected key-value map instead.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{EnergyDocsError, Result};

/// Default HTTP timeout for webhook calls, in seconds.
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 60;

/// Default pause between page fetches, matching the original crawler's
/// one-second courtesy delay.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Default per-request timeout for page fetches, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Maximum navigation subpages fetched per source.
pub const SUBPAGE_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// CrawlSettings
// ---------------------------------------------------------------------------

/// Runtime crawl knobs. Concurrency of 1 reproduces the original sequential
/// crawl; the engine accepts any bound because fingerprint admission is
/// atomic.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Pause between requests to the same source, in milliseconds.
    pub rate_limit_ms: u64,
    /// Maximum navigation subpages fetched per source.
    pub subpage_limit: usize,
    /// Maximum concurrent subpage fetches.
    pub concurrency: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            subpage_limit: SUBPAGE_LIMIT,
            concurrency: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookSettings
// ---------------------------------------------------------------------------

/// Training-trigger webhook settings. Present only when a URL is configured;
/// absence disables the trigger stage entirely.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: String,
    /// HTTP method, default POST.
    pub method: String,
    /// Optional JSON object template merged into the posted body.
    pub payload_template: Option<String>,
    pub timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Full run configuration. Credential fields are all optional: absence means
/// the corresponding distribution target is disabled, while partial presence
/// is surfaced as a credential error at client construction, not here.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raw_output_dir: PathBuf,
    pub processed_output_dir: PathBuf,
    pub compliance_output_dir: PathBuf,

    /// Dataset-registry repository id, e.g. `acme/thai-energy-docs`.
    pub dataset_repo: String,
    pub dataset_token: Option<String>,

    pub drive_raw_folder_id: Option<String>,
    pub drive_processed_folder_id: Option<String>,
    pub drive_compliance_folder_id: Option<String>,

    pub service_account_file: Option<PathBuf>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub oauth_refresh_token: Option<String>,

    pub training_webhook: Option<WebhookSettings>,

    /// Timezone tag carried into the run summary.
    pub timezone: String,

    pub crawl: CrawlSettings,
}

impl PipelineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let raw_output_dir =
            PathBuf::from(get("ENERGYDOCS_RAW_DIR").unwrap_or_else(|| "artifacts/raw".into()));
        let processed_output_dir = PathBuf::from(
            get("ENERGYDOCS_PROCESSED_DIR").unwrap_or_else(|| "artifacts/processed".into()),
        );
        let compliance_output_dir = PathBuf::from(
            get("ENERGYDOCS_COMPLIANCE_DIR").unwrap_or_else(|| "artifacts/pdpa".into()),
        );

        // Explicitly configured service-account paths are carried through
        // even when unreadable: the credential chain reports that as a
        // misconfiguration instead of silently degrading. Only the implicit
        // default is gated on existence.
        let service_account_file = match get("GOOGLE_SERVICE_ACCOUNT_FILE") {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let default = Path::new("service-account.json");
                default.exists().then(|| default.to_path_buf())
            }
        };

        let training_webhook = match get("HF_TRAINING_TRIGGER_URL") {
            Some(url) => {
                let timeout_secs = match get("HF_TRAINING_TRIGGER_TIMEOUT") {
                    Some(raw) => raw.parse::<u64>().map_err(|_| {
                        EnergyDocsError::config(format!(
                            "HF_TRAINING_TRIGGER_TIMEOUT must be an integer, got '{raw}'"
                        ))
                    })?,
                    None => DEFAULT_WEBHOOK_TIMEOUT_SECS,
                };
                Some(WebhookSettings {
                    url,
                    method: get("HF_TRAINING_TRIGGER_METHOD").unwrap_or_else(|| "POST".into()),
                    payload_template: get("HF_TRAINING_TRIGGER_PAYLOAD"),
                    timeout_secs,
                })
            }
            None => None,
        };

        let mut crawl = CrawlSettings::default();
        if let Some(raw) = get("ENERGYDOCS_CRAWL_CONCURRENCY") {
            crawl.concurrency = raw.parse::<usize>().map_err(|_| {
                EnergyDocsError::config(format!(
                    "ENERGYDOCS_CRAWL_CONCURRENCY must be an integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(raw) = get("ENERGYDOCS_RATE_LIMIT_MS") {
            crawl.rate_limit_ms = raw.parse::<u64>().map_err(|_| {
                EnergyDocsError::config(format!(
                    "ENERGYDOCS_RATE_LIMIT_MS must be an integer, got '{raw}'"
                ))
            })?;
        }

        Ok(Self {
            raw_output_dir,
            processed_output_dir,
            compliance_output_dir,
            dataset_repo: get("HF_DATASET_REPO_ID")
                .unwrap_or_else(|| "jackyanghxc/peallm-poc".into()),
            dataset_token: get("HF_API_TOKEN"),
            drive_raw_folder_id: get("GOOGLE_DRIVE_RAW_FOLDER_ID"),
            drive_processed_folder_id: get("GOOGLE_DRIVE_PROCESSED_FOLDER_ID"),
            drive_compliance_folder_id: get("GOOGLE_DRIVE_PDPA_FOLDER_ID"),
            service_account_file,
            oauth_client_id: get("GOOGLE_CLIENT_ID"),
            oauth_client_secret: get("GOOGLE_CLIENT_SECRET"),
            oauth_refresh_token: get("GOOGLE_REFRESH_TOKEN"),
            training_webhook,
            timezone: get("ENERGYDOCS_TIMEZONE").unwrap_or_else(|| "Asia/Bangkok".into()),
            crawl,
        })
    }

    /// Load from a map, for tests.
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_lookup(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Create all three output directories, parents included.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        for dir in [
            &self.raw_output_dir,
            &self.processed_output_dir,
            &self.compliance_output_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| EnergyDocsError::io(dir, e))?;
            tracing::debug!(path = %dir.display(), "output directory ready");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = PipelineConfig::from_lookup(|_| None).expect("defaults");
        assert_eq!(config.raw_output_dir, PathBuf::from("artifacts/raw"));
        assert_eq!(config.processed_output_dir, PathBuf::from("artifacts/processed"));
        assert_eq!(config.compliance_output_dir, PathBuf::from("artifacts/pdpa"));
        assert_eq!(config.timezone, "Asia/Bangkok");
        assert!(config.dataset_token.is_none());
        assert!(config.training_webhook.is_none());
        assert_eq!(config.crawl.concurrency, 1);
        assert_eq!(config.crawl.rate_limit_ms, 1000);
        assert_eq!(config.crawl.subpage_limit, 10);
    }

    #[test]
    fn webhook_settings_require_a_url() {
        let map = HashMap::from([
            ("HF_TRAINING_TRIGGER_METHOD", "PUT"),
            ("HF_TRAINING_TRIGGER_TIMEOUT", "30"),
        ]);
        let config = PipelineConfig::from_map(&map).expect("config");
        // Method/timeout without a URL leave the trigger disabled.
        assert!(config.training_webhook.is_none());

        let map = HashMap::from([
            ("HF_TRAINING_TRIGGER_URL", "https://hooks.example.com/train"),
            ("HF_TRAINING_TRIGGER_METHOD", "PUT"),
            ("HF_TRAINING_TRIGGER_TIMEOUT", "30"),
        ]);
        let config = PipelineConfig::from_map(&map).expect("config");
        let webhook = config.training_webhook.expect("webhook configured");
        assert_eq!(webhook.method, "PUT");
        assert_eq!(webhook.timeout_secs, 30);
        assert!(webhook.payload_template.is_none());
    }

    #[test]
    fn webhook_method_defaults_to_post() {
        let map = HashMap::from([("HF_TRAINING_TRIGGER_URL", "https://hooks.example.com/train")]);
        let config = PipelineConfig::from_map(&map).expect("config");
        let webhook = config.training_webhook.expect("webhook configured");
        assert_eq!(webhook.method, "POST");
        assert_eq!(webhook.timeout_secs, 60);
    }

    #[test]
    fn invalid_timeout_is_a_config_error() {
        let map = HashMap::from([
            ("HF_TRAINING_TRIGGER_URL", "https://hooks.example.com/train"),
            ("HF_TRAINING_TRIGGER_TIMEOUT", "soon"),
        ]);
        let err = PipelineConfig::from_map(&map).unwrap_err();
        assert!(err.to_string().contains("HF_TRAINING_TRIGGER_TIMEOUT"));
    }

    #[test]
    fn explicit_service_account_path_is_kept_even_if_missing() {
        let map = HashMap::from([("GOOGLE_SERVICE_ACCOUNT_FILE", "/nonexistent/sa.json")]);
        let config = PipelineConfig::from_map(&map).expect("config");
        assert_eq!(
            config.service_account_file,
            Some(PathBuf::from("/nonexistent/sa.json"))
        );
    }

    #[test]
    fn empty_values_are_treated_as_unset() {
        let map = HashMap::from([("HF_API_TOKEN", ""), ("GOOGLE_CLIENT_ID", "")]);
        let config = PipelineConfig::from_map(&map).expect("config");
        assert!(config.dataset_token.is_none());
        assert!(config.oauth_client_id.is_none());
    }

    #[test]
    fn crawl_overrides_parse() {
        let map = HashMap::from([
            ("ENERGYDOCS_CRAWL_CONCURRENCY", "4"),
            ("ENERGYDOCS_RATE_LIMIT_MS", "0"),
        ]);
        let config = PipelineConfig::from_map(&map).expect("config");
        assert_eq!(config.crawl.concurrency, 4);
        assert_eq!(config.crawl.rate_limit_ms, 0);
    }
}
