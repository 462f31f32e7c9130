//! Remote-storage (Google Drive) upload client.
//!
//! The client is a no-op when credentials or folder ids are absent:
//! uploads then return `Ok(None)` and the pipeline carries null links in
//! the run summary. Misconfiguration (a partial credential set) fails at
//! connect time instead.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use energydocs_shared::{EnergyDocsError, PipelineConfig, Result};

use crate::credentials::{self, AccessToken, GOOGLE_TOKEN_URI};

const DRIVE_API_BASE: &str = "https://www.googleapis.com";
const UPLOAD_TIMEOUT_SECS: u64 = 120;
const MULTIPART_BOUNDARY: &str = "energydocs_upload_boundary";

const USER_AGENT: &str = concat!("energydocs/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "webViewLink")]
    web_view_link: String,
}

/// Authenticated upload client. `token` is `None` when remote storage is
/// intentionally unconfigured.
pub struct DriveClient {
    client: reqwest::Client,
    token: Option<AccessToken>,
    api_base: String,
}

impl DriveClient {
    /// Resolve credentials and build a client.
    ///
    /// An empty credential chain yields a connected-but-disabled client;
    /// a broken chain (partial OAuth triple, unusable key file) is an error.
    pub async fn connect(config: &PipelineConfig) -> Result<Self> {
        Self::connect_with_endpoints(config, DRIVE_API_BASE, GOOGLE_TOKEN_URI).await
    }

    async fn connect_with_endpoints(
        config: &PipelineConfig,
        api_base: &str,
        token_uri: &str,
    ) -> Result<Self> {
        let client = http_client()?;
        let chain = credentials::build_chain(config)?;
        let token = credentials::resolve_chain(&client, &chain, token_uri).await?;
        if token.is_none() {
            info!("remote storage unconfigured, uploads will be skipped");
        }
        Ok(Self {
            client,
            token,
            api_base: api_base.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Upload one file into a folder and return its view link.
    ///
    /// Returns `Ok(None)` without touching the network when the client has
    /// no token or no folder id was configured for this artifact.
    pub async fn upload(&self, file: &Path, folder_id: Option<&str>) -> Result<Option<String>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };
        let Some(folder_id) = folder_id else {
            debug!(file = %file.display(), "no folder id configured, skipping upload");
            return Ok(None);
        };

        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                EnergyDocsError::validation(format!("upload path {} has no file name", file.display()))
            })?;
        let bytes = std::fs::read(file).map_err(|e| EnergyDocsError::io(file, e))?;

        let metadata = serde_json::json!({
            "name": file_name,
            "parents": [folder_id],
        });
        let body = multipart_related(&metadata.to_string(), &bytes);

        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart&fields=id,webViewLink",
            self.api_base
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&token.0)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| EnergyDocsError::Network(format!("drive upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnergyDocsError::Upload(format!(
                "drive rejected {file_name} with HTTP {status}: {text}"
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| EnergyDocsError::Upload(format!("drive response unparseable: {e}")))?;
        info!(file = file_name, link = %parsed.web_view_link, "uploaded to remote storage");
        Ok(Some(parsed.web_view_link))
    }
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
        .build()
        .map_err(|e| EnergyDocsError::Network(format!("http client: {e}")))
}

/// Build a `multipart/related` body: a JSON metadata part followed by the
/// raw file bytes.
fn multipart_related(metadata: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{MULTIPART_BOUNDARY}\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}
