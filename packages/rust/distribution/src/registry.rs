//! Dataset-registry (Hugging Face Hub) upload client.
//!
//! Only the processed JSONL artifact is published. A missing token is a
//! credential error at construction: unlike remote storage, the registry
//! has no per-folder opt-out, so a configured repo with no token is a
//! misconfiguration.

use std::path::Path;
use std::time::Duration;

use base64::Engine as _;
use tracing::info;

use energydocs_shared::{EnergyDocsError, Result};

const REGISTRY_BASE: &str = "https://huggingface.co";
const UPLOAD_TIMEOUT_SECS: u64 = 120;

const USER_AGENT: &str = concat!("energydocs/", env!("CARGO_PKG_VERSION"));

/// Client bound to one dataset repository.
pub struct RegistryClient {
    client: reqwest::Client,
    base: String,
    repo: String,
    token: String,
}

impl RegistryClient {
    /// Build a client for `repo`, taking the explicit token or falling back
    /// to the locally persisted hub token.
    pub fn new(repo: &str, token: Option<&str>) -> Result<Self> {
        let token = match token {
            Some(token) => token.to_string(),
            None => persisted_token().ok_or_else(|| {
                EnergyDocsError::credentials(
                    "no dataset-registry token: set HF_API_TOKEN or log in to the hub CLI",
                )
            })?,
        };
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| EnergyDocsError::Network(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base: REGISTRY_BASE.to_string(),
            repo: repo.to_string(),
            token,
        })
    }

    #[cfg(test)]
    fn with_base(mut self, base: &str) -> Self {
        self.base = base.to_string();
        self
    }

    /// Commit one file to the repository's main branch and return its
    /// browse URL.
    pub async fn upload_file(&self, file: &Path, repo_path: &str) -> Result<String> {
        let bytes = std::fs::read(file).map_err(|e| EnergyDocsError::io(file, e))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        // The commit endpoint takes newline-delimited JSON: a header
        // operation followed by one operation per file.
        let header = serde_json::json!({
            "key": "header",
            "value": {
                "summary": format!("Add {repo_path}"),
                "description": "",
            }
        });
        let file_op = serde_json::json!({
            "key": "file",
            "value": {
                "path": repo_path,
                "content": encoded,
                "encoding": "base64",
            }
        });
        let body = format!("{header}\n{file_op}\n");

        let url = format!("{}/api/datasets/{}/commit/main", self.base, self.repo);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| EnergyDocsError::Network(format!("registry commit: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EnergyDocsError::Upload(format!(
                "registry rejected {repo_path} with HTTP {status}: {text}"
            )));
        }

        let link = self.file_url(repo_path);
        info!(repo = %self.repo, path = repo_path, link = %link, "published to dataset registry");
        Ok(link)
    }

    /// Browse URL for a file on the main branch.
    pub fn file_url(&self, repo_path: &str) -> String {
        format!(
            "https://huggingface.co/datasets/{}/blob/main/{repo_path}",
            self.repo
        )
    }
}

/// Token persisted by the hub CLI, if any.
fn persisted_token() -> Option<String> {
    let home = dirs::home_dir()?;
    for candidate in [
        home.join(".cache/huggingface/token"),
        home.join(".huggingface/token"),
    ] {
        if let Ok(token) = std::fs::read_to_string(&candidate) {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_file(content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("energydocs-registry-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("energy_docs_processed_x.jsonl");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn explicit_token_wins() {
        let client = RegistryClient::new("acme/thai-energy", Some("hf_explicit")).expect("client");
        assert_eq!(client.token, "hf_explicit");
        assert_eq!(client.repo, "acme/thai-energy");
    }

    #[test]
    fn file_url_points_at_the_main_branch() {
        let client = RegistryClient::new("acme/thai-energy", Some("hf_x")).expect("client");
        assert_eq!(
            client.file_url("data/processed.jsonl"),
            "https://huggingface.co/datasets/acme/thai-energy/blob/main/data/processed.jsonl"
        );
    }

    #[tokio::test]
    async fn upload_commits_ndjson_with_base64_content() {
        let server = MockServer::start().await;
        let content = "{\"title\":\"แผนพลังงาน\"}\n";
        let encoded = base64::engine::general_purpose::STANDARD.encode(content.as_bytes());

        Mock::given(method("POST"))
            .and(path("/api/datasets/acme/thai-energy/commit/main"))
            .and(header("Authorization", "Bearer hf_test"))
            .and(header("Content-Type", "application/x-ndjson"))
            .and(body_string_contains("\"key\":\"header\""))
            .and(body_string_contains("\"path\":\"data/run.jsonl\""))
            .and(body_string_contains(&encoded))
            .and(body_string_contains("\"encoding\":\"base64\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "commitUrl": "https://huggingface.co/datasets/acme/thai-energy/commit/abc"
            })))
            .mount(&server)
            .await;

        let client = RegistryClient::new("acme/thai-energy", Some("hf_test"))
            .expect("client")
            .with_base(&server.uri());
        let file = temp_file(content);
        let link = client.upload_file(&file, "data/run.jsonl").await.expect("upload");
        assert_eq!(
            link,
            "https://huggingface.co/datasets/acme/thai-energy/blob/main/data/run.jsonl"
        );
    }

    #[tokio::test]
    async fn rejected_commit_is_an_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/datasets/acme/thai-energy/commit/main"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
            .mount(&server)
            .await;

        let client = RegistryClient::new("acme/thai-energy", Some("hf_bad"))
            .expect("client")
            .with_base(&server.uri());
        let file = temp_file("{}\n");
        let err = client.upload_file(&file, "data/run.jsonl").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid token"));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let client = RegistryClient::new("acme/thai-energy", Some("hf_x")).expect("client");
        let err = client
            .upload_file(Path::new("/nonexistent/run.jsonl"), "data/run.jsonl")
            .await
            .unwrap_err();
        assert!(matches!(err, EnergyDocsError::Io { .. }));
    }
}
