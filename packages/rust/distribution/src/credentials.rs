//! Credential resolution for the remote-storage client.
//!
//! Providers form an ordered chain: service-account key file first, then
//! the OAuth refresh triple. The chain distinguishes three outcomes —
//! intentionally unconfigured (empty chain, no error), misconfigured
//! (partial triple or unusable key file, a [`EnergyDocsError::Credentials`]
//! error), and resolved (a usable access token).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use energydocs_shared::{EnergyDocsError, PipelineConfig, Result};

/// Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Drive scope requested for uploads.
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// A resolved bearer token for the remote-storage API.
#[derive(Clone)]
pub struct AccessToken(pub String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// One credential strategy. Providers are only constructed when their
/// configuration is complete; a constructed provider that fails to produce
/// a token is a misconfiguration, never a silent no-op.
#[derive(Debug, Clone)]
pub enum CredentialProvider {
    /// Service-account key file (JWT bearer grant).
    ServiceAccount { key_file: PathBuf },
    /// OAuth client with a long-lived refresh token.
    OAuthRefresh {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl CredentialProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ServiceAccount { .. } => "service-account",
            Self::OAuthRefresh { .. } => "oauth-refresh",
        }
    }

    /// Produce an access token, exchanging at `token_uri`.
    pub async fn resolve(
        &self,
        client: &reqwest::Client,
        token_uri: &str,
    ) -> Result<AccessToken> {
        match self {
            Self::ServiceAccount { key_file } => {
                resolve_service_account(client, key_file, token_uri).await
            }
            Self::OAuthRefresh {
                client_id,
                client_secret,
                refresh_token,
            } => resolve_oauth_refresh(client, client_id, client_secret, refresh_token, token_uri)
                .await,
        }
    }
}

/// Build the provider chain from configuration.
///
/// Empty output means remote storage is intentionally unconfigured. A
/// partial OAuth triple is a credential error here, before any network
/// traffic happens.
pub fn build_chain(config: &PipelineConfig) -> Result<Vec<CredentialProvider>> {
    let mut chain = Vec::new();

    if let Some(key_file) = &config.service_account_file {
        chain.push(CredentialProvider::ServiceAccount {
            key_file: key_file.clone(),
        });
    }

    match (
        &config.oauth_client_id,
        &config.oauth_client_secret,
        &config.oauth_refresh_token,
    ) {
        (Some(client_id), Some(client_secret), Some(refresh_token)) => {
            chain.push(CredentialProvider::OAuthRefresh {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
            });
        }
        (None, None, None) => {}
        (client_id, client_secret, refresh_token) => {
            let missing: Vec<&str> = [
                ("GOOGLE_CLIENT_ID", client_id.is_none()),
                ("GOOGLE_CLIENT_SECRET", client_secret.is_none()),
                ("GOOGLE_REFRESH_TOKEN", refresh_token.is_none()),
            ]
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| *name)
            .collect();
            return Err(EnergyDocsError::credentials(format!(
                "incomplete OAuth credentials: missing {}",
                missing.join(", ")
            )));
        }
    }

    Ok(chain)
}

/// Try providers in order and stop at the first success. `Ok(None)` only
/// when the chain is empty.
pub async fn resolve_chain(
    client: &reqwest::Client,
    chain: &[CredentialProvider],
    token_uri: &str,
) -> Result<Option<AccessToken>> {
    for provider in chain {
        debug!(provider = provider.name(), "resolving credentials");
        let token = provider.resolve(client, token_uri).await?;
        info!(provider = provider.name(), "remote-storage credentials resolved");
        return Ok(Some(token));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Service-account grant
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

async fn resolve_service_account(
    client: &reqwest::Client,
    key_file: &Path,
    token_uri: &str,
) -> Result<AccessToken> {
    let raw = std::fs::read_to_string(key_file).map_err(|e| {
        EnergyDocsError::credentials(format!(
            "service-account file {} is unreadable: {e}",
            key_file.display()
        ))
    })?;
    let key: ServiceAccountKey = serde_json::from_str(&raw).map_err(|e| {
        EnergyDocsError::credentials(format!(
            "service-account file {} is not a valid key file: {e}",
            key_file.display()
        ))
    })?;

    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        iss: &key.client_email,
        scope: DRIVE_SCOPE,
        aud: token_uri,
        iat: now,
        exp: now + 3600,
    };

    let encoding_key =
        jsonwebtoken::EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            EnergyDocsError::credentials(format!("service-account private key is unusable: {e}"))
        })?;
    let assertion = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
        &claims,
        &encoding_key,
    )
    .map_err(|e| EnergyDocsError::credentials(format!("failed to sign JWT assertion: {e}")))?;

    let response = client
        .post(token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("token exchange: {e}")))?;

    parse_token_response(response).await
}

// ---------------------------------------------------------------------------
// OAuth refresh grant
// ---------------------------------------------------------------------------

async fn resolve_oauth_refresh(
    client: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
    token_uri: &str,
) -> Result<AccessToken> {
    let response = client
        .post(token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("token refresh: {e}")))?;

    parse_token_response(response).await
}

async fn parse_token_response(response: reqwest::Response) -> Result<AccessToken> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EnergyDocsError::credentials(format!(
            "token endpoint returned HTTP {status}: {body}"
        )));
    }
    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| EnergyDocsError::credentials(format!("token response unparseable: {e}")))?;
    Ok(AccessToken(token.access_token))
}
