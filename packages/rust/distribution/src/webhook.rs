//! Training-trigger webhook.
//!
//! Fires once per run, after the processed artifact has been published.
//! The payload starts from the configured JSON template; `dataset_repo` and
//! `processed_file` are merged in only when the template does not already
//! set them, so operators can pin either value.

use std::time::Duration;

use tracing::info;

use energydocs_shared::{EnergyDocsError, Result, WebhookSettings};

/// Response body kept in the run summary is capped at this many characters
/// when the endpoint returns non-JSON.
const TEXT_SNIPPET_LIMIT: usize = 500;

/// Invoke the training webhook and return the endpoint's response.
///
/// A non-success status is an error; callers decide whether that fails the
/// run. Non-JSON success bodies degrade to `{"status": ..., "text": ...}`.
pub async fn trigger_training(
    client: &reqwest::Client,
    settings: &WebhookSettings,
    token: Option<&str>,
    dataset_repo: &str,
    processed_file: &str,
) -> Result<serde_json::Value> {
    let payload = build_payload(settings, dataset_repo, processed_file)?;

    let method = reqwest::Method::from_bytes(settings.method.to_uppercase().as_bytes())
        .map_err(|_| {
            EnergyDocsError::config(format!("invalid webhook method '{}'", settings.method))
        })?;

    let mut request = client
        .request(method, &settings.url)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .json(&payload);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("training webhook: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(EnergyDocsError::Upload(format!(
            "training webhook returned HTTP {status}: {text}"
        )));
    }

    let text = response
        .text()
        .await
        .map_err(|e| EnergyDocsError::Network(format!("training webhook body: {e}")))?;
    let body = match serde_json::from_str(&text) {
        Ok(json) => json,
        Err(_) => serde_json::json!({
            "status": status.as_u16(),
            "text": text.chars().take(TEXT_SNIPPET_LIMIT).collect::<String>(),
        }),
    };

    info!(url = %settings.url, %status, "training webhook triggered");
    Ok(body)
}

fn build_payload(
    settings: &WebhookSettings,
    dataset_repo: &str,
    processed_file: &str,
) -> Result<serde_json::Value> {
    let mut payload = match &settings.payload_template {
        Some(template) => {
            let value: serde_json::Value = serde_json::from_str(template).map_err(|e| {
                EnergyDocsError::config(format!("webhook payload template is not valid JSON: {e}"))
            })?;
            match value {
                serde_json::Value::Object(map) => map,
                other => {
                    return Err(EnergyDocsError::config(format!(
                        "webhook payload template must be a JSON object, got {other}"
                    )));
                }
            }
        }
        None => serde_json::Map::new(),
    };

    payload
        .entry("dataset_repo")
        .or_insert_with(|| dataset_repo.into());
    payload
        .entry("processed_file")
        .or_insert_with(|| processed_file.into());

    Ok(serde_json::Value::Object(payload))
}
