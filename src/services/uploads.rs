//! Hosted upload provider proxy (file deletion)
//!
//! The dashboard uploads files directly to the provider; the backend only
//! proxies deletions so the API key never reaches the browser.

use std::sync::OnceLock;
use std::time::Duration;

use tracing::{info, warn};
use ureq::Agent;

use crate::config::get_config;
use crate::errors::{FolioError, Result};

const HTTP_TIMEOUT_SECS: u64 = 10;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

#[derive(Clone)]
pub struct UploadService {
    enabled: bool,
    api_key: String,
    endpoint: String,
}

impl UploadService {
    pub fn from_config() -> Self {
        let config = get_config();
        Self {
            enabled: config.uploads.enabled && !config.uploads.api_key.is_empty(),
            api_key: config.uploads.api_key.clone(),
            endpoint: config.uploads.endpoint.clone(),
        }
    }

    /// Delete files at the provider. Provider failure surfaces as 503.
    pub async fn delete_files(&self, keys: Vec<String>) -> Result<usize> {
        if keys.is_empty() {
            return Err(FolioError::validation("keys must not be empty"));
        }
        if !self.enabled {
            return Err(FolioError::external_service(
                "Upload provider is not configured",
            ));
        }

        let service = self.clone();
        let count = keys.len();

        tokio::task::spawn_blocking(move || service.delete_files_sync(&keys))
            .await
            .map_err(|e| FolioError::internal(format!("upload proxy task failed: {}", e)))??;

        info!("Deleted {} file(s) at upload provider", count);
        Ok(count)
    }

    fn delete_files_sync(&self, keys: &[String]) -> Result<()> {
        let payload = serde_json::json!({ "fileKeys": keys });

        let agent = get_agent();
        agent
            .post(&self.endpoint)
            .header("X-Uploadthing-Api-Key", &self.api_key)
            .send_json(&payload)
            .map_err(|e| {
                warn!("Upload provider request failed: {}", e);
                FolioError::external_service(format!("Upload provider request failed: {}", e))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_keys_rejected() {
        let service = UploadService {
            enabled: true,
            api_key: "test".to_string(),
            endpoint: "http://127.0.0.1:9".to_string(),
        };

        let err = service.delete_files(vec![]).await.unwrap_err();
        assert!(matches!(err, FolioError::Validation(_)));
    }

    #[tokio::test]
    async fn test_disabled_provider_is_unavailable() {
        let service = UploadService {
            enabled: false,
            api_key: String::new(),
            endpoint: String::new(),
        };

        let err = service
            .delete_files(vec!["key1".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::ExternalService(_)));
    }
}
