use anyhow::Context;
use std::time::Duration;

use crate::core::config::AiConfig;

/// Connection to the hosted vector database.
///
/// Only reachability is checked here; semantic search lives outside this
/// service.
pub struct QdrantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantClient {
    /// Returns `None` when `QDRANT_URL` is not set
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Option<Self>> {
        let Some(url) = config.qdrant_url.clone() else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build Qdrant HTTP client")?;

        Ok(Some(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: config.qdrant_api_key.clone(),
        }))
    }

    pub async fn health(&self) -> bool {
        let mut request = self.http.get(format!("{}/healthz", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Qdrant health check failed: {}", e);
                false
            }
        }
    }
}
