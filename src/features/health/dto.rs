use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::config::Config;

/// Which optional integrations have credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IntegrationFlags {
    pub mistral: bool,
    pub groq: bool,
    pub qdrant: bool,
    pub github: bool,
}

impl IntegrationFlags {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mistral: config.ai.mistral_api_key.is_some(),
            groq: config.ai.groq_api_key.is_some(),
            qdrant: config.ai.qdrant_url.is_some(),
            github: config.github.is_configured(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    pub status: ServiceStatus,
    pub database: ComponentStatus,
    pub websocket_connections: usize,
    pub config: IntegrationFlags,
    /// Qdrant reachability, present only when it is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_store: Option<ComponentStatus>,
}
