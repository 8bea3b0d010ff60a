use async_trait::async_trait;

use super::{ChatCompletionClient, ChatModel};
use crate::core::config::AiConfig;
use crate::core::error::AppError;

const BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq inference, used for resume insights and match analysis
pub struct GroqClient {
    chat: ChatCompletionClient,
}

impl GroqClient {
    /// Returns `None` when `GROQ_API_KEY` is not set
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.groq_api_key.clone() else {
            return Ok(None);
        };

        let chat = ChatCompletionClient::new(
            "Groq",
            BASE_URL,
            api_key,
            config.groq_model.clone(),
            config.request_timeout,
        )?;
        Ok(Some(Self { chat }))
    }

    pub fn model(&self) -> &str {
        self.chat.model()
    }
}

#[async_trait]
impl ChatModel for GroqClient {
    fn provider(&self) -> &'static str {
        self.chat.provider()
    }

    async fn complete_json(&self, prompt: &str) -> Result<String, AppError> {
        self.chat.complete_json(prompt).await
    }
}
