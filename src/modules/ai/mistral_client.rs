use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::{ChatCompletionClient, ChatModel, DocumentTextExtractor};
use crate::core::config::AiConfig;
use crate::core::error::AppError;

const BASE_URL: &str = "https://api.mistral.ai/v1";
const OCR_MODEL: &str = "mistral-ocr-latest";

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: OcrDocument,
}

#[derive(Debug, Serialize)]
struct OcrDocument {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    markdown: String,
}

/// Mistral document OCR plus chat completions
pub struct MistralClient {
    chat: ChatCompletionClient,
}

impl MistralClient {
    /// Returns `None` when `MISTRAL_API_KEY` is not set
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.mistral_api_key.clone() else {
            return Ok(None);
        };

        let chat = ChatCompletionClient::new(
            "Mistral",
            BASE_URL,
            api_key,
            config.mistral_model.clone(),
            config.request_timeout,
        )?;
        Ok(Some(Self { chat }))
    }
}

fn data_url(data: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", content_type, BASE64.encode(data))
}

fn join_pages(response: OcrResponse) -> String {
    response
        .pages
        .into_iter()
        .map(|page| page.markdown)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl DocumentTextExtractor for MistralClient {
    async fn extract_text(&self, data: &[u8], content_type: &str) -> Result<String, AppError> {
        let request = OcrRequest {
            model: OCR_MODEL,
            document: OcrDocument {
                kind: "document_url",
                document_url: data_url(data, content_type),
            },
        };

        let response = self
            .chat
            .http
            .post(format!("{}/ocr", self.chat.base_url))
            .bearer_auth(&self.chat.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Mistral OCR request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Mistral OCR returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: OcrResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Invalid Mistral OCR response: {}", e))
        })?;

        let text = join_pages(body);
        if text.trim().is_empty() {
            return Err(AppError::ExternalServiceError(
                "No text could be extracted from the document".to_string(),
            ));
        }

        tracing::debug!("Mistral OCR extracted {} characters", text.len());
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for MistralClient {
    fn provider(&self) -> &'static str {
        self.chat.provider()
    }

    async fn complete_json(&self, prompt: &str) -> Result<String, AppError> {
        self.chat.complete_json(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        assert_eq!(
            data_url(b"%PDF", "application/pdf"),
            "data:application/pdf;base64,JVBERg=="
        );
    }

    #[test]
    fn test_join_pages_skips_blank_pages() {
        let response: OcrResponse = serde_json::from_str(
            r##"{"pages": [{"index": 0, "markdown": "# Jane Doe"}, {"index": 1, "markdown": " "}, {"index": 2, "markdown": "Rust, SQL"}]}"##,
        )
        .unwrap();
        assert_eq!(join_pages(response), "# Jane Doe\n\nRust, SQL");
    }

    #[test]
    fn test_missing_key_disables_client() {
        let client = MistralClient::from_config(&AiConfig::default()).unwrap();
        assert!(client.is_none());
    }
}
