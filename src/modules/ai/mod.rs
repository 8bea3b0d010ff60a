//! Clients for the hosted AI providers.
//!
//! The core treats these as opaque: it sends prompts or documents and gets
//! text back. Traits sit at the seam so services can be tested with fakes.

mod chat;
mod groq_client;
mod mistral_client;
mod qdrant_client;

pub use chat::ChatCompletionClient;
pub use groq_client::GroqClient;
pub use mistral_client::MistralClient;
pub use qdrant_client::QdrantClient;

use async_trait::async_trait;

use crate::core::error::AppError;

/// A chat model asked for a single JSON answer
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> &'static str;

    /// Sends one user prompt and returns the raw reply text
    async fn complete_json(&self, prompt: &str) -> Result<String, AppError>;
}

/// Turns an uploaded document into plain text
#[async_trait]
pub trait DocumentTextExtractor: Send + Sync {
    async fn extract_text(&self, data: &[u8], content_type: &str) -> Result<String, AppError>;
}
