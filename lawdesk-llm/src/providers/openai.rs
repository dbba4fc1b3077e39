//! OpenAI LLM client

use std::time::Duration;

use lawdesk_core::{ChatCompletion, CompletionOutcome, CompletionRequest, LawdeskError};

use crate::client::OpenAiCompatibleClient;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI LLM client
#[derive(Clone)]
pub struct OpenAiClient(OpenAiCompatibleClient);

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LawdeskError> {
        OpenAiCompatibleClient::builder()
            .base_url(OPENAI_BASE_URL)?
            .api_key(api_key)
            .default_model(OPENAI_DEFAULT_MODEL)
            .timeout(Duration::from_secs(60))
            .build()
            .map(Self)
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.0.set_default_model(model);
        self
    }

    pub fn inner(&self) -> &OpenAiCompatibleClient {
        &self.0
    }
}

#[async_trait::async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionOutcome {
        self.0.complete(request).await
    }
}
