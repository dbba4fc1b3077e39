//! Azure OpenAI deployment client

use std::time::Duration;

use lawdesk_core::{ChatCompletion, CompletionOutcome, CompletionRequest, LawdeskError};

use crate::client::OpenAiCompatibleClient;

pub const AZURE_DEFAULT_API_VERSION: &str = "2024-06-01";

/// Client bound to one Azure OpenAI deployment. The deployment name doubles
/// as the default model.
#[derive(Clone)]
pub struct AzureOpenAiClient(OpenAiCompatibleClient);

impl AzureOpenAiClient {
    /// `endpoint` is the resource URL, e.g. `https://<name>.openai.azure.com`.
    pub fn new(
        endpoint: impl AsRef<str>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LawdeskError> {
        Self::with_api_version(endpoint, deployment, api_key, AZURE_DEFAULT_API_VERSION)
    }

    pub fn with_api_version(
        endpoint: impl AsRef<str>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Result<Self, LawdeskError> {
        let deployment = deployment.into();
        if deployment.trim().is_empty() {
            return Err(LawdeskError::InvalidConfig(
                "azure deployment name is required".to_string(),
            ));
        }
        let base = format!(
            "{}/openai/deployments/{}",
            endpoint.as_ref().trim_end_matches('/'),
            deployment.trim()
        );
        OpenAiCompatibleClient::builder()
            .base_url(base)?
            .api_key(api_key)
            .azure_api_version(api_version)
            .default_model(deployment)
            .timeout(Duration::from_secs(60))
            .build()
            .map(Self)
    }

    pub fn inner(&self) -> &OpenAiCompatibleClient {
        &self.0
    }
}

#[async_trait::async_trait]
impl ChatCompletion for AzureOpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionOutcome {
        self.0.complete(request).await
    }
}
