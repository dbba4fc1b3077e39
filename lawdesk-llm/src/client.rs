use std::time::Duration;

use lawdesk_core::{
    AssistantMessage, ChatCompletion, CompletionOutcome, CompletionRequest, LawdeskError, Value,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};
use url::Url;

use crate::content_filter::detect_content_filter;
use crate::openai_compatible::{ChatCompletionRequest, ChatCompletionResponse, OpenAiError};
use crate::retry::{is_retryable_status, RetryPolicy};
use crate::sse::chunk_stream;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
enum Auth {
    Bearer,
    /// Azure deployments authenticate with an `api-key` header and pin the
    /// API version in the query string.
    Azure { api_version: String },
}

/// Chat client for any endpoint speaking the OpenAI chat completions format.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    auth: Auth,
    default_model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

#[derive(Default)]
pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_base_delay: Option<Duration>,
    azure_api_version: Option<String>,
}

impl OpenAiCompatibleBuilder {
    pub fn base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, LawdeskError> {
        let url = Url::parse(base_url.as_ref()).map_err(|err| {
            LawdeskError::InvalidConfig(format!("invalid base url '{}': {err}", base_url.as_ref()))
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    pub fn azure_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.azure_api_version = Some(api_version.into());
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, LawdeskError> {
        let base_url = self
            .base_url
            .ok_or_else(|| LawdeskError::InvalidConfig("base url is required".to_string()))?;
        let base = base_url.as_str().trim_end_matches('/');

        let (endpoint, auth) = match self.azure_api_version {
            Some(api_version) if !api_version.trim().is_empty() => (
                format!("{base}/chat/completions"),
                Auth::Azure {
                    api_version: api_version.trim().to_string(),
                },
            ),
            _ => (format!("{base}/v1/chat/completions"), Auth::Bearer),
        };

        if self.api_key.is_none() {
            warn!(endpoint = %endpoint, "no api key configured for chat completions client");
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| LawdeskError::InvalidConfig(err.to_string()))?;

        let defaults = RetryPolicy::default();
        Ok(OpenAiCompatibleClient {
            http,
            endpoint,
            api_key: self.api_key,
            auth,
            default_model: self.default_model.unwrap_or_default(),
            timeout,
            retry: RetryPolicy::new(
                self.max_retries.unwrap_or(defaults.max_retries),
                self.retry_base_delay.unwrap_or(defaults.base_delay),
            ),
        })
    }
}

enum Attempt {
    Done(CompletionOutcome),
    Retry(String),
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn request(&self, body: &ChatCompletionRequest) -> RequestBuilder {
        let mut request = self.http.post(&self.endpoint).json(body);
        match (&self.auth, &self.api_key) {
            (Auth::Bearer, Some(key)) => {
                request = request.bearer_auth(key.expose_secret());
            }
            (Auth::Bearer, None) => {}
            (Auth::Azure { api_version }, key) => {
                request = request.query(&[("api-version", api_version.as_str())]);
                if let Some(key) = key {
                    request = request.header("api-key", key.expose_secret().as_str());
                }
            }
        }
        request
    }

    async fn attempt(&self, body: &ChatCompletionRequest) -> Attempt {
        let response = match self.request(body).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return Attempt::Retry(LawdeskError::Timeout(self.timeout).to_string())
            }
            Err(err) => return Attempt::Retry(LawdeskError::Provider(err.to_string()).to_string()),
        };

        let status = response.status();
        if status.is_success() {
            if body.stream {
                return Attempt::Done(CompletionOutcome::Streaming(chunk_stream(response)));
            }
            let outcome = match response.json::<ChatCompletionResponse>().await {
                Ok(parsed) => classify_response(parsed),
                Err(err) => CompletionOutcome::TransientFailure {
                    reason: format!("unreadable completion response: {err}"),
                },
            };
            return Attempt::Done(outcome);
        }

        let text = response.text().await.unwrap_or_default();
        let error_body = serde_json::from_str::<Value>(&text).unwrap_or(Value::Null);
        if let Some(hit) = detect_content_filter(status, &error_body) {
            warn!(
                status = status.as_u16(),
                categories = %hit.categories,
                "completion blocked by content filter"
            );
            return Attempt::Done(CompletionOutcome::Blocked {
                message: hit.message,
                categories: hit.categories,
            });
        }

        let reason = error_reason(status, &text);
        if is_retryable_status(status) {
            Attempt::Retry(reason)
        } else {
            Attempt::Done(CompletionOutcome::TransientFailure { reason })
        }
    }
}

fn error_reason(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body))
}

fn classify_response(response: ChatCompletionResponse) -> CompletionOutcome {
    let Some(choice) = response.choices.into_iter().next() else {
        return CompletionOutcome::TransientFailure {
            reason: "no choices in completion response".to_string(),
        };
    };

    let message = AssistantMessage::from(choice.message);
    let empty = message.content.as_deref().map_or(true, str::is_empty);
    if choice.finish_reason.as_deref() == Some("content_filter")
        && empty
        && message.tool_calls.is_empty()
    {
        warn!("completion withheld by content filter");
        return CompletionOutcome::Blocked {
            message: None,
            categories: json!({}),
        };
    }
    CompletionOutcome::Complete(message)
}

#[async_trait::async_trait]
impl ChatCompletion for OpenAiCompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionOutcome {
        let body = ChatCompletionRequest::from_completion(&request, &self.default_model);
        debug!(
            model = %body.model,
            stream = body.stream,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map_or(0, Vec::len),
            "sending chat completion"
        );

        let attempts = self.retry.attempts(request.allow_retry);
        let mut last_reason = String::new();
        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.delay_for(attempt - 1);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %last_reason,
                    "retrying chat completion"
                );
                tokio::time::sleep(delay).await;
            }
            match self.attempt(&body).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Retry(reason) => last_reason = reason,
            }
        }
        CompletionOutcome::TransientFailure {
            reason: last_reason,
        }
    }
}
