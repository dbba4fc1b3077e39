//! Chat-completion providers speaking the OpenAI wire format.
//!
//! Every call is classified into a [`CompletionOutcome`]; callers never see
//! transport errors directly.

mod client;
mod content_filter;
mod retry;
mod sse;

pub mod openai_compatible;

// Provider-specific clients (feature-gated)
pub mod providers;

pub use client::{OpenAiCompatibleBuilder, OpenAiCompatibleClient};
pub use content_filter::{detect_content_filter, ContentFilterHit};
pub use retry::{is_retryable_status, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY};
pub use sse::{decode_sse_data, parse_sse_line, SseLine};

pub use lawdesk_core::{
    AssistantMessage, ChatCompletion, CompletionChunk, CompletionOutcome, CompletionRequest,
    LawdeskError, Message, Role, ToolCall, ToolChoice, ToolSpec,
};

#[cfg(feature = "openai")]
pub use providers::openai::OpenAiClient;

#[cfg(feature = "azure")]
pub use providers::azure::AzureOpenAiClient;
