use lawdesk_core::{ToolError, Value};
use tracing::debug;

/// Fetches statute context for a question ahead of the first model call.
#[async_trait::async_trait]
pub trait ContextPrefetch: Send + Sync {
    async fn prefetch(&self, question: &str, num_rows_per_law: u32) -> Result<Value, ToolError>;
}

/// Condenses prefetched context into a system-message primer. `Ok(None)`
/// means there is nothing worth injecting.
#[async_trait::async_trait]
pub trait ContextSummarize: Send + Sync {
    async fn summarize(&self, context: &Value, max_items: usize)
        -> Result<Option<String>, ToolError>;
}

/// Prefetch then summarize; any failure or blank summary yields `None`.
pub async fn primer_or_none(
    prefetch: &dyn ContextPrefetch,
    summarize: &dyn ContextSummarize,
    question: &str,
    num_rows_per_law: u32,
    max_items: usize,
) -> Option<String> {
    let context = match prefetch.prefetch(question, num_rows_per_law).await {
        Ok(context) => context,
        Err(err) => {
            debug!(error = %err, "context prefetch failed; continuing without primer");
            return None;
        }
    };

    match summarize.summarize(&context, max_items).await {
        Ok(Some(primer)) if !primer.trim().is_empty() => Some(primer),
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "context summary failed; continuing without primer");
            None
        }
    }
}
