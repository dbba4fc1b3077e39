use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use lawdesk_core::{
    AssistantMessage, ChatCompletion, ChunkStream, CompletionOutcome, CompletionRequest, Message,
    ToolCall, ToolChoice, ToolSpec, Value,
};
use lawdesk_linking::link_citations;
use tracing::{debug, info_span, warn, Instrument};

use crate::event::GenerateEvent;
use crate::messages::{
    BLOCKED_FALLBACK_MESSAGE, NOT_CONFIGURED_MESSAGE, TRANSIENT_FAILURE_MESSAGE,
};
use crate::primer::{primer_or_none, ContextPrefetch, ContextSummarize};
use crate::tooling::{
    collect_link_items, default_tool_specs, dispatch_tool_call, serialize_or_empty, LawSearch,
};

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub temperature: f32,
    pub first_max_tokens: u32,
    pub final_max_tokens: u32,
    pub primer_max_items: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            first_max_tokens: 800,
            final_max_tokens: 1400,
            primer_max_items: 6,
        }
    }
}

/// Inputs of one `generate` turn.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub question: String,
    pub system_prompt: String,
    pub allow_tools: bool,
    pub stream: bool,
    pub primer_enable: bool,
    pub num_rows: u32,
}

impl GenerateRequest {
    pub fn new(question: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            system_prompt: system_prompt.into(),
            allow_tools: false,
            stream: true,
            primer_enable: true,
            num_rows: 3,
        }
    }

    pub fn allow_tools(mut self, allow_tools: bool) -> Self {
        self.allow_tools = allow_tools;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn primer_enable(mut self, primer_enable: bool) -> Self {
        self.primer_enable = primer_enable;
        self
    }

    pub fn num_rows(mut self, num_rows: u32) -> Self {
        self.num_rows = num_rows;
        self
    }
}

/// Per-turn accumulator threaded through the phases of `generate`.
#[derive(Debug, Default)]
struct TurnContext {
    messages: Vec<Message>,
    links: Vec<Value>,
}

/// Orchestrates one advice turn: optional primer, a tool-enabled first call,
/// tool dispatch, and a final (optionally streamed) answer with statute links.
#[derive(Clone)]
pub struct AdviceEngine {
    provider: Option<Arc<dyn ChatCompletion>>,
    model: Option<String>,
    search: Option<Arc<dyn LawSearch>>,
    prefetch: Option<Arc<dyn ContextPrefetch>>,
    summarize: Option<Arc<dyn ContextSummarize>>,
    tool_specs: Vec<ToolSpec>,
    config: EngineConfig,
}

#[derive(Default)]
pub struct AdviceEngineBuilder {
    provider: Option<Arc<dyn ChatCompletion>>,
    model: Option<String>,
    search: Option<Arc<dyn LawSearch>>,
    prefetch: Option<Arc<dyn ContextPrefetch>>,
    summarize: Option<Arc<dyn ContextSummarize>>,
    tool_specs: Option<Vec<ToolSpec>>,
    config: EngineConfig,
}

impl AdviceEngineBuilder {
    pub fn provider(mut self, provider: Arc<dyn ChatCompletion>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn search(mut self, search: Arc<dyn LawSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn prefetch(mut self, prefetch: Arc<dyn ContextPrefetch>) -> Self {
        self.prefetch = Some(prefetch);
        self
    }

    pub fn summarize(mut self, summarize: Arc<dyn ContextSummarize>) -> Self {
        self.summarize = Some(summarize);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the generated `search_one`/`search_multi` definitions.
    pub fn tool_specs(mut self, tool_specs: Vec<ToolSpec>) -> Self {
        self.tool_specs = Some(tool_specs);
        self
    }

    pub fn build(self) -> AdviceEngine {
        AdviceEngine {
            provider: self.provider,
            model: self.model.filter(|model| !model.trim().is_empty()),
            search: self.search,
            prefetch: self.prefetch,
            summarize: self.summarize,
            tool_specs: self.tool_specs.unwrap_or_else(default_tool_specs),
            config: self.config,
        }
    }
}

impl AdviceEngine {
    pub fn builder() -> AdviceEngineBuilder {
        AdviceEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tool_specs(&self) -> &[ToolSpec] {
        &self.tool_specs
    }

    /// Runs one turn. The stream always ends with exactly one
    /// [`GenerateEvent::Final`]; failures are reported as its text.
    pub fn generate(&self, request: GenerateRequest) -> BoxStream<'_, GenerateEvent> {
        let span = info_span!(
            "advice_generate",
            model = self.model.as_deref().unwrap_or_default(),
            allow_tools = request.allow_tools,
            stream = request.stream,
        );

        Box::pin(async_stream::stream! {
            let (provider, model) = match (self.provider.as_deref(), self.model.as_deref()) {
                (Some(provider), Some(model)) => (provider, model),
                _ => {
                    span.in_scope(|| warn!("advice engine has no provider or model configured"));
                    yield GenerateEvent::final_text(NOT_CONFIGURED_MESSAGE, Vec::new());
                    return;
                }
            };

            let mut turn = self.open_turn(&request).instrument(span.clone()).await;
            let tools_attached = request.allow_tools && self.search.is_some();

            let first = provider
                .complete(self.first_request(model, &turn, request.allow_tools, tools_attached))
                .instrument(span.clone())
                .await;
            let reply = match first {
                CompletionOutcome::Complete(reply) => reply,
                CompletionOutcome::Streaming(chunks) => AssistantMessage {
                    content: Some(drain_text(chunks).await),
                    tool_calls: Vec::new(),
                },
                CompletionOutcome::Blocked { message, .. } => {
                    span.in_scope(|| warn!("first completion blocked by content filter"));
                    yield GenerateEvent::final_text(blocked_text(message), Vec::new());
                    return;
                }
                CompletionOutcome::TransientFailure { reason } => {
                    span.in_scope(|| warn!(%reason, "first completion failed"));
                    yield GenerateEvent::final_text(TRANSIENT_FAILURE_MESSAGE, Vec::new());
                    return;
                }
            };

            if !reply.tool_calls.is_empty() {
                self.dispatch_tools(&mut turn, reply.tool_calls)
                    .instrument(span.clone())
                    .await;
            }

            let second = provider
                .complete(self.final_request(model, &turn, request.stream))
                .instrument(span.clone())
                .await;
            match second {
                CompletionOutcome::Blocked { message, .. } => {
                    span.in_scope(|| warn!("final completion blocked by content filter"));
                    yield GenerateEvent::final_text(blocked_text(message), turn.links);
                }
                CompletionOutcome::TransientFailure { reason } => {
                    span.in_scope(|| warn!(%reason, "final completion failed"));
                    yield GenerateEvent::final_text(TRANSIENT_FAILURE_MESSAGE, turn.links);
                }
                CompletionOutcome::Streaming(mut chunks) if request.stream => {
                    let mut streamed = String::new();
                    while let Some(item) = chunks.next().await {
                        let chunk = match item {
                            Ok(chunk) => chunk,
                            Err(err) => {
                                span.in_scope(|| debug!(error = %err, "skipping malformed chunk"));
                                continue;
                            }
                        };
                        let choice = match chunk.choices.into_iter().next() {
                            Some(choice) => choice,
                            None => continue,
                        };
                        if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
                            streamed.push_str(&text);
                            yield GenerateEvent::delta(text, turn.links.clone());
                        }
                        if choice.finish_reason.as_deref().is_some_and(|r| !r.is_empty()) {
                            break;
                        }
                    }

                    let (tail, final_text) = streaming_tail(streamed);
                    if let Some(tail) = tail {
                        yield GenerateEvent::delta(tail, turn.links.clone());
                    }
                    yield GenerateEvent::final_text(final_text, turn.links);
                }
                CompletionOutcome::Streaming(chunks) => {
                    let text = link_citations(&drain_text(chunks).await);
                    yield GenerateEvent::final_text(text, turn.links);
                }
                CompletionOutcome::Complete(reply) => {
                    let text = link_citations(reply.content.as_deref().unwrap_or_default());
                    if request.stream && !text.is_empty() {
                        yield GenerateEvent::delta(text.clone(), turn.links.clone());
                    }
                    yield GenerateEvent::final_text(text, turn.links);
                }
            }
        })
    }

    async fn open_turn(&self, request: &GenerateRequest) -> TurnContext {
        let mut turn = TurnContext::default();
        turn.messages.push(Message::system(request.system_prompt.clone()));

        if request.allow_tools && request.primer_enable {
            if let (Some(prefetch), Some(summarize)) = (&self.prefetch, &self.summarize) {
                let primer = primer_or_none(
                    prefetch.as_ref(),
                    summarize.as_ref(),
                    &request.question,
                    request.num_rows,
                    self.config.primer_max_items,
                )
                .await;
                if let Some(primer) = primer {
                    debug!(chars = primer.chars().count(), "injecting context primer");
                    turn.messages.push(Message::system(primer));
                }
            }
        }

        turn.messages.push(Message::user(request.question.clone()));
        turn
    }

    fn first_request(
        &self,
        model: &str,
        turn: &TurnContext,
        allow_tools: bool,
        tools_attached: bool,
    ) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: turn.messages.clone(),
            stream: false,
            allow_retry: true,
            tools: if tools_attached {
                self.tool_specs.clone()
            } else {
                Vec::new()
            },
            tool_choice: Some(if allow_tools {
                ToolChoice::Auto
            } else {
                ToolChoice::None
            }),
            temperature: self.config.temperature,
            max_tokens: self.config.first_max_tokens,
        }
    }

    fn final_request(&self, model: &str, turn: &TurnContext, stream: bool) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: turn.messages.clone(),
            stream,
            allow_retry: true,
            tools: Vec::new(),
            tool_choice: None,
            temperature: self.config.temperature,
            max_tokens: self.config.final_max_tokens,
        }
    }

    /// Calls each requested tool in order and appends one tool message per
    /// call, keyed by the call id.
    async fn dispatch_tools(&self, turn: &mut TurnContext, calls: Vec<ToolCall>) {
        turn.messages
            .push(Message::assistant_tool_calls(calls.clone()));

        for call in calls {
            debug!(tool = %call.name, call_id = %call.id, "dispatching tool call");
            let result = dispatch_tool_call(self.search.as_deref(), &call).await;
            collect_link_items(&result, &mut turn.links);
            turn.messages
                .push(Message::tool_result(call.id, serialize_or_empty(&result)));
        }
    }
}

fn blocked_text(message: Option<String>) -> String {
    message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| BLOCKED_FALLBACK_MESSAGE.to_string())
}

/// Concatenates the text of a chunk stream, skipping malformed chunks and
/// stopping after the chunk that carries a finish reason.
async fn drain_text(mut chunks: ChunkStream) -> String {
    let mut text = String::new();
    while let Some(item) = chunks.next().await {
        let Some(choice) = item.ok().and_then(|chunk| chunk.choices.into_iter().next()) else {
            continue;
        };
        if let Some(content) = choice.delta.content {
            text.push_str(&content);
        }
        if choice.finish_reason.as_deref().is_some_and(|r| !r.is_empty()) {
            break;
        }
    }
    text
}

/// Splits the post-stream links block off the merged answer.
///
/// Returns the suffix still to be streamed (if any) and the final text. When
/// the streamed text already ends in a links block of its own, it is kept
/// verbatim so the deltas still add up to the final text.
fn streaming_tail(streamed: String) -> (Option<String>, String) {
    let merged = link_citations(&streamed);
    let suffix = merged.strip_prefix(streamed.as_str()).map(str::to_string);
    match suffix {
        Some(suffix) if !suffix.is_empty() => (Some(suffix), merged),
        _ => (None, streamed),
    }
}
