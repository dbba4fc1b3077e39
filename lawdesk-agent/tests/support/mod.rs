#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::StreamExt;
use lawdesk_agent::{
    AdviceEngine, ContextPrefetch, ContextSummarize, GenerateEvent, GenerateRequest, LawSearch,
};
use lawdesk_core::{
    ArgMap, AssistantMessage, ChatCompletion, CompletionChunk, CompletionOutcome,
    CompletionRequest, LawdeskError, ToolCall, ToolError, Value,
};

pub enum Scripted {
    Reply(AssistantMessage),
    Chunks(Vec<Result<CompletionChunk, LawdeskError>>),
    Blocked(Option<String>),
    Transient,
}

impl Scripted {
    pub fn text(text: &str) -> Self {
        Scripted::Reply(AssistantMessage {
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
        })
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Scripted::Reply(AssistantMessage {
            content: None,
            tool_calls: calls,
        })
    }

    pub fn stream(pieces: &[&str]) -> Self {
        let mut chunks: Vec<_> = pieces
            .iter()
            .map(|piece| Ok(CompletionChunk::text(*piece)))
            .collect();
        chunks.push(Ok(CompletionChunk::finished("stop")));
        Scripted::Chunks(chunks)
    }
}

/// Replays scripted outcomes in order and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatCompletion for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> CompletionOutcome {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Reply(message)) => CompletionOutcome::Complete(message),
            Some(Scripted::Chunks(chunks)) => {
                CompletionOutcome::Streaming(futures::stream::iter(chunks).boxed())
            }
            Some(Scripted::Blocked(message)) => CompletionOutcome::Blocked {
                message,
                categories: serde_json::json!({}),
            },
            Some(Scripted::Transient) | None => CompletionOutcome::TransientFailure {
                reason: "script exhausted".to_string(),
            },
        }
    }
}

/// Search backend answering every call with a fixed result.
pub struct FixedSearch {
    pub one: Result<Value, String>,
    pub multi: Value,
    pub calls: Mutex<Vec<(String, ArgMap)>>,
}

impl FixedSearch {
    pub fn new(one: Value, multi: Value) -> Arc<Self> {
        Arc::new(Self {
            one: Ok(one),
            multi,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            one: Err(reason.to_string()),
            multi: Value::Null,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, ArgMap)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LawSearch for FixedSearch {
    async fn search_one(&self, args: ArgMap) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push(("search_one".to_string(), args));
        self.one.clone().map_err(ToolError::ExecutionFailed)
    }

    async fn search_multi(&self, args: ArgMap) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push(("search_multi".to_string(), args));
        Ok(self.multi.clone())
    }
}

pub struct FixedPrefetch {
    pub fail: bool,
    pub seen_rows: Mutex<Option<u32>>,
}

#[async_trait::async_trait]
impl ContextPrefetch for FixedPrefetch {
    async fn prefetch(&self, question: &str, num_rows_per_law: u32) -> Result<Value, ToolError> {
        *self.seen_rows.lock().unwrap() = Some(num_rows_per_law);
        if self.fail {
            return Err(ToolError::ExecutionFailed("law api down".to_string()));
        }
        Ok(serde_json::json!({ "question": question }))
    }
}

pub struct FixedSummary(pub Option<String>);

#[async_trait::async_trait]
impl ContextSummarize for FixedSummary {
    async fn summarize(
        &self,
        _context: &Value,
        max_items: usize,
    ) -> Result<Option<String>, ToolError> {
        assert_eq!(max_items, 6);
        Ok(self.0.clone())
    }
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

pub fn engine(provider: Arc<ScriptedProvider>) -> AdviceEngine {
    AdviceEngine::builder()
        .provider(provider)
        .model("gpt-test")
        .build()
}

pub async fn run(engine: &AdviceEngine, request: GenerateRequest) -> Vec<GenerateEvent> {
    engine.generate(request).collect().await
}
