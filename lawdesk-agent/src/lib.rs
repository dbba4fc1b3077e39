//! Answer orchestration for legal questions.
//!
//! [`AdviceEngine::generate`] runs one turn against an injected
//! [`ChatCompletion`](lawdesk_core::ChatCompletion) provider: an optional
//! context primer, a first call that may request statute searches, tool
//! dispatch, and a final answer whose statute citations are linked.

mod engine;
mod event;
mod messages;
mod primer;
mod tooling;

pub use engine::{AdviceEngine, AdviceEngineBuilder, EngineConfig, GenerateRequest};
pub use event::{validate_deltas_match_final, validate_single_final, GenerateEvent};
pub use messages::{BLOCKED_FALLBACK_MESSAGE, NOT_CONFIGURED_MESSAGE, TRANSIENT_FAILURE_MESSAGE};
pub use primer::{primer_or_none, ContextPrefetch, ContextSummarize};
pub use tooling::{
    collect_link_items, default_tool_specs, dispatch_tool_call, serialize_or_empty, LawSearch,
    LawTool, SearchMultiArgs, SearchOneArgs,
};
