// Prelude module for lawdesk-core
//
// Import commonly used types with: `use lawdesk_core::prelude::*;`

pub use crate::{
    ArgMap, AssistantMessage, ChatCompletion, CompletionChunk, CompletionOutcome,
    CompletionRequest, LawdeskError, Message, Role, ToolCall, ToolChoice, ToolError, ToolSpec,
    Value,
};
