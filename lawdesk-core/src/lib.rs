mod error;
mod llm;
mod tool;
mod value;

pub mod prelude;

pub use error::LawdeskError;
pub use llm::{
    AssistantMessage, ChatCompletion, ChunkChoice, ChunkDelta, ChunkStream, CompletionChunk,
    CompletionOutcome, CompletionRequest, Message, Role, ToolCall, ToolChoice, ToolSpec,
};
pub use tool::ToolError;
pub use value::{ArgMap, Value};
