//! Korean legal-advice assistant: mode classification, statute deep links,
//! and a tool-calling answer engine over OpenAI-compatible providers.
//!
//! This crate re-exports the workspace crates behind feature flags.
//!
//! ```no_run
//! # #[cfg(all(feature = "openai", feature = "agent"))]
//! # async fn demo() -> Result<(), lawdesk::LawdeskError> {
//! use std::sync::Arc;
//!
//! use futures::StreamExt;
//! use lawdesk::prelude::*;
//!
//! let client = OpenAiClient::new("sk-...")?;
//! let question = "임대차 보증금을 돌려받지 못하면 어떤 책임을 물을 수 있나요?";
//! let (_mode, system_prompt) = system_prompt_for(question, false);
//! let engine = AdviceEngine::builder()
//!     .provider(Arc::new(client))
//!     .model("gpt-4o-mini")
//!     .build();
//!
//! let mut events = engine.generate(GenerateRequest::new(question, system_prompt));
//! while let Some(event) = events.next().await {
//!     if !event.is_final() {
//!         print!("{}", event.text());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub use lawdesk_core::*;
pub use lawdesk_linking as linking;
pub use lawdesk_prompt as prompt;

pub use lawdesk_linking::{extract_citations, link_citations, merge_links_block, Citation};
pub use lawdesk_prompt::{build_sys_for_mode, classify_intent, pick_mode, system_prompt_for, Intent};

#[cfg(any(feature = "openai", feature = "azure"))]
pub use lawdesk_llm as llm;

#[cfg(feature = "agent")]
pub use lawdesk_agent as agent;

pub mod prelude {
    pub use lawdesk_core::prelude::*;
    pub use lawdesk_linking::{link_citations, Citation};
    pub use lawdesk_prompt::{system_prompt_for, Intent};

    #[cfg(feature = "agent")]
    pub use lawdesk_agent::{AdviceEngine, EngineConfig, GenerateEvent, GenerateRequest, LawSearch};

    #[cfg(any(feature = "openai", feature = "azure"))]
    pub use lawdesk_llm::OpenAiCompatibleClient;

    #[cfg(feature = "openai")]
    pub use lawdesk_llm::OpenAiClient;

    #[cfg(feature = "azure")]
    pub use lawdesk_llm::AzureOpenAiClient;
}
