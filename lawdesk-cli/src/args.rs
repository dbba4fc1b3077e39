use std::time::Duration;

use clap::Parser;
use lawdesk_prompt::{build_sys_for_mode, system_prompt_for, Intent};

/// Ask a Korean legal question and stream the answer with statute links.
#[derive(Debug, Parser)]
#[command(name = "lawdesk", version)]
pub struct Cli {
    /// Question to ask. Read from stdin when omitted.
    pub question: Option<String>,

    /// Provider base URL. In Azure mode, the deployment URL.
    #[arg(long, env = "LAWDESK_BASE_URL", default_value = "https://api.openai.com")]
    pub base_url: String,

    #[arg(long, env = "LAWDESK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "LAWDESK_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Switches to Azure OpenAI authentication with this API version.
    #[arg(long, env = "LAWDESK_AZURE_API_VERSION")]
    pub azure_api_version: Option<String>,

    /// Ask for a shorter answer.
    #[arg(long)]
    pub brief: bool,

    /// Wait for the whole answer instead of streaming it.
    #[arg(long)]
    pub no_stream: bool,

    /// Force a response mode instead of classifying the question.
    #[arg(long, value_name = "quick|lawfinder|memo|draft")]
    pub mode: Option<Intent>,

    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolved mode and its system prompt for `question`.
    pub fn system_prompt(&self, question: &str) -> (Intent, String) {
        match self.mode {
            Some(mode) => (mode, build_sys_for_mode(mode, self.brief)),
            None => system_prompt_for(question, self.brief),
        }
    }
}
