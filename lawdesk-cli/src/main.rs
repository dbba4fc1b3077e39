mod args;

use std::io::{self, Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use futures::StreamExt;
use lawdesk_agent::{AdviceEngine, GenerateEvent, GenerateRequest};
use lawdesk_llm::OpenAiCompatibleClient;
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

fn read_question(cli: &Cli) -> anyhow::Result<String> {
    let question = match &cli.question {
        Some(question) => question.clone(),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read question from stdin")?;
            buffer
        }
    };
    let question = question.trim().to_string();
    if question.is_empty() {
        bail!("no question given");
    }
    Ok(question)
}

fn build_client(cli: &Cli) -> anyhow::Result<OpenAiCompatibleClient> {
    let mut builder = OpenAiCompatibleClient::builder()
        .base_url(&cli.base_url)?
        .default_model(&cli.model)
        .timeout(cli.timeout());
    if let Some(api_key) = &cli.api_key {
        builder = builder.api_key(api_key);
    }
    if let Some(api_version) = &cli.azure_api_version {
        builder = builder.azure_api_version(api_version);
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lawdesk=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let question = read_question(&cli)?;
    let (mode, system_prompt) = cli.system_prompt(&question);
    tracing::info!(%mode, model = %cli.model, "answering question");

    let engine = AdviceEngine::builder()
        .provider(Arc::new(build_client(&cli)?))
        .model(&cli.model)
        .build();
    let request = GenerateRequest::new(question, system_prompt).stream(!cli.no_stream);

    let mut stdout = io::stdout().lock();
    let mut streamed = false;
    let mut events = engine.generate(request);
    while let Some(event) = events.next().await {
        match event {
            GenerateEvent::Delta { text, .. } => {
                streamed = true;
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            GenerateEvent::Final { text, .. } => {
                if !streamed {
                    stdout.write_all(text.as_bytes())?;
                }
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
            }
        }
    }
    stdout.flush()?;
    Ok(())
}
