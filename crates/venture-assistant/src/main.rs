mod config;
mod error;
mod flows;
mod rate_limit;
mod server;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use venture_common::openai::{OpenAiClient, OpenAiClientConfig};

use config::Config;
use flows::{Assistant, GenerationSettings};
use rate_limit::RateLimiter;
use server::VentureAssistantServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting venture-assistant MCP server");

    let config = Config::from_env()?;
    info!(
        model = %config.model,
        temperature = config.temperature,
        max_tokens = config.max_tokens,
        idea_count = config.idea_count,
        stream = config.stream,
        "configuration loaded"
    );

    let openai_config = OpenAiClientConfig::from_env();
    info!(
        base_url = %openai_config.base_url,
        api_key = openai_config.api_key.is_some(),
        timeout_ms = openai_config.default_timeout.as_millis(),
        max_retries = openai_config.max_retries,
        "llm client configured"
    );
    let openai = Arc::new(OpenAiClient::new(openai_config)?);

    let limiter = RateLimiter::from_env();
    if let Some(limiter) = &limiter {
        info!(rps = limiter.rps(), "rate limiting enabled");
    }

    let assistant = Arc::new(Assistant::new(openai, GenerationSettings::from(&config)));
    let server = VentureAssistantServer::new(assistant, limiter);

    if let Some(addr) = config.tcp_listen_addr.as_deref() {
        let listener = TcpListener::bind(addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
