use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nele_openai_gateway::config::{
    DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL, DEFAULT_MAX_BODY_BYTES,
    TOOL_DESCRIPTION_HARD_LIMIT,
};
use nele_openai_gateway::{AppState, GatewayConfig, router};
use tracing::info;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "nele-openai-gateway",
    about = "OpenAI-compatible gateway for the Nele chat backend"
)]
struct Args {
    #[arg(long, env = "NELE_GATEWAY_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "NELE_GATEWAY_PORT", default_value_t = 5155)]
    port: u16,

    #[arg(long, env = "NELE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "NELE_GATEWAY_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Environment variable holding the fallback credential, read per request.
    #[arg(long, default_value = DEFAULT_API_KEY_ENV)]
    api_key_env: String,

    #[arg(long, env = "NELE_DEFAULT_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    default_chat_model: String,

    #[arg(long, env = "NELE_DEFAULT_DOCUMENT_COLLECTION_ID")]
    default_document_collection_id: Option<String>,

    #[arg(long, env = "NELE_REASONING_EFFORT")]
    reasoning_effort: Option<String>,

    #[arg(
        long,
        env = "NELE_TOOL_DESCRIPTION_MAX_LENGTH",
        default_value_t = TOOL_DESCRIPTION_HARD_LIMIT
    )]
    tool_description_max_length: usize,

    /// Emulate streaming even when the client did not ask for it.
    #[arg(long, env = "NELE_FORCE_STREAM")]
    force_stream: bool,

    #[arg(long, env = "NELE_UPSTREAM_TIMEOUT_SECS", default_value_t = 300)]
    upstream_timeout_secs: u64,

    #[arg(long, env = "NELE_IMAGE_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    image_fetch_timeout_secs: u64,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "NELE_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

impl Args {
    fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            api_key_env: self.api_key_env.clone(),
            default_chat_model: self.default_chat_model.clone(),
            default_document_collection_id: self.default_document_collection_id.clone(),
            reasoning_effort: self.reasoning_effort.clone(),
            tool_description_max_length: self.tool_description_max_length,
            force_stream: self.force_stream,
            upstream_timeout: Duration::from_secs(self.upstream_timeout_secs),
            image_fetch_timeout: Duration::from_secs(self.image_fetch_timeout_secs),
            max_body_bytes: self.max_body_bytes,
        }
        .normalized()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.gateway_config();
    info!(
        base_url = %config.base_url,
        default_chat_model = %config.default_chat_model,
        force_stream = config.force_stream,
        "gateway configured"
    );

    let state = Arc::new(AppState::new(config)?);
    let app = router(state);

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    let local_addr = listener.local_addr().context("reading local_addr")?;

    info!("nele-openai-gateway listening on {}", local_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum app")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
