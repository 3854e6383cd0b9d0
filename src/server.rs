//! Router, shared state and the public-protocol request handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{info, warn};

use crate::attachments::AttachmentPipeline;
use crate::backend::NeleClient;
use crate::catalog::{find_model, list_models};
use crate::completion::{ChatCompletion, unix_now};
use crate::config::GatewayConfig;
use crate::credentials::{configured_credential, resolve_credential};
use crate::error::GatewayError;
use crate::knowledge;
use crate::media::{
    ImageGenerationRequest, ImageGenerationResponse, NeleImageResult, NeleTranscription,
    TranscriptionResponse, read_transcription_form, transcription_form,
};
use crate::normalize::{image_part_count, normalize_messages, role_summary};
use crate::payload::{build_chat_payload, resolve_model};
use crate::responses::{ResponseObject, ResponsesRequest, collect_messages};
use crate::stream::{sse_response, stream_failure};
use crate::wire::{
    ChatCompletionRequest, GenerationOptions, InboundMessage, NeleChatPayload, NeleChatResult,
};

pub struct AppState {
    pub config: GatewayConfig,
    pub nele: NeleClient,
    /// Downloads http(s) image URLs before they are re-uploaded.
    pub fetcher: Client,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("parsing base URL {}", config.base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("base URL {} cannot carry a path", config.base_url);
        }
        let http = Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .context("building backend client")?;
        let fetcher = Client::builder()
            .timeout(config.image_fetch_timeout)
            .build()
            .context("building image fetch client")?;
        let nele = NeleClient::new(http, config.base_url.clone());
        Ok(Self {
            config,
            nele,
            fetcher,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/v1/models", get(models))
        .route("/v1/models/{id}", get(model))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/responses", post(responses))
        .route("/v1/audio/transcriptions", post(transcriptions))
        .route("/v1/images/generations", post(image_generations))
        .nest("/v1/knowledge", knowledge::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn root(State(state): State<Arc<AppState>>) -> &'static str {
    match configured_credential(&state.config) {
        Some(_) => "Nele OpenAI Proxy running.",
        None => "API not provided",
    }
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn models(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let catalog = fetch_catalog(&state, &headers).await?;
    Ok(Json(list_models(&catalog, unix_now())).into_response())
}

async fn model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let catalog = fetch_catalog(&state, &headers).await?;
    let model = find_model(&catalog, &id, unix_now()).ok_or(GatewayError::ModelNotFound)?;
    Ok(Json(model).into_response())
}

async fn fetch_catalog(state: &AppState, headers: &HeaderMap) -> Result<Value, GatewayError> {
    let credential = resolve_credential(headers, &state.config)?;
    let reply = state
        .nele
        .list_models(&credential, headers.get(ACCEPT_LANGUAGE))
        .await?;
    if !reply.is_success() {
        warn!(status = %reply.status, "model catalog request failed");
    }
    reply.into_success()?.json()
}

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = resolve_credential(&headers, &state.config)?;
    let mut request: ChatCompletionRequest =
        serde_json::from_slice(&body).map_err(GatewayError::InvalidJson)?;

    let messages = request.messages.take().unwrap_or_default();
    let roles = role_summary(&messages);
    if !roles.is_empty() {
        info!("incoming chat roles: {roles}");
    }

    let stream_requested = request.stream_requested();
    let is_stream = stream_requested || state.config.force_stream;
    let include_usage = stream_requested && request.include_usage();
    let model = resolve_model(
        request.options.model.as_deref(),
        &state.config.default_chat_model,
    );
    let tool_count = request
        .options
        .tools
        .as_ref()
        .and_then(serde_json::Value::as_array)
        .map_or(0, Vec::len);
    info!(
        model = %model,
        stream_requested,
        force_stream = state.config.force_stream,
        messages = messages.len(),
        image_parts = image_part_count(&messages),
        tools = tool_count,
        web_search = request.options.web_search.is_some(),
        document_collection = request.options.document_collection_id.is_some(),
        "chat completion request received"
    );

    let payload =
        prepare_payload(&state, &credential, model.clone(), messages, request.options).await?;

    let reply = state.nele.chat_completion_sync(&credential, &payload).await?;
    if !reply.is_success() {
        if is_stream {
            return Err(stream_failure(reply));
        }
        warn!(status = %reply.status, "upstream chat completion failed");
        return Err(GatewayError::Upstream(reply));
    }

    let result: NeleChatResult = reply.json()?;
    let completion = ChatCompletion::from_backend(&model, result);
    if is_stream {
        Ok(sse_response(completion, include_usage))
    } else {
        Ok(Json(completion).into_response())
    }
}

async fn responses(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = resolve_credential(&headers, &state.config)?;
    let request: ResponsesRequest =
        serde_json::from_slice(&body).map_err(GatewayError::InvalidJson)?;
    if request.stream_requested() {
        return Err(GatewayError::invalid_request(
            "streaming_not_supported",
            "Streaming is not supported for /v1/responses.",
        ));
    }

    let messages = collect_messages(&request)?;
    let options = request.generation_options();
    let model = resolve_model(options.model.as_deref(), &state.config.default_chat_model);
    info!(model = %model, messages = messages.len(), "responses request received");

    let payload = prepare_payload(&state, &credential, model.clone(), messages, options).await?;
    let reply = state.nele.chat_completion_sync(&credential, &payload).await?;
    if !reply.is_success() {
        warn!(status = %reply.status, "upstream chat completion failed");
    }
    let result: NeleChatResult = reply.into_success()?.json()?;
    Ok(Json(ResponseObject::from_backend(&model, result)).into_response())
}

/// Normalizes messages (uploading images in order) and assembles the backend payload.
async fn prepare_payload(
    state: &AppState,
    credential: &str,
    model: String,
    messages: Vec<InboundMessage>,
    options: GenerationOptions,
) -> Result<NeleChatPayload, GatewayError> {
    let pipeline = AttachmentPipeline::new(&state.fetcher, &state.nele, credential);
    let messages = normalize_messages(messages, &pipeline).await?;
    Ok(build_chat_payload(model, messages, options, &state.config))
}

async fn transcriptions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, GatewayError> {
    let multipart = multipart.map_err(|_| {
        GatewayError::invalid_request("invalid_content_type", "Expected multipart form data.")
    })?;
    let credential = resolve_credential(&headers, &state.config)?;

    let upload = read_transcription_form(multipart).await?;
    let form = transcription_form(upload)?;
    let reply = state.nele.transcribe(&credential, form).await?;
    if !reply.is_success() {
        warn!(status = %reply.status, "upstream transcription failed");
    }
    let transcription: NeleTranscription = reply.into_success()?.json()?;
    Ok(Json(TranscriptionResponse::from(transcription)).into_response())
}

async fn image_generations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = resolve_credential(&headers, &state.config)?;
    let request: ImageGenerationRequest =
        serde_json::from_slice(&body).map_err(GatewayError::InvalidJson)?;
    let payload = request.into_payload()?;
    info!(model = %payload.model, "image generation request received");

    let reply = state.nele.generate_image(&credential, &payload).await?;
    if !reply.is_success() {
        warn!(status = %reply.status, "upstream image generation failed");
    }
    let result: NeleImageResult = reply.into_success()?.json()?;
    Ok(Json(ImageGenerationResponse::from(result)).into_response())
}
