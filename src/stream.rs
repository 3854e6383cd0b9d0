//! Emulated streaming over a completed backend answer.
//!
//! The backend answers in one piece, so the stream is a fixed sequence: a role
//! chunk carrying the whole content, a finish chunk, an optional usage chunk and
//! the `[DONE]` sentinel. Each item becomes its own body frame.

use std::convert::Infallible;

use async_stream::stream;
use axum::body::{Body, Bytes};
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::backend::UpstreamReply;
use crate::completion::{ChatCompletion, FinishReason, Usage};
use crate::error::GatewayError;

pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search_results: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub finish_reason: Option<FinishReason>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Value>,
}

impl ChatCompletionChunk {
    fn for_completion(completion: &ChatCompletion, choices: Vec<ChunkChoice>) -> Self {
        Self {
            id: completion.id.clone(),
            object: "chat.completion.chunk",
            created: completion.created,
            model: completion.model.clone(),
            choices,
            usage: None,
            web_search_results: None,
        }
    }
}

/// Chunk sequence for one completion, without the `[DONE]` sentinel.
pub fn completion_chunks(
    completion: &ChatCompletion,
    include_usage: bool,
) -> Vec<ChatCompletionChunk> {
    let choice = completion.choice();
    let message = &choice.message;

    let role_delta = ChunkDelta {
        role: Some("assistant"),
        content: message
            .content
            .clone()
            .filter(|content| !content.trim().is_empty()),
        tool_calls: message.tool_calls.clone(),
    };
    let mut chunks = vec![ChatCompletionChunk::for_completion(
        completion,
        vec![ChunkChoice {
            index: 0,
            delta: role_delta,
            finish_reason: None,
        }],
    )];

    let mut finish = ChatCompletionChunk::for_completion(
        completion,
        vec![ChunkChoice {
            index: 0,
            delta: ChunkDelta::default(),
            finish_reason: Some(choice.finish_reason),
        }],
    );
    finish.web_search_results = completion.web_search_results.clone();
    chunks.push(finish);

    if include_usage {
        let mut usage = ChatCompletionChunk::for_completion(completion, Vec::new());
        usage.usage = Some(completion.usage);
        chunks.push(usage);
    }

    chunks
}

pub fn emulate_stream(
    completion: ChatCompletion,
    include_usage: bool,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream! {
        for chunk in completion_chunks(&completion, include_usage) {
            yield Ok(sse_data(&chunk));
        }
        yield Ok(Bytes::from_static(DONE_FRAME));
    }
}

pub fn sse_response(completion: ChatCompletion, include_usage: bool) -> Response {
    let body = Body::from_stream(emulate_stream(completion, include_usage));
    (
        StatusCode::OK,
        [
            (
                CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream; charset=utf-8"),
            ),
            (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (CONNECTION, HeaderValue::from_static("keep-alive")),
            (
                HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        body,
    )
        .into_response()
}

/// Error for a failed backend call on the streaming path: a bodyless failure
/// is replaced by a synthesized envelope, anything else is forwarded.
pub fn stream_failure(reply: UpstreamReply) -> GatewayError {
    warn!(status = %reply.status, "upstream chat completion failed");
    if reply.body_is_blank() {
        GatewayError::upstream_no_body(reply.status)
    } else {
        GatewayError::Upstream(reply)
    }
}

fn sse_data<T: Serialize>(payload: &T) -> Bytes {
    let json_payload = serde_json::to_string(payload).unwrap_or_else(|_| {
        "{\"error\":{\"message\":\"internal serialization error\",\"type\":\"server_error\",\"code\":\"serialization_error\"}}".to_string()
    });
    Bytes::from(format!("data: {json_payload}\n\n"))
}
