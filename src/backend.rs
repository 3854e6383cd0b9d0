//! HTTP client for the Nele backend.
//!
//! Every call returns the raw [`UpstreamReply`] so callers decide whether a
//! non-success status is forwarded verbatim or replaced.

use axum::body::Body;
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::GatewayError;

pub const CHAT_COMPLETION_PATH: &str = "chat-completion-sync";
pub const IMAGE_ATTACHMENT_PATH: &str = "image-attachment";
pub const MODELS_PATH: &str = "models";
pub const TRANSCRIPTION_PATH: &str = "transcription";
pub const IMAGE_GENERATION_PATH: &str = "image";

/// Status, content type and body of one backend response.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl UpstreamReply {
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            content_type,
            body,
        })
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body_is_blank(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Passes success replies through; anything else becomes a forwarded error.
    pub fn into_success(self) -> Result<Self, GatewayError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(GatewayError::Upstream(self))
        }
    }

    /// Decodes a success body, mapping empty or malformed bodies to 502.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        if self.body_is_blank() {
            return Err(GatewayError::bad_upstream(
                "upstream_no_body",
                "Upstream returned an empty body.",
            ));
        }
        serde_json::from_slice(&self.body).map_err(|err| {
            GatewayError::bad_upstream(
                "upstream_invalid_body",
                format!("Upstream returned an unreadable body: {err}"),
            )
        })
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        (self.status, [(CONTENT_TYPE, content_type)], Body::from(self.body)).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct NeleClient {
    http: Client,
    base_url: String,
}

impl NeleClient {
    /// `base_url` must already end in `/`.
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Base URL extended by `segments`. Each segment is percent-encoded as a
    /// whole, so `/`, `?` and `#` inside an id cannot change the target path.
    pub fn segment_url(
        &self,
        segments: &[&str],
        query: Option<&str>,
    ) -> Result<Url, GatewayError> {
        let invalid_base = || {
            GatewayError::bad_upstream(
                "invalid_base_url",
                format!("Configured base URL cannot carry a path: {}", self.base_url),
            )
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|()| invalid_base())?
            .pop_if_empty()
            .extend(segments);
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    pub async fn chat_completion_sync<T: Serialize + ?Sized>(
        &self,
        credential: &str,
        payload: &T,
    ) -> Result<UpstreamReply, GatewayError> {
        let request = self
            .http
            .post(self.endpoint(CHAT_COMPLETION_PATH))
            .json(payload);
        self.send(request, credential).await
    }

    pub async fn upload_image_attachment(
        &self,
        credential: &str,
        form: Form,
    ) -> Result<UpstreamReply, GatewayError> {
        let request = self
            .http
            .post(self.endpoint(IMAGE_ATTACHMENT_PATH))
            .multipart(form);
        self.send(request, credential).await
    }

    pub async fn list_models(
        &self,
        credential: &str,
        accept_language: Option<&HeaderValue>,
    ) -> Result<UpstreamReply, GatewayError> {
        let mut request = self.http.get(self.endpoint(MODELS_PATH));
        if let Some(language) = accept_language {
            request = request.header(ACCEPT_LANGUAGE, language.clone());
        }
        self.send(request, credential).await
    }

    pub async fn transcribe(
        &self,
        credential: &str,
        form: Form,
    ) -> Result<UpstreamReply, GatewayError> {
        let request = self
            .http
            .post(self.endpoint(TRANSCRIPTION_PATH))
            .multipart(form);
        self.send(request, credential).await
    }

    pub async fn generate_image<T: Serialize + ?Sized>(
        &self,
        credential: &str,
        payload: &T,
    ) -> Result<UpstreamReply, GatewayError> {
        let request = self
            .http
            .post(self.endpoint(IMAGE_GENERATION_PATH))
            .json(payload);
        self.send(request, credential).await
    }

    /// Raw pass-through used by the knowledge routes.
    pub async fn forward(
        &self,
        credential: &str,
        method: Method,
        url: Url,
        content_type: Option<&HeaderValue>,
        accept_language: Option<&HeaderValue>,
        body: Option<Bytes>,
    ) -> Result<UpstreamReply, GatewayError> {
        let mut request = self.http.request(method, url);
        if let Some(language) = accept_language {
            request = request.header(ACCEPT_LANGUAGE, language.clone());
        }
        if let Some(body) = body {
            if let Some(content_type) = content_type {
                request = request.header(CONTENT_TYPE, content_type.clone());
            }
            request = request.body(body);
        }
        self.send(request, credential).await
    }

    async fn send(
        &self,
        request: RequestBuilder,
        credential: &str,
    ) -> Result<UpstreamReply, GatewayError> {
        let response = request.bearer_auth(credential).send().await?;
        let reply = UpstreamReply::read(response).await?;
        debug!(status = %reply.status, bytes = reply.body.len(), "backend replied");
        Ok(reply)
    }
}
