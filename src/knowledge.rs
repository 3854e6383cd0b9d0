//! Knowledge-management pass-through onto the backend's document collections.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{FromRequest, Path, Request};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use tracing::{debug, info, warn};

use crate::credentials::resolve_credential;
use crate::error::GatewayError;
use crate::server::AppState;

const COLLECTIONS: &str = "document-collections";
const ITEMS: &str = "document-collection-items";

/// Routes mounted under `/v1/knowledge`, one line per backend path.
pub fn routes() -> Router<Arc<AppState>> {
    let collection = |Path(id): Path<String>, request: Forwarded| async move {
        request.send(&[COLLECTIONS, &id]).await
    };
    let item = |Path(id): Path<String>, request: Forwarded| async move {
        request.send(&[ITEMS, &id]).await
    };

    Router::new()
        .route(
            "/models",
            get(|request: Forwarded| async move { request.send(&["models"]).await }),
        )
        .route(
            "/collections",
            get(|request: Forwarded| async move { request.send(&[COLLECTIONS]).await })
                .post(|request: Forwarded| async move { request.send(&[COLLECTIONS]).await }),
        )
        .route(
            "/collections/{collection}",
            get(collection).put(collection).delete(collection),
        )
        .route(
            "/collections/{collection}/items",
            post(|Path(id): Path<String>, request: Forwarded| async move {
                request.send(&[COLLECTIONS, &id, "items"]).await
            }),
        )
        .route(
            "/collections/{collection}/from-url",
            post(|Path(id): Path<String>, request: Forwarded| async move {
                request.send(&[COLLECTIONS, &id, "from-url"]).await
            }),
        )
        .route(
            "/collections/{collection}/embed",
            put(|Path(id): Path<String>, request: Forwarded| async move {
                request.send(&[COLLECTIONS, &id, "embed"]).await
            }),
        )
        .route(
            "/collections/{collection}/search",
            post(|Path(id): Path<String>, request: Forwarded| async move {
                request.send(&[COLLECTIONS, &id, "search"]).await
            }),
        )
        .route("/items/{item}", get(item).delete(item))
        .route(
            "/items/{item}/embed",
            put(|Path(id): Path<String>, request: Forwarded| async move {
                request.send(&[ITEMS, &id, "embed"]).await
            }),
        )
}

/// Everything a proxied call carries over from the inbound request.
struct Forwarded {
    state: Arc<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<String>,
    body: Bytes,
}

impl FromRequest<Arc<AppState>> for Forwarded {
    type Rejection = Response;

    async fn from_request(
        request: Request,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let method = request.method().clone();
        let headers = request.headers().clone();
        let query = request.uri().query().map(str::to_string);
        let body = Bytes::from_request(request, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Self {
            state: Arc::clone(state),
            method,
            headers,
            query,
            body,
        })
    }
}

impl Forwarded {
    async fn send(self, segments: &[&str]) -> Result<Response, GatewayError> {
        if let Some(bad) = segments.iter().find(|s| is_relative_segment(s)) {
            return Err(GatewayError::invalid_input(format!(
                "Invalid knowledge identifier: {bad:?}."
            )));
        }

        let credential = resolve_credential(&self.headers, &self.state.config)?;
        let url = self
            .state
            .nele
            .segment_url(segments, self.query.as_deref())?;
        let content_type = self.headers.get(CONTENT_TYPE);

        info!(
            method = %self.method,
            path = %url.path(),
            content_type = content_type.and_then(|v| v.to_str().ok()).unwrap_or_default(),
            content_length = self.body.len(),
            "knowledge proxy request"
        );

        let body = carries_body(&self.method).then_some(self.body);
        let path = url.path().to_string();
        let reply = self
            .state
            .nele
            .forward(
                &credential,
                self.method,
                url,
                content_type,
                self.headers.get(ACCEPT_LANGUAGE),
                body,
            )
            .await?;

        if reply.is_success() {
            debug!(path = %path, status = %reply.status, "knowledge proxy call completed");
        } else {
            warn!(path = %path, status = %reply.status, "knowledge proxy call failed");
        }
        Ok(reply.into_response())
    }
}

/// GET, HEAD and DELETE never carry a body.
fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Blank, `.` and `..` ids would collapse onto the parent path.
fn is_relative_segment(segment: &str) -> bool {
    matches!(segment.trim(), "" | "." | "..")
}
