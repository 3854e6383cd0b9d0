use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use nele_openai_gateway::{AppState, GatewayConfig, router};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNSET_KEY_ENV: &str = "NELE_GATEWAY_TESTS_UNSET_KEY";

fn config_for(backend: &MockServer) -> GatewayConfig {
    GatewayConfig {
        base_url: format!("{}/", backend.uri()),
        api_key_env: UNSET_KEY_ENV.to_string(),
        ..GatewayConfig::default()
    }
    .normalized()
}

fn app(config: GatewayConfig) -> Router {
    router(Arc::new(AppState::new(config).expect("state")))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(AUTHORIZATION, "Bearer test-key")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(AUTHORIZATION, "Bearer test-key")
        .body(Body::empty())
        .expect("request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.expect("body").to_bytes();
    (status, headers, body)
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("json body")
}

fn error_code(body: &Bytes) -> String {
    json_body(body)["error"]["code"]
        .as_str()
        .expect("error code")
        .to_string()
}

async fn mount_chat_result(backend: &MockServer, result: Value) {
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(result))
        .expect(1)
        .mount(backend)
        .await;
}

/// Body of the single chat call the backend received.
async fn sent_chat_payload(backend: &MockServer) -> Value {
    let requests = backend.received_requests().await.expect("recording enabled");
    let chat = requests
        .iter()
        .find(|r| r.url.path() == "/chat-completion-sync")
        .expect("chat call");
    serde_json::from_slice(&chat.body).expect("payload json")
}

fn sse_payloads(body: &Bytes) -> Vec<String> {
    String::from_utf8(body.to_vec())
        .expect("utf8")
        .split("\n\n")
        .filter(|frame| !frame.is_empty())
        .map(|frame| frame.strip_prefix("data: ").expect("data frame").to_string())
        .collect()
}

#[tokio::test]
async fn plain_chat_returns_backend_content() {
    let backend = MockServer::start().await;
    mount_chat_result(&backend, json!({"content": "hello back"})).await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let completion = json_body(&body);
    assert_eq!(completion["object"], "chat.completion");
    assert_eq!(completion["model"], "m");
    assert_eq!(completion["choices"][0]["message"]["content"], "hello back");
    assert_eq!(completion["choices"][0]["finish_reason"], "stop");

    let payload = sent_chat_payload(&backend).await;
    assert_eq!(
        payload,
        json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]})
    );
}

#[tokio::test]
async fn streamed_chat_emits_role_finish_and_done() {
    let backend = MockServer::start().await;
    mount_chat_result(&backend, json!({"content": "hello back"})).await;

    let (status, headers, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"model": "m", "stream": true, "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[CONTENT_TYPE], "text/event-stream; charset=utf-8");
    let frames = sse_payloads(&body);
    assert_eq!(frames.len(), 3);

    let role: Value = serde_json::from_str(&frames[0]).expect("role chunk");
    assert_eq!(
        role["choices"][0]["delta"],
        json!({"role": "assistant", "content": "hello back"})
    );
    let finish: Value = serde_json::from_str(&frames[1]).expect("finish chunk");
    assert_eq!(finish["choices"][0]["delta"], json!({}));
    assert_eq!(finish["choices"][0]["finish_reason"], "stop");
    assert_eq!(frames[2], "[DONE]");
}

#[tokio::test]
async fn usage_chunk_needs_an_explicit_stream_request() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "x"})))
        .expect(2)
        .mount(&backend)
        .await;
    let config = GatewayConfig {
        force_stream: true,
        ..config_for(&backend)
    };

    let forced = json!({
        "messages": [{"role": "user", "content": "hi"}],
        "stream_options": {"include_usage": true}
    });
    let (_, _, body) = send(app(config.clone()), post_json("/v1/chat/completions", forced)).await;
    assert_eq!(sse_payloads(&body).len(), 3);

    let explicit = json!({
        "stream": true,
        "messages": [{"role": "user", "content": "hi"}],
        "stream_options": {"include_usage": true}
    });
    let (_, _, body) = send(app(config), post_json("/v1/chat/completions", explicit)).await;
    let frames = sse_payloads(&body);
    assert_eq!(frames.len(), 4);
    let usage: Value = serde_json::from_str(&frames[2]).expect("usage chunk");
    assert_eq!(usage["choices"], json!([]));
    assert_eq!(usage["usage"]["total_tokens"], 0);
}

#[tokio::test]
async fn failed_image_download_aborts_before_the_chat_call() {
    let backend = MockServer::start().await;
    let images = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&images)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "x"})))
        .expect(0)
        .mount(&backend)
        .await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": [
                {"type": "image_url", "image_url": {"url": format!("{}/x.png", images.uri())}}
            ]}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_image_url");
    assert!(
        json_body(&body)["error"]["message"]
            .as_str()
            .expect("message")
            .contains("404")
    );
}

#[tokio::test]
async fn images_are_uploaded_and_attached_in_order() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-attachment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": "uploads/a.png"})))
        .expect(1)
        .mount(&backend)
        .await;
    mount_chat_result(&backend, json!({"content": "a cat"})).await;

    let (status, _, _) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{
                "role": "developer",
                "content": [
                    {"type": "text", "text": "what is"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBORw0KGgo=", "detail": "low"}},
                    {"type": "input_text", "text": "this?"}
                ],
                "attachments": [{"type": "file", "id": "f1"}]
            }]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payload = sent_chat_payload(&backend).await;
    let message = &payload["messages"][0];
    assert_eq!(message["role"], "system");
    assert_eq!(message["content"], "what is\nthis?");
    assert_eq!(
        message["attachments"],
        json!([
            {"type": "image", "id": "uploads/a.png", "name": "image.png", "content": "uploads/a.png", "detail": "low"},
            {"type": "file", "id": "f1"}
        ])
    );
}

#[tokio::test]
async fn default_collection_yields_to_web_search() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "x"})))
        .mount(&backend)
        .await;
    let config = GatewayConfig {
        default_document_collection_id: Some("kb-1".to_string()),
        ..config_for(&backend)
    };
    let messages = json!([{"role": "user", "content": "hi"}]);

    send(
        app(config.clone()),
        post_json("/v1/chat/completions", json!({"messages": messages})),
    )
    .await;
    assert_eq!(sent_chat_payload(&backend).await["documentCollectionId"], "kb-1");

    backend.reset().await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "x"})))
        .mount(&backend)
        .await;
    send(
        app(config),
        post_json(
            "/v1/chat/completions",
            json!({"messages": messages, "web_search": {"enabled": true}}),
        ),
    )
    .await;
    let payload = sent_chat_payload(&backend).await;
    assert!(payload.get("documentCollectionId").is_none());
    assert_eq!(payload["web_search"], json!({"enabled": true}));
}

#[tokio::test]
async fn tool_calls_finish_with_tool_calls() {
    let backend = MockServer::start().await;
    let calls = json!([{
        "id": "call_1",
        "type": "function",
        "function": {"name": "lookup", "arguments": "{}"}
    }]);
    mount_chat_result(&backend, json!({"content": null, "tool_calls": calls})).await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let completion = json_body(&body);
    assert_eq!(completion["choices"][0]["finish_reason"], "tool_calls");
    assert_eq!(completion["choices"][0]["message"]["tool_calls"], calls);
}

#[tokio::test]
async fn tools_reach_the_backend_with_capped_descriptions() {
    let backend = MockServer::start().await;
    mount_chat_result(&backend, json!({"content": "done"})).await;

    let tools = json!([
        {"type": "function", "function": {"name": "lookup", "description": "d".repeat(1200)}},
        {"type": "function", "function": {"name": "noop"}}
    ]);
    let (status, _, _) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "hi"}], "tools": tools}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let payload = sent_chat_payload(&backend).await;
    let sent = payload["tools"].as_array().expect("tools array");
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent[0]["function"]["description"],
        Value::String("d".repeat(1000))
    );
    assert_eq!(sent[1]["function"], json!({"name": "noop"}));
}

#[tokio::test]
async fn missing_credential_is_unauthorized() {
    let backend = MockServer::start().await;
    let request = Request::post("/v1/chat/completions")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"messages\":[]}"))
        .expect("request");

    let (status, _, body) = send(app(config_for(&backend)), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "missing_api_key");
    assert!(backend.received_requests().await.expect("recording").is_empty());
}

#[tokio::test]
async fn malformed_body_is_invalid_json() {
    let backend = MockServer::start().await;
    let request = Request::post("/v1/chat/completions")
        .header("x-api-key", "test-key")
        .body(Body::from("{"))
        .expect("request");

    let (status, _, body) = send(app(config_for(&backend)), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_json");
}

#[tokio::test]
async fn backend_errors_are_forwarded_verbatim() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_raw("{\"message\":\"slow down\"}", "application/json"),
        )
        .mount(&backend)
        .await;

    let (status, headers, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(body, Bytes::from_static(b"{\"message\":\"slow down\"}"));
}

#[tokio::test]
async fn streamed_bodyless_failure_gets_an_envelope() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat-completion-sync"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&backend)
        .await;

    let (status, headers, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"stream": true, "messages": [{"role": "user", "content": "hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    let envelope = json_body(&body);
    assert_eq!(envelope["error"]["type"], "upstream_error");
    assert_eq!(envelope["error"]["code"], "upstream_no_body");
}

#[tokio::test]
async fn responses_wraps_the_backend_answer() {
    let backend = MockServer::start().await;
    mount_chat_result(&backend, json!({"content": "pong"})).await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/responses",
            json!({"model": "m", "input": "ping", "max_output_tokens": 64}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response = json_body(&body);
    assert_eq!(response["object"], "response");
    assert_eq!(response["output_text"], "pong");
    assert_eq!(response["output"][0]["content"][0]["text"], "pong");

    let payload = sent_chat_payload(&backend).await;
    assert_eq!(payload["max_tokens"], 64);
    assert_eq!(payload["messages"], json!([{"role": "user", "content": "ping"}]));
}

#[tokio::test]
async fn responses_rejects_streaming() {
    let backend = MockServer::start().await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json("/v1/responses", json!({"input": "ping", "stream": true})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "streaming_not_supported");
    assert!(backend.received_requests().await.expect("recording").is_empty());
}

async fn mount_catalog(backend: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{"id": "gpt-4o"}],
            "team_models": [{"id": "team-llm"}],
            "image_generators": [{"id": "gpt-image-1"}]
        })))
        .mount(backend)
        .await;
}

#[tokio::test]
async fn models_are_listed_from_the_catalog() {
    let backend = MockServer::start().await;
    mount_catalog(&backend).await;

    let (status, _, body) = send(app(config_for(&backend)), get("/v1/models")).await;

    assert_eq!(status, StatusCode::OK);
    let list = json_body(&body);
    assert_eq!(list["object"], "list");
    let ids: Vec<&str> = list["data"]
        .as_array()
        .expect("data")
        .iter()
        .filter_map(|m| m["id"].as_str())
        .collect();
    assert_eq!(ids, ["gpt-4o", "team-llm", "gpt-image-1"]);
    assert_eq!(list["data"][0]["owned_by"], "nele");
}

#[tokio::test]
async fn single_model_lookup_and_not_found() {
    let backend = MockServer::start().await;
    mount_catalog(&backend).await;

    let (status, _, body) = send(app(config_for(&backend)), get("/v1/models/TEAM-LLM")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], "TEAM-LLM");

    let (status, _, body) = send(app(config_for(&backend)), get("/v1/models/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "model_not_found");
}

#[tokio::test]
async fn transcription_maps_whisper_and_returns_text() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transcription"))
        .and(body_string_contains("azure-whisper"))
        .and(body_string_contains("filename=\"clip.mp3\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello world"})))
        .expect(1)
        .mount(&backend)
        .await;

    let boundary = "gatewayboundary";
    let form = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"model\"\r\n\r\nwhisper-1\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"clip.mp3\"\r\n\
         Content-Type: audio/mpeg\r\n\r\nID3audio\r\n--{boundary}--\r\n"
    );
    let request = Request::post("/v1/audio/transcriptions")
        .header(AUTHORIZATION, "Bearer test-key")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(form))
        .expect("request");

    let (status, _, body) = send(app(config_for(&backend)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"text": "hello world"}));
}

#[tokio::test]
async fn transcription_requires_multipart() {
    let backend = MockServer::start().await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json("/v1/audio/transcriptions", json!({"file": "nope"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_content_type");
}

#[tokio::test]
async fn image_generation_applies_defaults() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image"))
        .and(body_json(json!({
            "model": "dall-e-3",
            "prompt": "a cat",
            "modelConfiguration": {"quality": "standard", "size": "1024x1024"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://img.example/cat.png",
            "revisedPrompt": "a fluffy cat"
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/images/generations",
            json!({"model": "dall-e-3", "prompt": "a cat", "n": 1}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let generated = json_body(&body);
    assert_eq!(
        generated["data"],
        json!([{"url": "https://img.example/cat.png", "revised_prompt": "a fluffy cat"}])
    );
    assert!(generated["created"].is_i64());
}

#[tokio::test]
async fn image_generation_rejects_multiple_images() {
    let backend = MockServer::start().await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/images/generations",
            json!({"model": "dall-e-3", "prompt": "a cat", "n": 3}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "unsupported_n");
}

#[tokio::test]
async fn knowledge_routes_pass_through() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/document-collections"))
        .and(query_param("page", "2"))
        .and(header("accept-language", "de"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("[{\"id\":\"c1\"}]", "application/json"),
        )
        .expect(1)
        .mount(&backend)
        .await;
    Mock::given(method("POST"))
        .and(path("/document-collections/c1/search"))
        .and(body_json(json!({"query": "invoices"})))
        .respond_with(ResponseTemplate::new(404).set_body_raw("missing", "text/plain"))
        .expect(1)
        .mount(&backend)
        .await;

    let list = Request::get("/v1/knowledge/collections?page=2")
        .header(AUTHORIZATION, "Bearer test-key")
        .header("accept-language", "de")
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(app(config_for(&backend)), list).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([{"id": "c1"}]));

    let (status, headers, body) = send(
        app(config_for(&backend)),
        post_json("/v1/knowledge/collections/c1/search", json!({"query": "invoices"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[CONTENT_TYPE], "text/plain");
    assert_eq!(body, Bytes::from_static(b"missing"));
}

#[tokio::test]
async fn knowledge_ids_stay_inside_their_collection_path() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&backend)
        .await;

    let (status, _, _) = send(
        app(config_for(&backend)),
        get("/v1/knowledge/collections/..%2F..%2Fadmin%3Fx=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let requests = backend.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.path(),
        "/document-collections/..%2F..%2Fadmin%3Fx=1"
    );
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn dot_knowledge_ids_are_rejected() {
    let backend = MockServer::start().await;

    let (status, _, body) = send(
        app(config_for(&backend)),
        get("/v1/knowledge/items/%2E%2E"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_input");
    let requests = backend.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn large_inline_images_fit_the_default_body_limit() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-attachment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"path": "uploads/big.png"})))
        .expect(1)
        .mount(&backend)
        .await;
    mount_chat_result(&backend, json!({"content": "a large picture"})).await;

    // 4 MiB of base64 decodes to 3 MiB of image data.
    let image = format!("data:image/png;base64,{}", "A".repeat(4 * 1024 * 1024));
    let (status, _, body) = send(
        app(config_for(&backend)),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{
                "role": "user",
                "content": [{"type": "image_url", "image_url": {"url": image}}]
            }]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_body(&body)["choices"][0]["message"]["content"],
        "a large picture"
    );
}

#[tokio::test]
async fn bodies_over_the_configured_limit_are_refused() {
    let backend = MockServer::start().await;
    let config = GatewayConfig {
        max_body_bytes: 1024,
        ..config_for(&backend)
    };

    let (status, _, _) = send(
        app(config),
        post_json(
            "/v1/chat/completions",
            json!({"messages": [{"role": "user", "content": "x".repeat(4096)}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let requests = backend.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn root_reports_credential_configuration() {
    let backend = MockServer::start().await;

    let (_, _, body) = send(app(config_for(&backend)), get("/")).await;
    assert_eq!(body, Bytes::from_static(b"API not provided"));

    let config = GatewayConfig {
        api_key: Some("configured".to_string()),
        ..config_for(&backend)
    };
    let (_, _, body) = send(app(config), get("/")).await;
    assert_eq!(body, Bytes::from_static(b"Nele OpenAI Proxy running."));

    let (status, _, body) = send(app(config_for(&backend)), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Bytes::from_static(b"ok"));
}
