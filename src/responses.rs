//! `/v1/responses` support: input collection and the response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::completion::unix_now;
use crate::error::GatewayError;
use crate::wire::{GenerationOptions, InboundMessage, NeleChatResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub max_output_tokens: Option<Value>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl ResponsesRequest {
    pub fn stream_requested(&self) -> bool {
        self.stream == Some(true)
    }

    /// Generation options with `max_output_tokens` folded into `max_tokens`.
    pub fn generation_options(&self) -> GenerationOptions {
        let mut options = self.options.clone();
        if let Some(max_output_tokens) = &self.max_output_tokens {
            options.max_tokens = Some(max_output_tokens.clone());
        }
        options
    }
}

/// Collects chat messages from either `messages` or the polymorphic `input`.
pub fn collect_messages(request: &ResponsesRequest) -> Result<Vec<InboundMessage>, GatewayError> {
    let mut messages = Vec::new();

    if let Some(value) = &request.messages {
        let Value::Array(items) = value else {
            return Err(GatewayError::invalid_input("messages must be an array."));
        };
        for item in items.iter().filter(|item| item.is_object()) {
            messages.push(parse_message(item)?);
        }
        return non_empty(messages);
    }

    match &request.input {
        None => Err(GatewayError::invalid_input(
            "Either input or messages is required.",
        )),
        Some(Value::String(text)) => Ok(vec![InboundMessage::user(text.clone())]),
        Some(Value::Array(items)) => {
            for item in items {
                match item {
                    Value::String(text) => messages.push(InboundMessage::user(text.clone())),
                    Value::Object(fields) => match fields.get("messages") {
                        Some(Value::Array(nested)) => {
                            for nested in nested.iter().filter(|n| n.is_object()) {
                                messages.push(parse_message(nested)?);
                            }
                        }
                        _ => messages.push(parse_message(item)?),
                    },
                    _ => {}
                }
            }
            non_empty(messages)
        }
        Some(_) => Err(GatewayError::invalid_input("Unsupported input format.")),
    }
}

fn parse_message(value: &Value) -> Result<InboundMessage, GatewayError> {
    serde_json::from_value(value.clone())
        .map_err(|err| GatewayError::invalid_input(format!("Invalid input message: {err}")))
}

fn non_empty(messages: Vec<InboundMessage>) -> Result<Vec<InboundMessage>, GatewayError> {
    if messages.is_empty() {
        Err(GatewayError::invalid_input("No input messages were provided."))
    } else {
        Ok(messages)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseObject {
    pub id: String,
    pub object: &'static str,
    pub created_at: i64,
    pub model: String,
    pub status: &'static str,
    pub output: Vec<OutputMessage>,
    pub output_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: &'static str,
    pub status: &'static str,
    pub content: Vec<OutputText>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputText {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ResponseObject {
    pub fn from_backend(model: &str, result: NeleChatResult) -> Self {
        let text = result.content.unwrap_or_default();
        Self {
            id: format!("resp_{}", Uuid::now_v7().simple()),
            object: "response",
            created_at: unix_now(),
            model: model.to_string(),
            status: "completed",
            output: vec![OutputMessage {
                id: format!("msg_{}", Uuid::now_v7().simple()),
                kind: "message",
                role: "assistant",
                status: "completed",
                content: vec![OutputText {
                    kind: "output_text",
                    text: text.clone(),
                }],
            }],
            output_text: text,
        }
    }
}
