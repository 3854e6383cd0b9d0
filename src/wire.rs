//! Typed request shapes for the public protocol and the Nele backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Public protocol (inbound)
// =============================================================================

/// Fields shared by `/v1/chat/completions` and `/v1/responses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<Value>,
    #[serde(default)]
    pub temperature: Option<Value>,
    /// Opaque; only function descriptions are touched.
    #[serde(default)]
    pub tools: Option<Value>,
    #[serde(default)]
    pub tool_choice: Option<Value>,
    #[serde(default, rename = "documentCollectionId")]
    pub document_collection_id: Option<String>,
    #[serde(default)]
    pub web_search: Option<Value>,
    #[serde(default, rename = "modelConfiguration")]
    pub model_configuration: Option<Value>,
    #[serde(default)]
    pub reasoning_effort: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub messages: Option<Vec<InboundMessage>>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub stream_options: Option<StreamOptions>,
    #[serde(flatten)]
    pub options: GenerationOptions,
}

impl ChatCompletionRequest {
    pub fn stream_requested(&self) -> bool {
        self.stream == Some(true)
    }

    pub fn include_usage(&self) -> bool {
        self.stream_options
            .as_ref()
            .and_then(|options| options.include_usage)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamOptions {
    #[serde(default)]
    pub include_usage: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Pre-existing backend attachments, passed through untouched.
    #[serde(default)]
    pub attachments: Option<Value>,
    #[serde(default)]
    pub results: Option<Value>,
}

impl InboundMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            content: Some(MessageContent::Text(text.into())),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One typed part of an array `content`. The `type` tag matches without
/// regard to ASCII case; unknown tags become `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawContentPart")]
pub enum ContentPart {
    Text { text: Option<String> },
    InputText { text: Option<String> },
    ImageUrl { image_url: Option<ImageUrl> },
    Other,
}

#[derive(Deserialize)]
struct RawContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Value,
    #[serde(default)]
    image_url: Value,
}

impl TryFrom<RawContentPart> for ContentPart {
    type Error = String;

    fn try_from(raw: RawContentPart) -> Result<Self, Self::Error> {
        let text = |value: Value| match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            other => Err(format!("content part text must be a string, got {other}")),
        };
        let kind = raw.kind.to_ascii_lowercase();
        Ok(match kind.as_str() {
            "text" => Self::Text {
                text: text(raw.text)?,
            },
            "input_text" => Self::InputText {
                text: text(raw.text)?,
            },
            "image_url" => Self::ImageUrl {
                image_url: serde_json::from_value(raw.image_url)
                    .map_err(|err| format!("invalid image_url part: {err}"))?,
            },
            _ => Self::Other,
        })
    }
}

impl ContentPart {
    /// Text carried by `text`/`input_text` parts.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { text } | Self::InputText { text } => text.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageUrl {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

// =============================================================================
// Nele backend
// =============================================================================

/// Body of `POST chat-completion-sync`. Field order is fixed so the same
/// request always serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeleChatPayload {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(rename = "documentCollectionId", skip_serializing_if = "Option::is_none")]
    pub document_collection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_search: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    #[serde(rename = "modelConfiguration", skip_serializing_if = "Option::is_none")]
    pub model_configuration: Option<Map<String, Value>>,
    pub messages: Vec<NeleMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NeleMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<NeleAttachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NeleAttachment {
    Image(ImageAttachment),
    Passthrough(Value),
}

/// Reference to an image uploaded through `image-attachment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAttachment {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ImageAttachment {
    pub fn new(path: String, name: String, detail: Option<String>) -> Self {
        Self {
            kind: "image",
            id: path.clone(),
            name,
            content: path,
            detail: detail.filter(|d| !d.trim().is_empty()),
        }
    }
}

/// Success body of `chat-completion-sync`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeleChatResult {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Value>,
    #[serde(default)]
    pub web_search_results: Option<Value>,
}
