//! Audio transcription and image generation translation.

use axum::extract::Multipart;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::completion::unix_now;
use crate::config::non_blank;
use crate::error::GatewayError;

const BACKEND_WHISPER_MODEL: &str = "azure-whisper";
const GPT_IMAGE_MODEL: &str = "gpt-image-1";

// =============================================================================
// Transcription
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct TranscriptionUpload {
    pub file: Option<UploadedFile>,
    pub model: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Reads the `file`, `model` and `language` fields of a transcription form.
pub async fn read_transcription_form(
    mut multipart: Multipart,
) -> Result<TranscriptionUpload, GatewayError> {
    let malformed = |err: axum::extract::multipart::MultipartError| {
        GatewayError::invalid_request(
            "invalid_content_type",
            format!("Malformed multipart form data: {err}"),
        )
    };

    let mut upload = TranscriptionUpload::default();
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("audio").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(malformed)?.to_vec();
                upload.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "model" => upload.model = field.text().await.map_err(malformed)?,
            "language" => upload.language = field.text().await.map_err(malformed)?,
            _ => {}
        }
    }
    Ok(upload)
}

/// `whisper-1` (and a blank model) map onto the backend's whisper deployment.
pub fn map_transcription_model(model: &str) -> &str {
    match model.trim() {
        "" | "whisper-1" => BACKEND_WHISPER_MODEL,
        other => other,
    }
}

pub fn transcription_form(upload: TranscriptionUpload) -> Result<Form, GatewayError> {
    let file = upload.file.ok_or_else(|| {
        GatewayError::invalid_request("missing_file", "Missing form field: file.")
    })?;

    let mut form = Form::new().text("model", map_transcription_model(&upload.model).to_string());
    if !upload.language.trim().is_empty() {
        form = form.text("language", upload.language);
    }

    let mut part = Part::bytes(file.data).file_name(file.file_name);
    if let Some(content_type) = file.content_type.filter(|ct| !ct.trim().is_empty()) {
        part = part.mime_str(&content_type).map_err(|_| {
            GatewayError::invalid_request(
                "invalid_content_type",
                format!("Unsupported file content type: {content_type}."),
            )
        })?;
    }
    Ok(form.part("file", part))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeleTranscription {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

impl From<NeleTranscription> for TranscriptionResponse {
    fn from(value: NeleTranscription) -> Self {
        Self {
            text: value.text.unwrap_or_default(),
        }
    }
}

// =============================================================================
// Image generation
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageGenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub response_format: Option<String>,
    #[serde(default)]
    pub n: Option<Value>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeleImagePayload {
    pub model: String,
    pub prompt: String,
    #[serde(rename = "modelConfiguration")]
    pub model_configuration: ImageModelConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageModelConfiguration {
    pub quality: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl ImageGenerationRequest {
    /// Validates the request and applies per-model defaults.
    pub fn into_payload(self) -> Result<NeleImagePayload, GatewayError> {
        let (Some(prompt), Some(model)) = (non_blank(self.prompt), non_blank(self.model)) else {
            return Err(GatewayError::invalid_request(
                "missing_fields",
                "Fields 'prompt' and 'model' are required.",
            ));
        };

        if let Some(format) = non_blank(self.response_format)
            && !format.eq_ignore_ascii_case("url")
        {
            return Err(GatewayError::invalid_request(
                "unsupported_response_format",
                "Only response_format=url is supported.",
            ));
        }

        if self.n.as_ref().and_then(Value::as_f64).is_some_and(|n| n > 1.0) {
            return Err(GatewayError::invalid_request(
                "unsupported_n",
                "Only n=1 is supported.",
            ));
        }

        let is_gpt_image = model == GPT_IMAGE_MODEL;
        let model_configuration = ImageModelConfiguration {
            quality: non_blank(self.quality)
                .unwrap_or_else(|| if is_gpt_image { "auto" } else { "standard" }.to_string()),
            size: non_blank(self.size)
                .unwrap_or_else(|| if is_gpt_image { "auto" } else { "1024x1024" }.to_string()),
            style: non_blank(self.style),
            background: non_blank(self.background),
        };

        Ok(NeleImagePayload {
            model,
            prompt,
            model_configuration,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NeleImageResult {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "revisedPrompt")]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationResponse {
    pub created: i64,
    pub data: Vec<ImageData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

impl From<NeleImageResult> for ImageGenerationResponse {
    fn from(result: NeleImageResult) -> Self {
        Self {
            created: unix_now(),
            data: vec![ImageData {
                url: result.url.unwrap_or_default(),
                revised_prompt: non_blank(result.revised_prompt),
            }],
        }
    }
}
