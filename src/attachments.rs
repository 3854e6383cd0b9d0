//! Turns `image_url` content parts into backend image attachments.
//!
//! Each image is resolved to bytes (inline `data:` URL or an http(s) download),
//! uploaded to the backend's `image-attachment` endpoint, and referenced by the
//! path the backend hands back. Any failure aborts the whole request.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::NeleClient;
use crate::error::GatewayError;
use crate::wire::{ImageAttachment, ImageUrl};

const FALLBACK_FILE_NAME: &str = "image";

/// Bytes of one resolved image plus the metadata needed for the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub data: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Request-scoped uploader; borrows the shared clients and the caller's credential.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentPipeline<'a> {
    fetcher: &'a Client,
    nele: &'a NeleClient,
    credential: &'a str,
}

impl<'a> AttachmentPipeline<'a> {
    pub fn new(fetcher: &'a Client, nele: &'a NeleClient, credential: &'a str) -> Self {
        Self {
            fetcher,
            nele,
            credential,
        }
    }

    pub async fn upload(
        &self,
        url: &str,
        image: &ImageUrl,
    ) -> Result<ImageAttachment, GatewayError> {
        let source = match self.load(url).await {
            Ok(source) => source,
            Err(err) => {
                warn!("image attachment download failed: {err}");
                return Err(err);
            }
        };

        info!(
            content_type = %source.content_type,
            bytes = source.data.len(),
            "uploading image attachment"
        );

        let mut part = Part::bytes(source.data).file_name(source.file_name.clone());
        if !source.content_type.is_empty() {
            part = part.mime_str(&source.content_type).map_err(|_| {
                GatewayError::invalid_image_url(format!(
                    "Unsupported image content type: {}.",
                    source.content_type
                ))
            })?;
        }
        let form = Form::new().part("file", part);

        let reply = self.nele.upload_image_attachment(self.credential, form).await?;
        if !reply.is_success() {
            warn!(status = %reply.status, "image attachment upload failed");
            return Err(GatewayError::Upstream(reply));
        }

        let body: Value = reply.json()?;
        let path = attachment_path(&body)?;
        Ok(ImageAttachment::new(path, source.file_name, image.detail.clone()))
    }

    async fn load(&self, url: &str) -> Result<ImageSource, GatewayError> {
        if is_data_url(url) {
            let (data, content_type) = parse_data_url(url)?;
            let file_name = ensure_extension(FALLBACK_FILE_NAME, &content_type);
            return Ok(ImageSource {
                data,
                content_type,
                file_name,
            });
        }

        let parsed = Url::parse(url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .ok_or_else(|| {
                GatewayError::invalid_image_url("image_url must be a data URL or an http(s) URL.")
            })?;
        self.fetch(parsed).await
    }

    async fn fetch(&self, url: Url) -> Result<ImageSource, GatewayError> {
        let download_failed = |reason: String| {
            GatewayError::invalid_image_url(format!("Failed to download image_url: {reason}."))
        };

        let response = self
            .fetcher
            .get(url.clone())
            .send()
            .await
            .map_err(|err| download_failed(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_failed(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type)
            .unwrap_or_default();
        let data = response
            .bytes()
            .await
            .map_err(|err| download_failed(err.to_string()))?
            .to_vec();

        let file_name = ensure_extension(&file_name_from_url(&url), &content_type);
        Ok(ImageSource {
            data,
            content_type,
            file_name,
        })
    }
}

fn attachment_path(body: &Value) -> Result<String, GatewayError> {
    let Some(path) = body.get("path") else {
        warn!("image attachment upload succeeded but no path was returned");
        return Err(GatewayError::bad_upstream(
            "image_attachment_missing_path",
            "Upstream did not return image path.",
        ));
    };

    match path.as_str().map(str::trim) {
        Some(path) if !path.is_empty() => Ok(path.to_string()),
        _ => {
            warn!("image attachment upload returned an empty path");
            Err(GatewayError::bad_upstream(
                "image_attachment_empty_path",
                "Upstream returned empty image path.",
            ))
        }
    }
}

pub fn is_data_url(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Decodes `data:<type>;base64,<payload>` into bytes and the declared media type.
pub fn parse_data_url(url: &str) -> Result<(Vec<u8>, String), GatewayError> {
    let invalid = || GatewayError::invalid_image_url("Invalid data URL for image_url.");

    let comma = url.find(',').filter(|&i| i >= 5).ok_or_else(invalid)?;
    let header = &url[5..comma];
    let payload = &url[comma + 1..];

    if !header.to_ascii_lowercase().contains(";base64") {
        return Err(invalid());
    }

    let content_type = header
        .split(';')
        .next()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = STANDARD.decode(compact).map_err(|_| invalid())?;
    Ok((data, content_type))
}

pub fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(FALLBACK_FILE_NAME)
        .to_string()
}

pub fn ensure_extension(file_name: &str, content_type: &str) -> String {
    if Path::new(file_name).extension().is_some() {
        return file_name.to_string();
    }
    match extension_for_content_type(content_type) {
        Some(ext) => format!("{file_name}.{ext}"),
        None => file_name.to_string(),
    }
}

pub fn extension_for_content_type(content_type: &str) -> Option<String> {
    let lower = content_type.trim().to_ascii_lowercase();
    let ext = match lower.as_str() {
        "" => return None,
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        other => return other.strip_prefix("image/").filter(|s| !s.is_empty()).map(str::to_string),
    };
    Some(ext.to_string())
}

fn media_type(header: &str) -> String {
    header.split(';').next().unwrap_or_default().trim().to_string()
}
