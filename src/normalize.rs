//! Role mapping and content flattening from public-protocol messages to backend messages.

use serde_json::Value;
use tracing::{info, warn};

use crate::attachments::AttachmentPipeline;
use crate::error::GatewayError;
use crate::wire::{ContentPart, InboundMessage, MessageContent, NeleAttachment, NeleMessage};

/// Maps public-protocol roles onto the roles the backend understands.
pub fn map_role(role: &str) -> &str {
    if role.eq_ignore_ascii_case("developer") {
        "system"
    } else if role.eq_ignore_ascii_case("tool") || role.eq_ignore_ascii_case("function") {
        "assistant"
    } else {
        role
    }
}

/// Joins the text of `text`/`input_text` parts with `\n`, in order.
pub fn flatten_parts(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(ContentPart::text)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn image_part_count(messages: &[InboundMessage]) -> usize {
    messages
        .iter()
        .filter_map(|m| match &m.content {
            Some(MessageContent::Parts(parts)) => Some(parts),
            _ => None,
        })
        .flatten()
        .filter(|part| matches!(part, ContentPart::ImageUrl { .. }))
        .count()
}

pub fn role_summary(messages: &[InboundMessage]) -> String {
    messages
        .iter()
        .map(|m| m.role.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalizes messages one after another; image uploads happen in array order
/// so attachment positions line up with the prose that refers to them.
pub async fn normalize_messages(
    messages: Vec<InboundMessage>,
    pipeline: &AttachmentPipeline<'_>,
) -> Result<Vec<NeleMessage>, GatewayError> {
    let mut normalized = Vec::with_capacity(messages.len());
    for message in messages {
        normalized.push(normalize_message(message, pipeline).await?);
    }
    Ok(normalized)
}

pub async fn normalize_message(
    message: InboundMessage,
    pipeline: &AttachmentPipeline<'_>,
) -> Result<NeleMessage, GatewayError> {
    let original_role = message.role.as_deref().unwrap_or_default();
    let role = match original_role.trim() {
        "" => None,
        trimmed => {
            let mapped = map_role(trimmed);
            if mapped != trimmed {
                info!("mapped role {trimmed} to {mapped}");
            }
            Some(mapped.to_string())
        }
    };

    let mut attachments = Vec::new();
    let content = match message.content {
        None => None,
        Some(MessageContent::Text(text)) => Some(text),
        Some(MessageContent::Parts(parts)) => {
            for part in &parts {
                let ContentPart::ImageUrl { image_url } = part else {
                    continue;
                };
                let Some(image) = image_url else {
                    warn!("skipping image_url part without an image_url object");
                    continue;
                };
                match image.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
                    Some(url) => {
                        let attachment = pipeline.upload(url, image).await?;
                        attachments.push(NeleAttachment::Image(attachment));
                    }
                    None => warn!("skipping image_url part without a url"),
                }
            }
            Some(flatten_parts(&parts))
        }
    };

    if let Some(Value::Array(existing)) = message.attachments {
        attachments.extend(existing.into_iter().map(NeleAttachment::Passthrough));
    }

    if attachments.iter().any(|a| matches!(a, NeleAttachment::Image(_))) {
        info!(
            role = %original_role,
            attachments = attachments.len(),
            "added attachments to message"
        );
    }

    Ok(NeleMessage {
        role,
        name: message.name,
        content,
        attachments,
        results: message.results,
    })
}
