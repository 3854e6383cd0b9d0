//! Assembles the `chat-completion-sync` request body.

use serde_json::{Map, Value};
use tracing::info;

use crate::config::GatewayConfig;
use crate::wire::{GenerationOptions, NeleChatPayload, NeleMessage};

const REASONING_EFFORT: &str = "reasoning_effort";

/// The requested model when non-blank, otherwise the configured default.
pub fn resolve_model(requested: Option<&str>, default_model: &str) -> String {
    requested
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(default_model)
        .to_string()
}

pub fn build_chat_payload(
    model: String,
    messages: Vec<NeleMessage>,
    options: GenerationOptions,
    config: &GatewayConfig,
) -> NeleChatPayload {
    let document_collection_id = resolve_document_collection(
        options.document_collection_id.as_deref(),
        options.web_search.is_some(),
        config.default_document_collection_id.as_deref(),
    );

    let tools = options
        .tools
        .map(|tools| cap_tool_descriptions(tools, config.tool_description_max_length));

    let model_configuration = merge_model_configuration(
        config.reasoning_effort.as_deref(),
        options.model_configuration.as_ref(),
        options.reasoning_effort.as_deref(),
    );
    if let Some(effort) = model_configuration
        .as_ref()
        .and_then(|c| c.get(REASONING_EFFORT))
    {
        info!("using reasoning_effort={effort}");
    }

    NeleChatPayload {
        model,
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        document_collection_id,
        web_search: options.web_search,
        tool_choice: options.tool_choice,
        tools,
        model_configuration,
        messages,
    }
}

/// Explicit ids always win. The default applies only without web search,
/// since the two retrieval modes are mutually exclusive.
pub fn resolve_document_collection(
    requested: Option<&str>,
    has_web_search: bool,
    default_id: Option<&str>,
) -> Option<String> {
    if let Some(id) = requested.map(str::trim).filter(|id| !id.is_empty()) {
        return Some(id.to_string());
    }
    if has_web_search {
        return None;
    }
    let default_id = default_id.map(str::trim).filter(|id| !id.is_empty())?;
    info!("using default documentCollectionId from config");
    Some(default_id.to_string())
}

/// Truncates `function.description` of every tool to `max_chars` characters.
/// Non-array values pass through untouched.
pub fn cap_tool_descriptions(tools: Value, max_chars: usize) -> Value {
    let Value::Array(items) = tools else {
        return tools;
    };

    let mut trimmed = 0usize;
    let items = items
        .into_iter()
        .map(|mut tool| {
            if let Some(Value::String(description)) = tool
                .get_mut("function")
                .and_then(|f| f.get_mut("description"))
                && description.chars().count() > max_chars
            {
                *description = description.chars().take(max_chars).collect();
                trimmed += 1;
            }
            tool
        })
        .collect();

    if trimmed > 0 {
        info!("trimmed {trimmed} tool description(s) to {max_chars} characters");
    }
    Value::Array(items)
}

/// Configured default < request `modelConfiguration` < top-level `reasoning_effort`.
pub fn merge_model_configuration(
    default_effort: Option<&str>,
    request_configuration: Option<&Value>,
    effort_override: Option<&str>,
) -> Option<Map<String, Value>> {
    let mut merged: Option<Map<String, Value>> = None;

    if let Some(effort) = default_effort.map(str::trim).filter(|e| !e.is_empty()) {
        merged
            .get_or_insert_with(Map::new)
            .insert(REASONING_EFFORT.to_string(), Value::String(effort.to_string()));
    }

    if let Some(Value::Object(fields)) = request_configuration {
        merged
            .get_or_insert_with(Map::new)
            .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    if let Some(effort) = effort_override {
        merged
            .get_or_insert_with(Map::new)
            .insert(REASONING_EFFORT.to_string(), Value::String(effort.to_string()));
    }

    merged
}
