use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.aieva.io/api:v1/";
pub const DEFAULT_CHAT_MODEL: &str = "google-claude-4.5-sonnet";
pub const DEFAULT_API_KEY_ENV: &str = "NELE_API_KEY";

/// Inbound request body cap, matching the 30 MB default of common HTTP hosts.
pub const DEFAULT_MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

/// Upper bound for tool function descriptions accepted by the backend.
pub const TOOL_DESCRIPTION_HARD_LIMIT: usize = 1000;

/// Runtime settings shared by every request handler.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Backend base URL, always ending in `/`.
    pub base_url: String,
    pub api_key: Option<String>,
    /// Environment variable consulted when no header or configured key is present.
    pub api_key_env: String,
    pub default_chat_model: String,
    pub default_document_collection_id: Option<String>,
    pub reasoning_effort: Option<String>,
    pub tool_description_max_length: usize,
    pub force_stream: bool,
    pub upstream_timeout: Duration,
    pub image_fetch_timeout: Duration,
    /// Largest accepted request body; inline images and audio uploads count against it.
    pub max_body_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            default_chat_model: DEFAULT_CHAT_MODEL.to_string(),
            default_document_collection_id: None,
            reasoning_effort: None,
            tool_description_max_length: TOOL_DESCRIPTION_HARD_LIMIT,
            force_stream: false,
            upstream_timeout: Duration::from_secs(300),
            image_fetch_timeout: Duration::from_secs(30),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl GatewayConfig {
    /// Trims every string setting, drops blank optionals and clamps limits.
    pub fn normalized(mut self) -> Self {
        self.base_url = normalize_base_url(&self.base_url);
        self.api_key = non_blank(self.api_key);
        self.default_document_collection_id = non_blank(self.default_document_collection_id);
        self.reasoning_effort = non_blank(self.reasoning_effort);
        self.default_chat_model = non_blank(Some(self.default_chat_model))
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        self.tool_description_max_length =
            clamp_tool_description_length(self.tool_description_max_length);
        self
    }
}

pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut base = if trimmed.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    };
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Zero means "use the hard limit"; anything above it is capped.
pub fn clamp_tool_description_length(requested: usize) -> usize {
    if requested == 0 {
        TOOL_DESCRIPTION_HARD_LIMIT
    } else {
        requested.min(TOOL_DESCRIPTION_HARD_LIMIT)
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
