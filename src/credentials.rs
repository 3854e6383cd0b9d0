//! Resolves the single bearer credential used for every backend call of a request.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

const BEARER_PREFIX: &str = "bearer ";
const API_KEY_HEADER: &str = "x-api-key";

/// Header credential first, then the configured key, then the environment.
pub fn resolve_credential(
    headers: &HeaderMap,
    config: &GatewayConfig,
) -> Result<String, GatewayError> {
    resolve_with(headers, config, |name| std::env::var(name).ok()).ok_or_else(|| {
        GatewayError::MissingApiKey {
            env_var: config.api_key_env.clone(),
        }
    })
}

/// Credential that does not depend on the inbound request.
pub fn configured_credential(config: &GatewayConfig) -> Option<String> {
    configured_with(config, |name| std::env::var(name).ok())
}

fn resolve_with<F>(headers: &HeaderMap, config: &GatewayConfig, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    bearer_token(headers)
        .or_else(|| api_key_header(headers))
        .or_else(|| configured_with(config, env))
}

fn configured_with<F>(config: &GatewayConfig, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_blank(config.api_key.as_deref()).or_else(|| non_blank(env(&config.api_key_env).as_deref()))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let prefix = value.get(..BEARER_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }
    non_blank(Some(&value[BEARER_PREFIX.len()..]))
}

fn api_key_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(API_KEY_HEADER)?.to_str().ok()?;
    non_blank(Some(value))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
