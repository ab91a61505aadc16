//! Adapter factory
//!
//! Resolves a provider selection to a concrete adapter. The demo
//! selection is the OpenAI-compatible adapter pointed at an operator-held
//! credential and a pinned model; everything else requires the caller's
//! own credential.

use crate::adapters::anthropic::AnthropicAdapter;
use crate::adapters::gemini::GeminiAdapter;
use crate::adapters::openai::OpenAiAdapter;
use crate::adapters::stub::StubAdapter;
use crate::adapters::{Adapter, AdapterError};
use sketchpilot_core::{AppConfig, ProviderSelection};
use tracing::debug;

/// Create an adapter for this selection
///
/// Demo selections ignore any caller credential and the requested model;
/// a missing operator key is a hard configuration error surfaced before
/// any network call, never retried.
pub fn create_adapter(
    selection: &ProviderSelection,
    config: &AppConfig,
) -> Result<Adapter, AdapterError> {
    if selection.is_demo() {
        let key = config.demo_credential().ok_or_else(|| {
            AdapterError::Configuration(
                "The demo provider is not configured on this server. Choose a provider and supply your own API key.".to_string(),
            )
        })?;
        debug!(model = %config.demo.model, "Demo selection resolved to pinned model");
        return Ok(Adapter::OpenAi(OpenAiAdapter::demo(
            config.demo.base_url.clone(),
            config.demo.model.clone(),
            key,
            config.stream.http_timeout_secs,
        )));
    }

    if selection.provider_id == "stub" {
        return Ok(Adapter::Stub(StubAdapter::new()));
    }

    let credential = selection
        .credential
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| {
            AdapterError::Configuration(format!(
                "Provider '{}' requires an API key",
                selection.provider_id
            ))
        })?
        .to_string();

    let timeout_secs = config.stream.http_timeout_secs;
    match selection.provider_id.as_str() {
        "openai" => Ok(Adapter::OpenAi(OpenAiAdapter::new(
            config.providers.openai_base_url.clone(),
            selection.model_id.clone(),
            credential,
            timeout_secs,
        ))),
        "anthropic" => Ok(Adapter::Anthropic(AnthropicAdapter::new(
            config.providers.anthropic_base_url.clone(),
            selection.model_id.clone(),
            credential,
            timeout_secs,
        ))),
        "gemini" => Ok(Adapter::Gemini(GeminiAdapter::new(
            config.providers.gemini_base_url.clone(),
            selection.model_id.clone(),
            credential,
            timeout_secs,
        ))),
        other => Err(AdapterError::Configuration(format!(
            "Unknown provider: {}",
            other
        ))),
    }
}
