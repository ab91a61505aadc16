//! Gemini adapter
//!
//! generateContent wire format: roles are `user`/`model`, the system turn
//! travels as `systemInstruction`, images are `inline_data` parts, and
//! streaming uses `:streamGenerateContent?alt=sse`.

use crate::adapters::normalize::normalize_error;
use crate::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::adapters::transport_types::{AdapterError, StreamContext};
use crate::adapters::ProviderAdapter;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value as JsonValue};
use sketchpilot_core::{ConversationTurn, TurnRole};

/// Gemini adapter
#[derive(Debug)]
pub struct GeminiAdapter {
    /// Base URL (e.g., https://generativelanguage.googleapis.com/v1beta)
    base_url: String,
    /// Model name (without the "models/" prefix)
    model: String,
    /// API key (query parameter, not a header)
    api_key: String,
    /// HTTP transport
    transport: Transport,
}

impl GeminiAdapter {
    /// Create new Gemini adapter
    pub fn new(base_url: String, model: String, api_key: String, timeout_secs: u64) -> Self {
        Self {
            base_url,
            model,
            api_key,
            transport: Transport::Real(UreqTransport::with_timeout(timeout_secs)),
        }
    }

    /// Create adapter with custom transport (for testing)
    pub fn with_transport(
        base_url: String,
        model: String,
        api_key: String,
        transport: Transport,
    ) -> Self {
        Self {
            base_url,
            model,
            api_key,
            transport,
        }
    }

    /// Convert one non-system turn to a Gemini content entry
    fn build_content(turn: &ConversationTurn) -> JsonValue {
        let role = match turn.role {
            TurnRole::User | TurnRole::System => "user",
            TurnRole::Assistant => "model",
        };

        let mut parts = vec![json!({"text": turn.text})];
        for image in &turn.images {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.format.mime_type(),
                    "data": BASE64.encode(&image.bytes),
                }
            }));
        }
        json!({"role": role, "parts": parts})
    }

    /// Build request body; the system turn becomes `systemInstruction`
    fn build_request(&self, turns: &[ConversationTurn]) -> String {
        let system: String = turns
            .iter()
            .filter(|t| t.role == TurnRole::System)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let contents: Vec<JsonValue> = turns
            .iter()
            .filter(|t| t.role != TurnRole::System)
            .map(Self::build_content)
            .collect();

        let mut request = json!({"contents": contents});
        if !system.is_empty() {
            request["systemInstruction"] = json!({"parts": [{"text": system}]});
        }
        request.to_string()
    }

    /// Non-streaming completion, used as fallback for empty streams
    fn complete(&self, turns: &[ConversationTurn]) -> Result<String, AdapterError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        let body = self.build_request(turns);
        let headers = [("Content-Type", "application/json")];

        let response = self
            .transport
            .post_json(&url, &headers, &body)
            .map_err(|e| normalize_error(e, false))?;

        parse_candidate_text(&response).ok_or_else(|| {
            AdapterError::InvalidResponse("Missing candidates[0].content.parts".to_string())
        })
    }
}

/// Concatenated text parts of the first candidate, if any
pub fn parse_candidate_text(data: &str) -> Option<String> {
    let json = serde_json::from_str::<JsonValue>(data).ok()?;
    let parts = json["candidates"]
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn stream_reply<F>(
        &self,
        turns: &[ConversationTurn],
        ctx: &StreamContext,
        mut on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str),
    {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.base_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        let body = self.build_request(turns);
        let headers = [("Content-Type", "application/json")];

        let mut full_content = String::new();
        self.transport
            .post_stream(&url, &headers, &body, ctx, |line| {
                if let Some(data) = line.strip_prefix("data: ") {
                    if let Some(text) = parse_candidate_text(data) {
                        on_token(&text);
                        full_content.push_str(&text);
                    }
                }
            })
            .map_err(|e| normalize_error(e, false))?;

        if full_content.is_empty() {
            let fallback = self.complete(turns)?;
            on_token(&fallback);
            return Ok(fallback);
        }

        Ok(full_content)
    }

    fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        let url = format!(
            "{}/models?key={}",
            self.base_url.trim_end_matches('/'),
            self.api_key
        );

        let response = self
            .transport
            .get_json(&url, &[])
            .map_err(|e| normalize_error(e, false))?;

        let json: JsonValue = serde_json::from_str(&response)?;
        let data = json["models"]
            .as_array()
            .ok_or_else(|| AdapterError::InvalidResponse("Missing models array".to_string()))?;

        let mut models: Vec<String> = data
            .iter()
            .filter_map(|m| m["name"].as_str())
            .map(|name| name.strip_prefix("models/").unwrap_or(name).to_string())
            .collect();
        models.sort();
        Ok(models)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
