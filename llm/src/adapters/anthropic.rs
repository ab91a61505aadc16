//! Anthropic messages adapter
//!
//! Messages API wire format. The system turn travels out-of-band in the
//! top-level `system` field; images become base64 `source` blocks; the
//! SSE stream carries typed events rather than bare deltas.

use crate::adapters::normalize::normalize_error;
use crate::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::adapters::transport_types::{AdapterError, StreamContext};
use crate::adapters::ProviderAdapter;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value as JsonValue};
use sketchpilot_core::{ConversationTurn, TurnRole};

/// API version header the messages endpoint requires
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Output token ceiling sent with every request (the API requires one)
const MAX_TOKENS: u32 = 8192;

/// Anthropic messages adapter
#[derive(Debug)]
pub struct AnthropicAdapter {
    /// Base URL (e.g., https://api.anthropic.com)
    base_url: String,
    /// Model name
    model: String,
    /// API key
    api_key: String,
    /// HTTP transport
    transport: Transport,
}

impl AnthropicAdapter {
    /// Create new Anthropic adapter
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

    /// Convert one non-system turn to a messages-API entry
    fn build_message(turn: &ConversationTurn) -> JsonValue {
        let role = match turn.role {
            TurnRole::User | TurnRole::System => "user",
            TurnRole::Assistant => "assistant",
        };

        if turn.images.is_empty() {
            return json!({"role": role, "content": turn.text});
        }

        // Images lead, text follows, matching the documented block order
        let mut blocks = Vec::new();
        for image in &turn.images {
            blocks.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.format.mime_type(),
                    "data": BASE64.encode(&image.bytes),
                }
            }));
        }
        blocks.push(json!({"type": "text", "text": turn.text}));
        json!({"role": role, "content": blocks})
    }

    /// Build request body; the system turn is lifted to the top level
    fn build_request(&self, turns: &[ConversationTurn], stream: bool) -> String {
        let system: String = turns
            .iter()
            .filter(|t| t.role == TurnRole::System)
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages: Vec<JsonValue> = turns
            .iter()
            .filter(|t| t.role != TurnRole::System)
            .map(Self::build_message)
            .collect();

        let mut request = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": messages,
            "stream": stream
        });
        if !system.is_empty() {
            request["system"] = json!(system);
        }
        request.to_string()
    }

    fn headers(&self) -> [(&str, &str); 3] {
        [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
            ("Content-Type", "application/json"),
        ]
    }

    /// Extract content from a non-streaming response
    fn extract_content(response: &str) -> Result<String, AdapterError> {
        let json: JsonValue = serde_json::from_str(response)?;
        let blocks = json["content"]
            .as_array()
            .ok_or_else(|| AdapterError::InvalidResponse("Missing content array".to_string()))?;

        let text: String = blocks
            .iter()
            .filter(|b| b["type"] == "text")
            .filter_map(|b| b["text"].as_str())
            .collect();
        Ok(text)
    }

    /// Non-streaming completion, used as fallback for empty streams
    fn complete(&self, turns: &[ConversationTurn]) -> Result<String, AdapterError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = self.build_request(turns, false);
        let response = self
            .transport
            .post_json(&url, &self.headers(), &body)
            .map_err(|e| normalize_error(e, false))?;
        Self::extract_content(&response)
    }
}

/// Extract the text delta from one SSE data payload, if any
///
/// Only `content_block_delta` events with a `text_delta` carry tokens;
/// message_start, ping, content_block_stop and the rest are control
/// frames and yield nothing.
pub fn parse_event_delta(data: &str) -> Option<String> {
    let json = serde_json::from_str::<JsonValue>(data).ok()?;
    if json["type"] != "content_block_delta" {
        return None;
    }
    json["delta"]["text"].as_str().map(|s| s.to_string())
}

impl ProviderAdapter for AnthropicAdapter {
    fn stream_reply<F>(
        &self,
        turns: &[ConversationTurn],
        ctx: &StreamContext,
        mut on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let body = self.build_request(turns, true);

        let mut full_content = String::new();
        self.transport
            .post_stream(&url, &self.headers(), &body, ctx, |line| {
                if let Some(data) = line.strip_prefix("data: ") {
                    if let Some(text) = parse_event_delta(data) {
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
        let url = format!("{}/v1/models", self.base_url.trim_end_matches('/'));
        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
        ];

        let response = self
            .transport
            .get_json(&url, &headers)
            .map_err(|e| normalize_error(e, false))?;

        let json: JsonValue = serde_json::from_str(&response)?;
        let data = json["data"]
            .as_array()
            .ok_or_else(|| AdapterError::InvalidResponse("Missing data array".to_string()))?;

        let mut models: Vec<String> = data
            .iter()
            .filter_map(|m| m["id"].as_str().map(|s| s.to_string()))
            .collect();
        models.sort();
        Ok(models)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}
