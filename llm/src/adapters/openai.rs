//! OpenAI-compatible adapter
//!
//! Chat-completions wire format with SSE streaming. Also serves the demo
//! pathway: same wire format, operator-held credential, pinned model, and
//! shared-key user copy on rate limits.

use crate::adapters::normalize::normalize_error;
use crate::adapters::transport::{SyncTransport, Transport, UreqTransport};
use crate::adapters::transport_types::{AdapterError, StreamContext};
use crate::adapters::ProviderAdapter;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value as JsonValue};
use sketchpilot_core::{ConversationTurn, TurnRole};

/// OpenAI-compatible adapter
#[derive(Debug)]
pub struct OpenAiAdapter {
    /// Base URL (e.g., https://api.openai.com/v1)
    base_url: String,
    /// Model name (e.g., gpt-4o)
    model: String,
    /// API key
    api_key: String,
    /// HTTP transport
    transport: Transport,
    /// True when serving the operator-hosted demo pathway
    demo: bool,
}

impl OpenAiAdapter {
    /// Create new OpenAI adapter
    pub fn new(base_url: String, model: String, api_key: String, timeout_secs: u64) -> Self {
        Self {
            base_url,
            model,
            api_key,
            transport: Transport::Real(UreqTransport::with_timeout(timeout_secs)),
            demo: false,
        }
    }

    /// Create the demo-pathway variant (operator key, pinned model)
    pub fn demo(base_url: String, model: String, api_key: String, timeout_secs: u64) -> Self {
        Self {
            demo: true,
            ..Self::new(base_url, model, api_key, timeout_secs)
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
            demo: false,
        }
    }

    /// Get model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert one turn to an OpenAI message
    ///
    /// Text-only turns carry plain string content; turns with images use
    /// the content-parts array with `image_url` data URLs.
    fn build_message(turn: &ConversationTurn) -> JsonValue {
        let role = match turn.role {
            TurnRole::System => "system",
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        };

        if turn.images.is_empty() {
            return json!({"role": role, "content": turn.text});
        }

        let mut parts = vec![json!({"type": "text", "text": turn.text})];
        for image in &turn.images {
            let url = format!(
                "data:{};base64,{}",
                image.format.mime_type(),
                BASE64.encode(&image.bytes)
            );
            parts.push(json!({"type": "image_url", "image_url": {"url": url}}));
        }
        json!({"role": role, "content": parts})
    }

    /// Build chat request body
    fn build_request(&self, turns: &[ConversationTurn], stream: bool) -> String {
        let messages: Vec<JsonValue> = turns.iter().map(Self::build_message).collect();
        json!({
            "model": self.model,
            "messages": messages,
            "stream": stream
        })
        .to_string()
    }

    /// Extract content from a non-streaming JSON response
    fn extract_content(response: &str) -> Result<String, AdapterError> {
        let json: JsonValue = serde_json::from_str(response)?;
        let content = json["choices"]
            .get(0)
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                AdapterError::InvalidResponse("Missing choices[0].message.content".to_string())
            })?;
        Ok(content.to_string())
    }

    /// Non-streaming completion, used as fallback for empty streams
    fn complete(&self, turns: &[ConversationTurn]) -> Result<String, AdapterError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = self.build_request(turns, false);

        let auth_header = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        let response = self
            .transport
            .post_json(&url, &headers, &body)
            .map_err(|e| normalize_error(e, self.demo))?;
        Self::extract_content(&response)
    }
}

/// Extract the text delta from one SSE data payload, if any
///
/// Non-text control frames (role deltas, finish chunks, usage) yield
/// nothing and are dropped.
pub fn parse_sse_delta(data: &str) -> Option<String> {
    let json = serde_json::from_str::<JsonValue>(data).ok()?;
    json["choices"]
        .get(0)
        .and_then(|c| c.get("delta"))
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}

impl ProviderAdapter for OpenAiAdapter {
    fn stream_reply<F>(
        &self,
        turns: &[ConversationTurn],
        ctx: &StreamContext,
        mut on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str),
    {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = self.build_request(turns, true);

        let auth_header = format!("Bearer {}", self.api_key);
        let headers = [
            ("Authorization", auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        let mut full_content = String::new();
        self.transport
            .post_stream(&url, &headers, &body, ctx, |line| {
                if let Some(data) = line.strip_prefix("data: ") {
                    if data == "[DONE]" {
                        return;
                    }
                    if let Some(text) = parse_sse_delta(data) {
                        on_token(&text);
                        full_content.push_str(&text);
                    }
                }
            })
            .map_err(|e| normalize_error(e, self.demo))?;

        // An empty stream means the backend ignored stream=true
        if full_content.is_empty() {
            let fallback = self.complete(turns)?;
            on_token(&fallback);
            return Ok(fallback);
        }

        Ok(full_content)
    }

    fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        // Demo callers only ever get the pinned model
        if self.demo {
            return Ok(vec![self.model.clone()]);
        }

        let url = format!("{}/models", self.base_url.trim_end_matches('/'));
        let auth_header = format!("Bearer {}", self.api_key);
        let headers = [("Authorization", auth_header.as_str())];

        let response = self
            .transport
            .get_json(&url, &headers)
            .map_err(|e| normalize_error(e, self.demo))?;

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
        if self.demo {
            "demo"
        } else {
            "openai"
        }
    }
}
