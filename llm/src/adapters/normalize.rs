//! Provider error normalization
//!
//! Maps raw HTTP failures from any backend into the canonical error
//! taxonomy so the rest of the system never sees vendor-specific shapes.
//! Classification uses the status code first, then falls back to keyword
//! matching on the vendor body, because providers disagree on which
//! status carries billing versus quota failures.

use crate::adapters::transport_types::AdapterError;
use serde_json::Value as JsonValue;

/// User copy for a rate-limited demo turn
///
/// The demo pathway shares one operator credential across all users, so
/// the remedy differs from a rate limit on the caller's own key.
const DEMO_RATE_LIMIT_MESSAGE: &str =
    "The demo service is handling too many requests right now. Try again in a moment, or configure your own API key for uninterrupted access.";

/// Normalize a raw adapter error into the canonical taxonomy
///
/// `Http` errors are classified by status and body; everything already
/// classified passes through unchanged. `demo` swaps in the shared-key
/// rate-limit copy.
pub fn normalize_error(error: AdapterError, demo: bool) -> AdapterError {
    let normalized = match error {
        AdapterError::Http { status, message } => classify_http(status, &message),
        other => other,
    };

    match normalized {
        AdapterError::RateLimited(_) if demo => {
            AdapterError::RateLimited(DEMO_RATE_LIMIT_MESSAGE.to_string())
        }
        other => other,
    }
}

/// Classify an HTTP failure by status code and vendor body
fn classify_http(status: u16, body: &str) -> AdapterError {
    let message = vendor_message(body);

    match status {
        401 | 403 => AdapterError::InvalidCredential(message),
        402 => AdapterError::InsufficientCredit(message),
        404 => AdapterError::ModelUnavailable(message),
        429 => {
            // OpenAI reports exhausted billing as 429 insufficient_quota
            if body.contains("insufficient_quota") || body.contains("billing") {
                AdapterError::InsufficientCredit(message)
            } else {
                AdapterError::RateLimited(message)
            }
        }
        400 => {
            // Some backends report unknown models as a 400 with a coded body
            if body.contains("model_not_found") || body.contains("NOT_FOUND") {
                AdapterError::ModelUnavailable(message)
            } else if body.contains("API_KEY_INVALID") || body.contains("API key") {
                AdapterError::InvalidCredential(message)
            } else {
                AdapterError::Http {
                    status,
                    message: body.to_string(),
                }
            }
        }
        _ => AdapterError::Http {
            status,
            message: body.to_string(),
        },
    }
}

/// Pull the human-readable message out of a vendor error body
///
/// Tries the common shapes (`error.message`, top-level `message`) and
/// falls back to the raw body when none parse.
fn vendor_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<JsonValue>(body) {
        if let Some(msg) = json["error"]["message"].as_str() {
            return msg.to_string();
        }
        if let Some(msg) = json["message"].as_str() {
            return msg.to_string();
        }
        // Gemini wraps errors in a top-level array
        if let Some(msg) = json[0]["error"]["message"].as_str() {
            return msg.to_string();
        }
    }
    body.to_string()
}
