//! Stub adapter
//!
//! Scripted adapter that returns a fixed reply without network calls.
//! Used for offline runs and integration tests.

use crate::adapters::transport_types::{AdapterError, StreamContext};
use crate::adapters::ProviderAdapter;
use sketchpilot_core::ConversationTurn;

/// Stub adapter (scripted replies, no network)
#[derive(Debug)]
pub struct StubAdapter {
    /// Reply to return
    response: String,
}

impl StubAdapter {
    /// Create new stub adapter with the default scripted reply
    pub fn new() -> Self {
        Self {
            response: Self::default_response(),
        }
    }

    /// Create stub adapter with a custom reply
    pub fn with_response(response: String) -> Self {
        Self { response }
    }

    /// Default scripted reply: one patch block the extractor can parse
    fn default_response() -> String {
        "Made the circle larger.\n\
         <<<<<<< SEARCH\n\
         circle(200, 200, 50);\n\
         =======\n\
         circle(200, 200, 120);\n\
         >>>>>>> REPLACE"
            .to_string()
    }
}

impl Default for StubAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderAdapter for StubAdapter {
    fn stream_reply<F>(
        &self,
        _turns: &[ConversationTurn],
        ctx: &StreamContext,
        mut on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str),
    {
        // Emit the reply in small chunks for realism, observing the
        // context like a real transport would
        let chunk_size = 20;
        let mut chars = self.response.chars().peekable();
        while chars.peek().is_some() {
            ctx.check()?;
            let chunk: String = chars.by_ref().take(chunk_size).collect();
            on_token(&chunk);
        }

        Ok(self.response.clone())
    }

    fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        Ok(vec!["stub-model".to_string()])
    }

    fn provider_name(&self) -> &str {
        "stub"
    }
}
