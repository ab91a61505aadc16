//! Conversation types
//!
//! Provider-agnostic conversation and attachment types.
//! These are the only message shapes adapters are allowed to consume;
//! vendor request/response types stay inside each adapter.

use serde::{Deserialize, Serialize};

/// Reserved provider id for the operator-hosted trial pathway.
///
/// Selections with this id never carry a caller credential; the adapter
/// factory resolves an operator-held shared key and a pinned model instead.
pub const DEMO_PROVIDER_ID: &str = "demo";

/// Message role (universal subset across providers)
///
/// All supported backends understand these three roles. The system role is
/// carried out-of-band for backends that expect a top-level instruction
/// (Anthropic, Gemini); adapters handle that translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// System message (sets behavior/context)
    System,
    /// User message (human input)
    User,
    /// Assistant message (LLM response)
    Assistant,
}

/// Declared media type of an image attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// MIME type string for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    /// Magic signature the decoded payload must start with
    pub fn magic_bytes(&self) -> &'static [u8] {
        match self {
            ImageFormat::Png => &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
            ImageFormat::Jpeg => &[0xFF, 0xD8, 0xFF],
        }
    }
}

/// Decoded image attachment
///
/// `bytes` is the decoded binary payload. Whether the payload actually
/// matches `format` is checked by the budget validator, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// Decoded binary payload
    pub bytes: Vec<u8>,
    /// Declared media type
    pub format: ImageFormat,
}

impl ImageAttachment {
    /// True if the payload starts with the declared format's magic signature
    pub fn matches_declared_format(&self) -> bool {
        self.bytes.starts_with(self.format.magic_bytes())
    }
}

/// Single conversation turn (provider-agnostic)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    /// Turn role
    pub role: TurnRole,
    /// Text content
    pub text: String,
    /// Attached images (user turns only in practice)
    pub images: Vec<ImageAttachment>,
}

impl ConversationTurn {
    /// Plain text turn with no attachments
    pub fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            images: Vec::new(),
        }
    }
}

/// Which provider/model a turn should be routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSelection {
    /// Provider id ("openai", "anthropic", "gemini", "stub", or "demo")
    pub provider_id: String,
    /// Model identifier, provider-specific
    pub model_id: String,
    /// Caller-supplied credential; absent for "demo"
    pub credential: Option<String>,
}

impl ProviderSelection {
    /// True for the reserved operator-hosted trial pathway
    pub fn is_demo(&self) -> bool {
        self.provider_id == DEMO_PROVIDER_ID
    }
}
