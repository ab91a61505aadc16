//! Provider adapters
//!
//! Provider-agnostic interface over LLM HTTP APIs. One adapter per
//! backend; vendor request and response shapes never leave the adapter
//! that owns them.

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod normalize;
pub mod openai;
pub mod stub;
pub mod transport;
pub mod transport_fake;
pub mod transport_types;
pub mod transport_ureq;

pub use factory::create_adapter;
pub use transport::{FakeTransport, Transport, UreqTransport};
pub use transport_types::{AdapterError, CancelFlag, ProviderErrorKind, StreamContext, SyncTransport};

use sketchpilot_core::ConversationTurn;

/// Provider adapter trait
///
/// All backends implement this uniform interface. `stream_reply` drives
/// the full conversation through the backend, invoking `on_token` for
/// each text delta, and returns the concatenated reply. Backends that
/// cannot stream call `on_token` once with the whole reply.
pub trait ProviderAdapter: Send + Sync {
    /// Stream one assistant reply for the given conversation
    ///
    /// `turns` is the full ordered conversation including the system
    /// turn; adapters that carry the system instruction out-of-band
    /// lift it themselves. The context is observed between stream
    /// lines, so cancellation and the turn deadline interrupt the call.
    fn stream_reply<F>(
        &self,
        turns: &[ConversationTurn],
        ctx: &StreamContext,
        on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str);

    /// List model ids available to this credential, sorted
    fn list_models(&self) -> Result<Vec<String>, AdapterError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Adapter enum — concrete type for all providers
///
/// Rust traits with generic methods aren't dyn-compatible. This enum
/// wraps all adapter types, implementing ProviderAdapter via delegation.
#[derive(Debug)]
pub enum Adapter {
    OpenAi(openai::OpenAiAdapter),
    Anthropic(anthropic::AnthropicAdapter),
    Gemini(gemini::GeminiAdapter),
    Stub(stub::StubAdapter),
}

impl ProviderAdapter for Adapter {
    fn stream_reply<F>(
        &self,
        turns: &[ConversationTurn],
        ctx: &StreamContext,
        on_token: F,
    ) -> Result<String, AdapterError>
    where
        F: FnMut(&str),
    {
        match self {
            Adapter::OpenAi(a) => a.stream_reply(turns, ctx, on_token),
            Adapter::Anthropic(a) => a.stream_reply(turns, ctx, on_token),
            Adapter::Gemini(a) => a.stream_reply(turns, ctx, on_token),
            Adapter::Stub(a) => a.stream_reply(turns, ctx, on_token),
        }
    }

    fn list_models(&self) -> Result<Vec<String>, AdapterError> {
        match self {
            Adapter::OpenAi(a) => a.list_models(),
            Adapter::Anthropic(a) => a.list_models(),
            Adapter::Gemini(a) => a.list_models(),
            Adapter::Stub(a) => a.list_models(),
        }
    }

    fn provider_name(&self) -> &str {
        match self {
            Adapter::OpenAi(a) => a.provider_name(),
            Adapter::Anthropic(a) => a.provider_name(),
            Adapter::Gemini(a) => a.provider_name(),
            Adapter::Stub(a) => a.provider_name(),
        }
    }
}
