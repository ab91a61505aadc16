//! Sketchpilot LLM layer
//!
//! Provider adapters behind one streaming contract, the system prompt
//! contract, and the per-turn streaming coordinator. Provider I/O is
//! synchronous and runs on coordinator worker threads; the api crate
//! bridges the event channel to its async surface.

pub mod adapters;
pub mod contracts;
pub mod coordinator;

pub use adapters::{
    create_adapter, Adapter, AdapterError, CancelFlag, FakeTransport, ProviderAdapter,
    ProviderErrorKind, StreamContext, SyncTransport, Transport,
};
pub use coordinator::{run_turn, run_turn_with_flag, StreamEvent, TurnHandle, TurnReceiver};
