//! Sketchpilot core
//!
//! Provider-agnostic domain layer for the AI sketch-editing pipeline:
//! request budgets, reply parsing, patch application, the review state
//! machine and the accepted-change history ledger. Everything here is
//! synchronous and free of network I/O; the llm and api crates drive it.

pub mod budget;
pub mod config;
pub mod diff;
pub mod history;
pub mod patch;
pub mod review;
pub mod types;

pub use budget::{validate, BudgetedRequest, InboundRequest, ValidationError};
pub use config::{AppConfig, BudgetConfig, ConfigError, DemoConfig, StreamConfig};
pub use diff::{summarize, DiffSummary};
pub use history::{ChangeOrigin, HistoryEntry, HistoryLedger, HistorySink, JsonlHistorySink};
pub use patch::{apply_patches, extract, CodePatchBlock, PatchError, ReplyAction};
pub use review::{PendingDiff, ReviewSession, ReviewState};
pub use types::{
    ConversationTurn, ImageAttachment, ImageFormat, ProviderSelection, TurnRole, DEMO_PROVIDER_ID,
};
