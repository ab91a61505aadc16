//! Sketchpilot
//!
//! AI pair-editor backend for p5.js sketches. The workspace members do
//! the work; this crate re-exports them for integration tests and
//! embedders.

pub use sketchpilot_api as api;
pub use sketchpilot_core as core;
pub use sketchpilot_llm as llm;
