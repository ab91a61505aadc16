//! Sketchpilot API
//!
//! HTTP surface of the sketch-editing pipeline: turn submission with SSE
//! streaming, model listing, and the review/history endpoints the editor
//! front end drives.

pub mod handlers;
pub mod models;
pub mod server;

pub use handlers::ApiState;
pub use server::ApiServer;
