//! Assistant reply → document transformation
//!
//! Two pure stages: `extract` parses a finished (or in-progress, for
//! display) assistant reply into either full replacement code or an
//! ordered list of localized search/replace blocks, and `apply` turns a
//! patch list into a new document by exact substring matching.

pub mod apply;
pub mod extract;

pub use apply::{apply_patches, PatchError};
pub use extract::{extract, CodePatchBlock, ReplyAction};
