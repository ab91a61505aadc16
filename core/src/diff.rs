//! Line-level change summaries
//!
//! Derives the human-readable summary stored on every history entry.
//! Deliberately a set-difference heuristic rather than a real diff: lines
//! present in the new document but absent from the old count as added,
//! and vice versa. Moved lines therefore do not count, which is the
//! behavior the review panel wants for "what changed at a glance".

use std::collections::HashSet;

/// Added/removed line counts between two documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    /// True when neither side has visible line changes
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

impl std::fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "no visible changes")
        } else {
            write!(f, "+{} / -{} lines", self.added, self.removed)
        }
    }
}

/// Summarize the line-set difference between two documents
pub fn summarize(old: &str, new: &str) -> DiffSummary {
    let old_lines: HashSet<&str> = old.lines().collect();
    let new_lines: HashSet<&str> = new.lines().collect();

    let added = new_lines.difference(&old_lines).count();
    let removed = old_lines.difference(&new_lines).count();

    DiffSummary { added, removed }
}
