//! Review state machine
//!
//! Stages candidate documents as pending diffs against the current
//! document, and resolves them to accept (commit + history entry) or
//! reject (revert to baseline). At most one pending diff exists at a
//! time; staging over an existing one silently supersedes it, because
//! only the latest proposal is ever relevant to the user.
//!
//! A session owns one document and is not safe for concurrent mutation
//! from two callers; the surrounding application provides the
//! serialization point (one interactive user per document).

use crate::history::{ChangeOrigin, HistoryEntry, HistoryLedger, HistorySink};
use tracing::debug;

/// A staged, not-yet-committed candidate document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDiff {
    /// The proposed document
    pub candidate_document: String,
    /// The document the proposal was staged against
    pub baseline_document: String,
    /// Origin recorded on the history entry if accepted
    pub origin: ChangeOrigin,
    /// Stable key identifying the proposal (e.g. reply message id)
    pub patch_key: Option<String>,
    /// True when this stages a restoration of a history entry
    pub is_restore: bool,
}

/// Review states — `Staged` iff a pending diff exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Clean,
    Staged,
}

/// Per-document review session
///
/// Owns the editable document, the single pending diff slot, the ledger
/// of accepted changes, and the rejected-key bookkeeping the UI uses to
/// gray out declined proposals.
pub struct ReviewSession {
    document: String,
    pending: Option<PendingDiff>,
    ledger: HistoryLedger,
    rejected_patch_keys: Vec<String>,
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("state", &self.state())
            .field("document_len", &self.document.len())
            .field("history_len", &self.ledger.len())
            .finish()
    }
}

impl ReviewSession {
    /// New session around an initial document
    pub fn new(document: String) -> Self {
        Self {
            document,
            pending: None,
            ledger: HistoryLedger::new(),
            rejected_patch_keys: Vec::new(),
        }
    }

    /// New session whose accepted entries also flow to a persistence sink
    pub fn with_sink(document: String, sink: Box<dyn HistorySink>) -> Self {
        Self {
            document,
            pending: None,
            ledger: HistoryLedger::with_sink(sink),
            rejected_patch_keys: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> ReviewState {
        if self.pending.is_some() {
            ReviewState::Staged
        } else {
            ReviewState::Clean
        }
    }

    /// Current document (the baseline while a diff is staged)
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The staged diff, if any
    pub fn pending(&self) -> Option<&PendingDiff> {
        self.pending.as_ref()
    }

    /// Accepted-change history, oldest first
    pub fn history(&self) -> &[HistoryEntry] {
        self.ledger.entries()
    }

    /// Patch keys the user has rejected
    pub fn rejected_patch_keys(&self) -> &[String] {
        &self.rejected_patch_keys
    }

    /// Stage a candidate document for review
    ///
    /// Callable from `Clean` or `Staged`. Staging while already staged
    /// supersedes the previous pending diff without resolving it — the
    /// documented single-slot policy, not a bug.
    pub fn stage(
        &mut self,
        candidate: String,
        origin: ChangeOrigin,
        patch_key: Option<String>,
        is_restore: bool,
    ) {
        if let Some(ref superseded) = self.pending {
            debug!(
                old_key = ?superseded.patch_key,
                new_key = ?patch_key,
                "Pending diff superseded by newer proposal"
            );
        }
        self.pending = Some(PendingDiff {
            candidate_document: candidate,
            baseline_document: self.document.clone(),
            origin,
            patch_key,
            is_restore,
        });
    }

    /// Accept the pending diff
    ///
    /// Commits the candidate as the current document and appends a
    /// history entry with a derived summary. A stale accept with nothing
    /// staged is a no-op returning `None`, never an error — the UI may
    /// send one after a newer diff already superseded the old one.
    pub fn accept(&mut self, prompt: Option<String>) -> Option<HistoryEntry> {
        let pending = self.pending.take()?;

        self.document = pending.candidate_document.clone();
        let entry = self
            .ledger
            .append(
                pending.origin,
                pending.baseline_document,
                pending.candidate_document,
                prompt,
                pending.is_restore,
            )
            .clone();
        Some(entry)
    }

    /// Reject the pending diff, restoring the baseline
    ///
    /// Records the diff's patch key for UI bookkeeping. No history entry
    /// is appended. No-op when nothing is staged.
    pub fn reject(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.document = pending.baseline_document;
                if let Some(key) = pending.patch_key {
                    self.rejected_patch_keys.push(key);
                }
                true
            }
            None => false,
        }
    }

    /// Read-only view of a history entry's result document
    ///
    /// Lets the caller render an old version live without creating a
    /// pending diff or touching history. Distinct from [`Self::restore`].
    pub fn preview(&self, entry_id: &str) -> Option<&str> {
        self.ledger
            .get(entry_id)
            .map(|e| e.result_document.as_str())
    }

    /// Stage a restoration of a history entry
    ///
    /// The restoration becomes a reviewable pending diff so it is itself
    /// auditable and can be accepted or rejected. Returns false when the
    /// entry id is unknown.
    pub fn restore(&mut self, entry_id: &str) -> bool {
        let candidate = match self.ledger.get(entry_id) {
            Some(entry) => entry.result_document.clone(),
            None => return false,
        };
        self.stage(
            candidate,
            ChangeOrigin::Restore,
            Some(format!("restore:{}", entry_id)),
            true,
        );
        true
    }
}
