//! Accepted-change history ledger
//!
//! Append-only record of every accepted document change, with before/after
//! snapshots and a derived summary. Entries are immutable once appended;
//! the ledger is the only durable audit record the review flow produces.

use crate::diff;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where an accepted change came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Whole-document replacement from an assistant reply
    FullCode,
    /// Localized patches from an assistant reply
    Patch,
    /// Restoration of an earlier history entry
    Restore,
    /// Direct user edit committed through review
    Manual,
}

/// One accepted document change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry id
    pub id: String,
    /// Origin of the change
    pub origin: ChangeOrigin,
    /// When the change was accepted
    pub timestamp: DateTime<Utc>,
    /// Document before the change
    pub baseline_document: String,
    /// Document after the change
    pub result_document: String,
    /// Derived line-diff summary — never authored
    pub summary: String,
    /// Prompt that produced the change, when known
    pub prompt: Option<String>,
    /// True when this entry records a restoration
    pub is_restore: bool,
}

/// Best-effort persistence for accepted entries
///
/// The in-memory append always stands; a sink failure is logged and
/// swallowed. Persistence is eventually-consistent by design.
pub trait HistorySink: Send + Sync {
    fn persist(&self, entry: &HistoryEntry) -> std::io::Result<()>;
}

/// JSONL file sink, one entry per line, append-only
#[derive(Debug, Clone)]
pub struct JsonlHistorySink {
    path: PathBuf,
}

impl JsonlHistorySink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl HistorySink for JsonlHistorySink {
    fn persist(&self, entry: &HistoryEntry) -> std::io::Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Append-only ledger of accepted changes
///
/// Ordering is append order. Mutation surface is `append` only.
#[derive(Default)]
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    sink: Option<Box<dyn HistorySink>>,
}

impl std::fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("entries", &self.entries.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger that also persists entries through a sink, best-effort
    pub fn with_sink(sink: Box<dyn HistorySink>) -> Self {
        Self {
            entries: Vec::new(),
            sink: Some(sink),
        }
    }

    /// Append an accepted change; the summary is derived here
    pub fn append(
        &mut self,
        origin: ChangeOrigin,
        baseline: String,
        result: String,
        prompt: Option<String>,
        is_restore: bool,
    ) -> &HistoryEntry {
        let summary = diff::summarize(&baseline, &result).to_string();
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            origin,
            timestamp: Utc::now(),
            baseline_document: baseline,
            result_document: result,
            summary,
            prompt,
            is_restore,
        };

        debug!(entry_id = %entry.id, summary = %entry.summary, "History entry appended");

        if let Some(ref sink) = self.sink {
            if let Err(e) = sink.persist(&entry) {
                // In-memory accept stands regardless
                warn!(entry_id = %entry.id, error = %e, "Failed to persist history entry");
            }
        }

        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// All entries, oldest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
