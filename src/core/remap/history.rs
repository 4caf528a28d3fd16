//! Linear undo/redo over applied remap batches.

use chrono::Local;
use serde::Serialize;

use super::executor::{rebind, RemapRequest};
use super::index::TokenIndex;
use crate::error::{Error, Result};
use crate::host::DocumentHost;

/// One applied batch. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub description: String,
    pub timestamp: String,
    pub requests: Vec<RemapRequest>,
}

impl HistoryEntry {
    pub fn node_count(&self) -> usize {
        self.requests.iter().map(|r| r.node_ids.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntrySummary {
    pub id: u64,
    pub description: String,
    pub timestamp: String,
    pub request_count: usize,
    pub node_count: usize,
}

/// Snapshot of the history stack for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    pub entries: Vec<HistoryEntrySummary>,
    /// Index of the latest applied entry; -1 when nothing is applied.
    pub cursor: i64,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Default)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    /// Latest applied entry. `None` means everything is undone.
    cursor: Option<usize>,
    next_id: u64,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch, discarding any redo branch past the cursor.
    pub fn record(
        &mut self,
        description: impl Into<String>,
        requests: Vec<RemapRequest>,
    ) -> &HistoryEntry {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);

        self.next_id += 1;
        self.entries.push(HistoryEntry {
            id: self.next_id,
            description: description.into(),
            timestamp: Local::now().to_rfc3339(),
            requests,
        });

        let last = self.entries.len() - 1;
        self.cursor = Some(last);
        &self.entries[last]
    }

    /// Revert the entry at the cursor by rebinding each node to its source token.
    ///
    /// Orphan-fix requests are skipped: their source token no longer exists.
    /// Individual rebind failures are ignored.
    pub fn undo(
        &mut self,
        host: &mut dyn DocumentHost,
        index: &TokenIndex,
    ) -> Result<HistoryEntry> {
        let Some(cursor) = self.cursor else {
            return Err(Error::history_nothing_to_undo(self.entries.len()));
        };
        let entry = self.entries[cursor].clone();

        for request in entry.requests.iter().filter(|r| !r.is_orphan) {
            for node_id in &request.node_ids {
                let _ = rebind(
                    host,
                    index,
                    node_id,
                    &request.property_key,
                    request.category,
                    &request.source_token_id,
                );
            }
        }

        self.cursor = cursor.checked_sub(1);
        crate::log_status!("history", "Undid #{}: {}", entry.id, entry.description);
        Ok(entry)
    }

    /// Re-apply the entry after the cursor.
    pub fn redo(
        &mut self,
        host: &mut dyn DocumentHost,
        index: &TokenIndex,
    ) -> Result<HistoryEntry> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.entries.len() {
            return Err(Error::history_nothing_to_redo(self.cursor(), self.entries.len()));
        }
        self.cursor = Some(next);
        let entry = self.entries[next].clone();

        for request in &entry.requests {
            for node_id in &request.node_ids {
                let _ = rebind(
                    host,
                    index,
                    node_id,
                    &request.property_key,
                    request.category,
                    &request.target_token_id,
                );
            }
        }

        crate::log_status!("history", "Redid #{}: {}", entry.id, entry.description);
        Ok(entry)
    }

    pub fn cursor(&self) -> i64 {
        self.cursor.map_or(-1, |c| c as i64)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            entries: self
                .entries
                .iter()
                .map(|e| HistoryEntrySummary {
                    id: e.id,
                    description: e.description.clone(),
                    timestamp: e.timestamp.clone(),
                    request_count: e.requests.len(),
                    node_count: e.node_count(),
                })
                .collect(),
            cursor: self.cursor(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }
}
