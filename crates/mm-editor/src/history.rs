//! Undo/Redo history.
//!
//! Every recorded edit is stored as a [`Delta`]: undo applies its inverse
//! patches and redo re-applies the forward ones. The past is bounded; once
//! it reaches capacity the oldest entry is dropped.
//!
//! Batches group several edits (a drag gesture, a multi-step command) into
//! one entry. Nested batches collapse into the outermost one.

use crate::delta::Delta;
use mm_core::model::Document;
use std::collections::VecDeque;

/// One undoable step.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub delta: Delta,
    pub description: String,
}

/// Bounded past/future stacks of recorded deltas.
pub struct History {
    past: VecDeque<HistoryEntry>,
    future: Vec<HistoryEntry>,
    capacity: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Accumulated changes of the open batch.
    batch: Option<HistoryEntry>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            capacity,
            batch_depth: 0,
            batch: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record an edit that has already been applied to the document.
    ///
    /// Clears the future. Inside a batch the delta joins the pending entry
    /// instead; the entry keeps the first description it saw.
    pub fn record(&mut self, delta: Delta, description: &str) {
        if delta.is_empty() {
            return;
        }
        if self.batch_depth > 0 {
            match &mut self.batch {
                Some(entry) => entry.delta.extend(delta),
                None => {
                    self.batch = Some(HistoryEntry {
                        delta,
                        description: description.to_string(),
                    })
                }
            }
            return;
        }
        self.push(HistoryEntry {
            delta,
            description: description.to_string(),
        });
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.past.push_back(entry);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Start a batch group.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes, everything it
    /// collected becomes a single entry.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            if let Some(entry) = self.batch.take() {
                self.push(entry);
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Undo the most recent entry. Returns its description.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        if self.is_batching() {
            log::debug!("history: undo ignored while a batch is open");
            return None;
        }
        let entry = self.past.pop_back()?;
        entry.delta.apply_inverse(doc);
        let desc = entry.description.clone();
        self.future.push(entry);
        Some(desc)
    }

    /// Redo the most recently undone entry. Returns its description.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        if self.is_batching() {
            log::debug!("history: redo ignored while a batch is open");
            return None;
        }
        let entry = self.future.pop()?;
        entry.delta.apply_forward(doc);
        let desc = entry.description.clone();
        self.past.push_back(entry);
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Description of the entry `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.past.back().map(|e| e.description.as_str())
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch = None;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(20)
    }
}
