use std::collections::VecDeque;

use crate::canvas::PixelBuffer;
use crate::ops::adjustments::FilterSettings;

/// Default number of checkpoints kept on each stack.
pub const DEFAULT_MAX_HISTORY: usize = 20;

// ============================================================================
// CHECKPOINT - full source + filter snapshot
// ============================================================================

/// An immutable saved copy of the source buffer and filter settings.
///
/// `description` names the edit that moved the editor away from this state,
/// so the top of the undo stack describes what an undo would revert.
#[derive(Clone, Debug, PartialEq)]
pub struct Checkpoint {
    source: PixelBuffer,
    settings: FilterSettings,
    description: String,
}

impl Checkpoint {
    /// Deep-copy the live state.
    pub fn capture(source: &PixelBuffer, settings: &FilterSettings, description: impl Into<String>) -> Self {
        Self {
            source: source.clone(),
            settings: *settings,
            description: description.into(),
        }
    }

    pub fn source(&self) -> &PixelBuffer {
        &self.source
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn into_parts(self) -> (PixelBuffer, FilterSettings) {
        (self.source, self.settings)
    }

    fn memory_size(&self) -> usize {
        self.source.memory_bytes() + self.description.len()
    }
}

// ============================================================================
// HISTORY MANAGER - bounded undo/redo stacks of checkpoints
// ============================================================================

/// Undo/redo history.
///
/// Checkpoints are pushed *before* an edit, so the undo top is always "the
/// state just before the most recent change" and the live state stays
/// implicit until the next checkpoint or traversal. The first checkpoint
/// after a load is a baseline that is never popped.
pub struct HistoryManager {
    undo_stack: VecDeque<Checkpoint>,
    redo_stack: VecDeque<Checkpoint>,
    max_history_size: usize,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    /// Save the live state before a fresh edit. Clears the redo stack.
    pub fn checkpoint(&mut self, source: &PixelBuffer, settings: &FilterSettings, description: &str) {
        for cp in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(cp.memory_size());
        }
        let cp = Checkpoint::capture(source, settings, description);
        Self::push_bounded(
            &mut self.undo_stack,
            cp,
            self.max_history_size,
            &mut self.total_memory,
        );
    }

    /// Step back. The live state is saved onto the redo stack and the popped
    /// checkpoint is returned for the caller to restore.
    pub fn undo(&mut self, source: &PixelBuffer, settings: &FilterSettings) -> Option<Checkpoint> {
        if !self.can_undo() {
            return None;
        }
        let previous = self.undo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(previous.memory_size());

        let current = Checkpoint::capture(source, settings, previous.description.clone());
        Self::push_bounded(
            &mut self.redo_stack,
            current,
            self.max_history_size,
            &mut self.total_memory,
        );
        Some(previous)
    }

    /// Step forward again. The live state goes back onto the undo stack.
    pub fn redo(&mut self, source: &PixelBuffer, settings: &FilterSettings) -> Option<Checkpoint> {
        let next = self.redo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(next.memory_size());

        let current = Checkpoint::capture(source, settings, next.description.clone());
        Self::push_bounded(
            &mut self.undo_stack,
            current,
            self.max_history_size,
            &mut self.total_memory,
        );
        Some(next)
    }

    /// Only the baseline left means there is nothing to undo to.
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the edit an undo would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.undo_stack.back().map(|c| c.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|c| c.description())
    }

    /// All undo descriptions, most recent first (baseline included).
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|c| c.description.clone()).collect()
    }

    /// Undo checkpoints, oldest first.
    pub fn undo_entries(&self) -> impl Iterator<Item = &Checkpoint> {
        self.undo_stack.iter()
    }

    /// Bytes of pixel data retained across both stacks.
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Push to the back, evicting from the front past `max`.
    fn push_bounded(
        stack: &mut VecDeque<Checkpoint>,
        cp: Checkpoint,
        max: usize,
        total_memory: &mut usize,
    ) {
        *total_memory += cp.memory_size();
        stack.push_back(cp);
        while stack.len() > max {
            if let Some(removed) = stack.pop_front() {
                *total_memory = total_memory.saturating_sub(removed.memory_size());
            }
        }
    }
}
