//! Snapshot-based undo/redo.
//!
//! Every mutation is committed as a whole new [`CommandList`]; the previous value is pushed onto
//! a bounded undo stack. Because lists are reference counted, a snapshot costs one pointer.
//! Each entry also carries the [`FoldState`] that belonged to its list, so undo and redo put
//! folds back on the blocks they were set on.

use crate::command::CommandList;
use crate::folding::FoldState;

/// Default capacity of the undo and redo stacks.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone)]
struct HistoryEntry {
    commands: CommandList,
    folds: FoldState,
}

/// Undo/redo manager holding the current command list.
#[derive(Debug, Clone)]
pub struct History {
    current: CommandList,
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_undo: usize,
    /// Clean point tracking. Uses `undo_stack.len()` as the saved position in the linear history.
    /// When `redo_stack` is non-empty, `clean_index` may be greater than `undo_stack.len()`.
    clean_index: Option<usize>,
}

impl History {
    /// Create a history whose stacks hold at most `max_undo` entries (at least one).
    pub fn new(initial: CommandList, max_undo: usize) -> Self {
        Self {
            current: initial,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
            clean_index: Some(0),
        }
    }

    /// The current command list.
    pub fn current(&self) -> &CommandList {
        &self.current
    }

    /// Adopt `next` as the current list, pushing the previous one onto the undo stack.
    ///
    /// `folds` is the fold state of the list being replaced.
    pub fn commit(&mut self, next: CommandList, folds: FoldState) {
        self.clear_redo_and_adjust_clean();

        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
            if let Some(clean_index) = self.clean_index {
                self.clean_index = clean_index.checked_sub(1);
            }
        }

        let previous = std::mem::replace(&mut self.current, next);
        self.undo_stack.push(HistoryEntry {
            commands: previous,
            folds,
        });
        log::debug!(
            "history commit: {} -> {} commands (undo depth {})",
            self.undo_stack.last().map_or(0, |e| e.commands.len()),
            self.current.len(),
            self.undo_stack.len()
        );
    }

    /// Restore the previous list and its folds into `folds`. Returns `false` (no-op) if there is
    /// nothing to undo.
    pub fn undo(&mut self, folds: &mut FoldState) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.swap_in(previous, folds);
        Self::push_bounded(&mut self.redo_stack, current, self.max_undo);
        true
    }

    /// Re-apply the last undone list and its folds. Returns `false` (no-op) if there is nothing
    /// to redo.
    pub fn redo(&mut self, folds: &mut FoldState) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.swap_in(next, folds);
        Self::push_bounded(&mut self.undo_stack, current, self.max_undo);
        true
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Capacity of each stack.
    pub fn limit(&self) -> usize {
        self.max_undo
    }

    /// Whether the current list is at the clean point (for dirty tracking).
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Mark the current list as the clean point (call after saving).
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
    }

    fn swap_in(&mut self, entry: HistoryEntry, folds: &mut FoldState) -> HistoryEntry {
        HistoryEntry {
            commands: std::mem::replace(&mut self.current, entry.commands),
            folds: std::mem::replace(folds, entry.folds),
        }
    }

    fn push_bounded(stack: &mut Vec<HistoryEntry>, entry: HistoryEntry, max: usize) {
        if stack.len() >= max {
            stack.remove(0);
        }
        stack.push(entry);
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }

        // If clean point is in redo area, it becomes unreachable after clearing redo.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }

        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::EventCommand;
    use event_editor_codes::CodeTable;

    fn list(codes: &[i32]) -> CommandList {
        CommandList::new(codes.iter().map(|c| EventCommand::new(*c, 0)).collect())
    }

    fn folded_at(commands: &CommandList, index: usize) -> FoldState {
        let mut folds = FoldState::new();
        assert!(folds.fold(commands, index, &CodeTable::standard()));
        folds
    }

    #[test]
    fn test_commit_undo_redo() {
        let mut history = History::new(list(&[0]), DEFAULT_HISTORY_LIMIT);
        let mut folds = FoldState::new();
        let first = history.current().clone();
        history.commit(list(&[101, 0]), folds.clone());
        let second = history.current().clone();

        assert!(history.undo(&mut folds));
        assert!(CommandList::ptr_eq(history.current(), &first));
        assert!(history.redo(&mut folds));
        assert!(CommandList::ptr_eq(history.current(), &second));
        assert!(!history.redo(&mut folds));
    }

    #[test]
    fn test_folds_travel_with_entries() {
        let before = list(&[112, 413, 0]);
        let after = list(&[101, 112, 413, 0]);
        let mut history = History::new(before.clone(), DEFAULT_HISTORY_LIMIT);
        let mut folds = folded_at(&before, 0);
        history.commit(after.clone(), folds.clone());
        folds = folded_at(&after, 1);

        assert!(history.undo(&mut folds));
        assert_eq!(folds, folded_at(&before, 0));
        assert!(history.redo(&mut folds));
        assert_eq!(folds, folded_at(&after, 1));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(list(&[0]), 3);
        let mut folds = FoldState::new();
        for code in [101, 102, 103, 104, 105] {
            history.commit(list(&[code, 0]), FoldState::new());
        }
        assert_eq!(history.undo_depth(), 3);
        while history.undo(&mut folds) {}
        assert_eq!(history.current()[0].code, 102);
    }

    #[test]
    fn test_clean_point() {
        let mut history = History::new(list(&[0]), 10);
        let mut folds = FoldState::new();
        assert!(history.is_clean());
        history.commit(list(&[101, 0]), FoldState::new());
        assert!(!history.is_clean());
        history.mark_clean();
        history.undo(&mut folds);
        assert!(!history.is_clean());
        history.redo(&mut folds);
        assert!(history.is_clean());
        history.undo(&mut folds);
        history.commit(list(&[102, 0]), FoldState::new());
        assert!(!history.is_clean());
    }
}
