//! Folding of structural groups.
//!
//! Only the set of collapsed header indices is stored. Hidden rows and per-fold hidden counts are
//! always derived from the current command list, so they can never go stale.

use crate::command::EventCommand;
use crate::structure::{GroupRange, resolve_group_range};
use event_editor_codes::CodeTable;
use std::collections::BTreeSet;

/// Returns `true` if `index` heads a group with a body that can be collapsed.
pub fn is_foldable(commands: &[EventCommand], index: usize, table: &CodeTable) -> bool {
    foldable_range(commands, index, table).is_some()
}

/// All foldable header indices.
pub fn foldable_indices(commands: &[EventCommand], table: &CodeTable) -> BTreeSet<usize> {
    (0..commands.len())
        .filter(|i| is_foldable(commands, *i, table))
        .collect()
}

// The header must open its own range and its immediate successor must be inside it.
fn foldable_range(commands: &[EventCommand], index: usize, table: &CodeTable) -> Option<GroupRange> {
    if index >= commands.len() {
        return None;
    }
    let range = resolve_group_range(commands, index, table);
    (range.start() == index && range.len() > 1 && range.contains(index + 1)).then_some(range)
}

/// Collapsed header indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoldState {
    folded: BTreeSet<usize>,
}

impl FoldState {
    /// Create a state with nothing folded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collapsed header indices.
    pub fn folded(&self) -> &BTreeSet<usize> {
        &self.folded
    }

    /// Returns `true` if `index` is collapsed.
    pub fn is_folded(&self, index: usize) -> bool {
        self.folded.contains(&index)
    }

    /// Toggle the fold at `index`. Returns `false` if `index` is not foldable.
    pub fn toggle(&mut self, commands: &[EventCommand], index: usize, table: &CodeTable) -> bool {
        if !is_foldable(commands, index, table) {
            return false;
        }
        if !self.folded.remove(&index) {
            self.folded.insert(index);
        }
        true
    }

    /// Collapse `index`. Returns `false` if `index` is not foldable.
    pub fn fold(&mut self, commands: &[EventCommand], index: usize, table: &CodeTable) -> bool {
        if !is_foldable(commands, index, table) {
            return false;
        }
        self.folded.insert(index);
        true
    }

    /// Expand `index`.
    pub fn unfold(&mut self, index: usize) -> bool {
        self.folded.remove(&index)
    }

    /// Collapse every foldable header.
    pub fn fold_all(&mut self, commands: &[EventCommand], table: &CodeTable) {
        self.folded = foldable_indices(commands, table);
    }

    /// Expand everything.
    pub fn unfold_all(&mut self) {
        self.folded.clear();
    }

    /// Indices hidden by any collapsed fold (headers themselves stay visible).
    pub fn hidden_indices(&self, commands: &[EventCommand], table: &CodeTable) -> BTreeSet<usize> {
        let mut hidden = BTreeSet::new();
        for &index in &self.folded {
            if let Some(range) = foldable_range(commands, index, table) {
                hidden.extend(range.start() + 1..=range.end());
            }
        }
        hidden
    }

    /// Number of rows hidden by the fold at `index` (0 when not collapsed).
    pub fn hidden_count(&self, commands: &[EventCommand], index: usize, table: &CodeTable) -> usize {
        if !self.is_folded(index) {
            return 0;
        }
        foldable_range(commands, index, table).map_or(0, |range| range.len() - 1)
    }

    /// Visible indices in order.
    pub fn visible_indices(&self, commands: &[EventCommand], table: &CodeTable) -> Vec<usize> {
        let hidden = self.hidden_indices(commands, table);
        (0..commands.len()).filter(|i| !hidden.contains(i)).collect()
    }

    /// Expand every fold whose hidden rows contain one of `matches`. Returns the expanded headers.
    pub fn unfold_containing(
        &mut self,
        commands: &[EventCommand],
        matches: &[usize],
        table: &CodeTable,
    ) -> Vec<usize> {
        let expanded: Vec<usize> = self
            .folded
            .iter()
            .copied()
            .filter(|&index| {
                foldable_range(commands, index, table).is_some_and(|range| {
                    matches
                        .iter()
                        .any(|m| *m > range.start() && *m <= range.end())
                })
            })
            .collect();
        for index in &expanded {
            self.folded.remove(index);
        }
        expanded
    }

    /// Shift folds after `count` commands were inserted at `at`.
    pub fn apply_insertion(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.folded = self
            .folded
            .iter()
            .map(|&i| if i >= at { i + count } else { i })
            .collect();
    }

    /// Shift folds after the given disjoint ranges were removed. Folds inside them are dropped.
    pub fn apply_removal(&mut self, removed: &[GroupRange]) {
        self.folded = self
            .folded
            .iter()
            .filter(|&&i| !removed.iter().any(|range| range.contains(i)))
            .map(|&i| {
                let shift: usize = removed
                    .iter()
                    .filter(|range| range.end() < i)
                    .map(GroupRange::len)
                    .sum();
                i - shift
            })
            .collect();
    }

    /// Carry folds along with a group moved from `from` to start at `to` (indices after the move).
    pub fn apply_move(&mut self, from: GroupRange, to: usize) {
        let len = from.len();
        self.folded = self
            .folded
            .iter()
            .map(|&i| {
                if from.contains(i) {
                    return to + (i - from.start());
                }
                let rest = if i > from.end() { i - len } else { i };
                if rest >= to { rest + len } else { rest }
            })
            .collect();
    }

    /// Drop folds that are no longer foldable.
    pub fn retain_foldable(&mut self, commands: &[EventCommand], table: &CodeTable) {
        self.folded.retain(|i| is_foldable(commands, *i, table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_insertion_and_removal() {
        let mut folds = FoldState::new();
        folds.folded.extend([2, 6, 10]);

        folds.apply_insertion(5, 3);
        assert_eq!(folds.folded().iter().copied().collect::<Vec<_>>(), vec![2, 9, 13]);

        folds.apply_removal(&[GroupRange::new(0, 1), GroupRange::new(9, 9)]);
        assert_eq!(folds.folded().iter().copied().collect::<Vec<_>>(), vec![0, 10]);
    }

    #[test]
    fn test_apply_move() {
        let mut folds = FoldState::new();
        folds.folded.extend([1, 4, 8]);

        // Rows 4..=5 move to the front.
        folds.apply_move(GroupRange::new(4, 5), 0);
        assert_eq!(folds.folded().iter().copied().collect::<Vec<_>>(), vec![0, 3, 8]);
    }
}
