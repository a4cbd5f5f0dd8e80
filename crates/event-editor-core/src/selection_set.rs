//! Row selection model.

use crate::command::EventCommand;
use crate::disable::disabled_block_members;
use crate::structure::{GroupRange, resolve_enclosing_group, terminal_index};
use event_editor_codes::CodeTable;
use std::collections::BTreeSet;

/// Modifier held while clicking a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickModifier {
    /// Plain click: replace the selection.
    #[default]
    None,
    /// Shift-click: extend from the last clicked row.
    Shift,
    /// Ctrl/Cmd-click: toggle the clicked row.
    Toggle,
}

/// Selected row indices plus the last clicked row.
///
/// The primary index (default insertion/paste anchor) is the smallest selected index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<usize>,
    last_clicked: Option<usize>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest selected index.
    pub fn primary(&self) -> Option<usize> {
        self.selected.first().copied()
    }

    /// Last clicked index.
    pub fn last_clicked(&self) -> Option<usize> {
        self.last_clicked
    }

    /// Selected indices in ascending order.
    pub fn indices(&self) -> &BTreeSet<usize> {
        &self.selected
    }

    /// Number of selected rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns `true` if `index` is selected.
    pub fn contains(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Apply click semantics.
    ///
    /// A click on a disabled command acts on every command of its disabled block.
    pub fn click(
        &mut self,
        commands: &[EventCommand],
        index: usize,
        modifier: ClickModifier,
        table: &CodeTable,
    ) {
        match (modifier, self.last_clicked) {
            (ClickModifier::Shift, Some(anchor)) => {
                let range = GroupRange::new(anchor, index);
                self.selected.extend(range.indices());
            }
            (ClickModifier::Toggle, _) => {
                let members = disabled_block_members(commands, index, table);
                if self.selected.contains(&index) {
                    self.selected.retain(|i| !members.contains(i));
                } else {
                    self.selected.extend(members);
                }
                self.last_clicked = Some(index);
            }
            _ => {
                self.selected = disabled_block_members(commands, index, table);
                self.last_clicked = Some(index);
            }
        }
    }

    /// Replace the selection with a contiguous range.
    pub fn select_range(&mut self, range: GroupRange) {
        self.selected = range.indices().collect();
        self.last_clicked = Some(range.start());
    }

    /// Replace the selection with arbitrary indices.
    pub fn select_indices(&mut self, indices: impl IntoIterator<Item = usize>) {
        self.selected = indices.into_iter().collect();
        self.last_clicked = self.selected.first().copied();
    }

    /// Select every command except the terminal sentinel.
    pub fn select_all(&mut self, commands: &[EventCommand]) {
        self.select_indices(0..terminal_index(commands));
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.last_clicked = None;
    }

    /// Drop indices that no longer exist in a list of `len` commands.
    pub fn clamp_to(&mut self, len: usize) {
        self.selected.retain(|i| *i < len);
        if self.last_clicked.is_some_and(|i| i >= len) {
            self.last_clicked = self.selected.last().copied();
        }
    }

    /// Group highlight for a single selected row (visual affordance only).
    pub fn group_highlight(
        &self,
        commands: &[EventCommand],
        table: &CodeTable,
    ) -> Option<GroupRange> {
        if self.selected.len() != 1 {
            return None;
        }
        let index = self.primary()?;
        (index < commands.len()).then(|| resolve_enclosing_group(commands, index, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_is_minimum() {
        let mut selection = SelectionSet::new();
        selection.select_indices([7, 3, 5]);
        assert_eq!(selection.primary(), Some(3));
    }

    #[test]
    fn test_clamp_to() {
        let mut selection = SelectionSet::new();
        selection.select_indices([1, 4]);
        selection.last_clicked = Some(4);
        selection.clamp_to(3);
        assert_eq!(selection.indices().iter().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(selection.last_clicked(), Some(1));
    }
}
