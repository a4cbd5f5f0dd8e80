//! Structural range resolution.
//!
//! This is the only place where block structure is inferred from the flat command list. Every
//! bulk operation (delete, copy, disable, fold, move) normalizes its input through
//! [`expand_selection_to_groups`] so that no operation ever splits a structural group.
//!
//! Malformed structure never fails: a block header without an end marker, or a marker without a
//! discoverable parent, degrades to a one-command group.

use crate::command::EventCommand;
use event_editor_codes::{Code, CodeTable};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// An inclusive index range `[start, end]` of commands treated as one unit.
///
/// `start <= end` always holds; the only constructors normalize their bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupRange {
    start: usize,
    end: usize,
}

impl GroupRange {
    /// Create a range; `start` and `end` are swapped if given in reverse.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// A one-command range.
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// First index (inclusive).
    pub fn start(&self) -> usize {
        self.start
    }

    /// Last index (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of commands in the range.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`; a group holds at least one command.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `index` lies inside the range.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// The covered indices.
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Index of the terminal sentinel (the last command).
pub fn terminal_index(commands: &[EventCommand]) -> usize {
    commands.len().saturating_sub(1)
}

/// Compute the minimal contiguous range that must be treated atomically with `index`.
///
/// - Continuation lines resolve to themselves.
/// - Other children (block markers and end codes) resolve to their parent's block.
/// - Continuation primaries span their trailing continuation run.
/// - Block primaries span up to the matching end code, honoring same-code nesting at the same
///   indent.
pub fn resolve_group_range(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> GroupRange {
    let Some(command) = commands.get(index) else {
        return GroupRange::single(index);
    };

    if table.is_child(command.code) {
        if table.is_simple_continuation(command.code) {
            return GroupRange::single(index);
        }
        return match find_block_parent(commands, index, table) {
            Some(parent) => resolve_primary(commands, parent, table),
            None => {
                log::debug!(
                    "marker {} at {} has no parent block, treating as single command",
                    command.code,
                    index
                );
                GroupRange::single(index)
            }
        };
    }

    resolve_primary(commands, index, table)
}

/// Like [`resolve_group_range`], but a continuation line resolves to the group of its primary.
///
/// Used where a whole logical command is wanted (group highlight, keyboard moves).
pub fn resolve_enclosing_group(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> GroupRange {
    let Some(command) = commands.get(index) else {
        return GroupRange::single(index);
    };

    if table.is_simple_continuation(command.code)
        && let Some(primary) = find_continuation_primary(commands, index, table)
    {
        return resolve_primary(commands, primary, table);
    }

    resolve_group_range(commands, index, table)
}

/// Expand an arbitrary index set into sorted, disjoint, maximal contiguous group ranges.
///
/// Indices at or beyond the terminal sentinel are ignored; the sentinel is never part of a
/// returned range.
pub fn expand_selection_to_groups<I>(
    commands: &[EventCommand],
    indices: I,
    table: &CodeTable,
) -> Vec<GroupRange>
where
    I: IntoIterator<Item = usize>,
{
    let terminal = terminal_index(commands);
    let mut covered: BTreeSet<usize> = BTreeSet::new();

    for index in indices {
        if index >= terminal {
            continue;
        }
        let range = resolve_group_range(commands, index, table);
        covered.extend(range.indices().filter(|i| *i < terminal));
    }

    merge_runs(covered)
}

/// Returns `false` only when `target` is at or beyond the terminal sentinel.
///
/// A target inside the dragged range is still reported as valid; callers must treat it as a
/// no-op move.
pub fn is_valid_drop_target(commands: &[EventCommand], target: usize, _drag: GroupRange) -> bool {
    target < terminal_index(commands)
}

/// Index of the nearest structural parent of a marker, if any.
pub fn parent_index(commands: &[EventCommand], index: usize, table: &CodeTable) -> Option<usize> {
    let command = commands.get(index)?;
    if table.is_simple_continuation(command.code) {
        find_continuation_primary(commands, index, table)
    } else if table.is_child(command.code) {
        find_block_parent(commands, index, table)
    } else {
        None
    }
}

/// Marker indices belonging directly to the block headed at `header` (same indent, depth 0).
///
/// The returned list ends with the end marker when the block is closed.
pub(crate) fn direct_markers(
    commands: &[EventCommand],
    header: usize,
    table: &CodeTable,
) -> Vec<usize> {
    let range = resolve_group_range(commands, header, table);
    let head = &commands[header];
    let ends = table.block_end_codes(head.code);
    let mut depth = 0usize;
    let mut markers = Vec::new();

    for index in header + 1..=range.end {
        let command = &commands[index];
        if command.indent != head.indent {
            continue;
        }
        if command.code == head.code {
            depth += 1;
        } else if ends.is_some_and(|ends| ends.contains(&command.code)) && depth > 0 {
            depth -= 1;
        } else if depth == 0
            && table
                .parents_of(command.code)
                .is_some_and(|parents| parents.contains(&head.code))
        {
            markers.push(index);
        }
    }

    markers
}

/// Merge a sorted index set into maximal contiguous runs.
pub(crate) fn merge_runs(indices: impl IntoIterator<Item = usize>) -> Vec<GroupRange> {
    let mut runs: Vec<GroupRange> = Vec::new();
    for index in indices {
        match runs.last_mut() {
            Some(last) if last.end + 1 == index => last.end = index,
            Some(last) if last.contains(index) => {}
            _ => runs.push(GroupRange::single(index)),
        }
    }
    runs
}

fn resolve_primary(commands: &[EventCommand], index: usize, table: &CodeTable) -> GroupRange {
    let head = &commands[index];

    if let Some(continuation) = table.continuation_of(head.code) {
        let run = commands[index + 1..]
            .iter()
            .take_while(|c| c.code == continuation && c.indent == head.indent)
            .count();
        return GroupRange::new(index, index + run);
    }

    if let Some(end_codes) = table.block_end_codes(head.code) {
        return match find_block_end(commands, index, head.code, end_codes) {
            Some(end) => GroupRange::new(index, end),
            None => {
                log::debug!(
                    "block {} at {} has no end marker, treating as single command",
                    head.code,
                    index
                );
                GroupRange::single(index)
            }
        };
    }

    GroupRange::single(index)
}

fn find_block_end(
    commands: &[EventCommand],
    index: usize,
    primary: Code,
    end_codes: &BTreeSet<Code>,
) -> Option<usize> {
    let indent = commands[index].indent;
    let mut depth = 0usize;

    for (offset, command) in commands[index + 1..].iter().enumerate() {
        if command.indent < indent {
            return None;
        }
        if command.indent != indent {
            continue;
        }
        if command.code == primary {
            depth += 1;
        } else if end_codes.contains(&command.code) {
            if depth == 0 {
                return Some(index + 1 + offset);
            }
            depth -= 1;
        }
    }

    None
}

// Backward scan at the child's indent. An end code of a candidate parent means a closed
// sibling block sits in between, so its header is skipped.
fn find_block_parent(commands: &[EventCommand], index: usize, table: &CodeTable) -> Option<usize> {
    let child = &commands[index];
    let parents = table.parents_of(child.code)?;
    let mut depth = 0usize;

    for candidate in (0..index).rev() {
        let command = &commands[candidate];
        if command.indent < child.indent {
            return None;
        }
        if command.indent != child.indent {
            continue;
        }
        if parents.contains(&command.code) {
            if depth == 0 {
                return Some(candidate);
            }
            depth -= 1;
        } else if parents.iter().any(|parent| {
            table
                .block_end_codes(*parent)
                .is_some_and(|ends| ends.contains(&command.code))
        }) {
            depth += 1;
        }
    }

    None
}

fn find_continuation_primary(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> Option<usize> {
    let line = &commands[index];
    let mut candidate = index;
    while candidate > 0 {
        candidate -= 1;
        let command = &commands[candidate];
        if command.indent != line.indent {
            return None;
        }
        if command.code == line.code {
            continue;
        }
        return (table.continuation_of(command.code) == Some(line.code)).then_some(candidate);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_editor_codes::code::*;

    fn cmd(code: Code, indent: usize) -> EventCommand {
        EventCommand::new(code, indent)
    }

    #[test]
    fn test_merge_runs() {
        let runs = merge_runs([1, 2, 3, 5, 7, 8]);
        assert_eq!(
            runs,
            vec![
                GroupRange::new(1, 3),
                GroupRange::single(5),
                GroupRange::new(7, 8)
            ]
        );
    }

    #[test]
    fn test_text_run() {
        let table = CodeTable::standard();
        let commands = vec![
            cmd(SHOW_TEXT, 0),
            cmd(TEXT_LINE, 0),
            cmd(TEXT_LINE, 0),
            cmd(SHOW_TEXT, 0),
            cmd(END, 0),
        ];
        assert_eq!(
            resolve_group_range(&commands, 0, &table),
            GroupRange::new(0, 2)
        );
        assert_eq!(
            resolve_group_range(&commands, 1, &table),
            GroupRange::single(1)
        );
        assert_eq!(
            resolve_enclosing_group(&commands, 2, &table),
            GroupRange::new(0, 2)
        );
        assert_eq!(
            resolve_group_range(&commands, 3, &table),
            GroupRange::single(3)
        );
    }

    #[test]
    fn test_direct_markers_skip_nested() {
        let table = CodeTable::standard();
        let commands = vec![
            cmd(CONDITIONAL, 0),
            cmd(CONDITIONAL, 1),
            cmd(ELSE, 1),
            cmd(CONDITIONAL_END, 1),
            cmd(ELSE, 0),
            cmd(END, 1),
            cmd(CONDITIONAL_END, 0),
            cmd(END, 0),
        ];
        assert_eq!(direct_markers(&commands, 0, &table), vec![4, 6]);
        assert_eq!(direct_markers(&commands, 1, &table), vec![2, 3]);
    }

    #[test]
    fn test_parent_index() {
        let table = CodeTable::standard();
        let commands = vec![
            cmd(LOOP, 0),
            cmd(SHOW_TEXT, 1),
            cmd(TEXT_LINE, 1),
            cmd(REPEAT_ABOVE, 0),
            cmd(END, 0),
        ];
        assert_eq!(parent_index(&commands, 2, &table), Some(1));
        assert_eq!(parent_index(&commands, 3, &table), Some(0));
        assert_eq!(parent_index(&commands, 1, &table), None);
    }
}
