//! Reordering of whole structural groups.
//!
//! Pointer drags are reduced to a pure function: the host resolves pointer geometry to a target
//! index and calls [`complete_move`] (or drives a [`DragSession`]). Keyboard moves swap the
//! expanded selection past the adjacent structural group, so a folded block is passed in one
//! step.
//!
//! In both cases the moved commands are re-indented to the depth required at the drop point,
//! keeping their relative nesting.

use crate::command::EventCommand;
use crate::disable::disabled_block_span;
use crate::error::EditError;
use crate::structure::{
    GroupRange, expand_selection_to_groups, is_valid_drop_target, parent_index,
    resolve_enclosing_group, resolve_group_range, terminal_index,
};
use event_editor_codes::{CodeRole, CodeTable};
use std::collections::BTreeSet;

/// Result of a move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// New command list.
    pub commands: Vec<EventCommand>,
    /// The moved range before the move.
    pub from: GroupRange,
    /// Where the moved commands landed.
    pub moved: GroupRange,
}

/// Resolve the drag payload for a grab at `index`.
///
/// Only structural headers and plain commands can be grabbed. A disabled command drags the
/// contiguous run sharing its block id.
pub fn begin_drag(
    commands: &[EventCommand],
    index: usize,
    table: &CodeTable,
) -> Result<GroupRange, EditError> {
    let Some(command) = commands.get(index) else {
        return Err(EditError::IndexOutOfBounds {
            index,
            len: commands.len(),
        });
    };
    if index == terminal_index(commands) {
        return Err(EditError::TerminalProtected);
    }
    if let Some(span) = disabled_block_span(commands, index, table) {
        return Ok(span);
    }
    if command.is_end() || table.is_child(command.code) {
        return Err(EditError::NotDraggable { index });
    }
    Ok(resolve_group_range(commands, index, table))
}

/// Indent a command inserted before position `at` must take.
///
/// Inserting before an interior or end marker lands at the end of the preceding branch body,
/// one level deeper than the marker.
pub fn required_indent_at(commands: &[EventCommand], at: usize, table: &CodeTable) -> usize {
    let Some(command) = commands.get(at) else {
        return 0;
    };
    match table.role(command.code) {
        CodeRole::Marker => command.indent + 1,
        _ => command.indent,
    }
}

/// Move the group `drag` so that it lands before `target` (an index in the current list).
///
/// Returns `Ok(None)` when the target lies inside the dragged range or right after it, which
/// would not change anything.
pub fn complete_move(
    commands: &[EventCommand],
    drag: GroupRange,
    target: usize,
    table: &CodeTable,
) -> Result<Option<MoveOutcome>, EditError> {
    if drag.end() >= terminal_index(commands) {
        return Err(EditError::TerminalProtected);
    }
    if !is_valid_drop_target(commands, target, drag) {
        return Err(EditError::InvalidDropTarget { target });
    }
    if drag.contains(target) || target == drag.end() + 1 {
        return Ok(None);
    }
    Ok(Some(splice_move(commands, drag, target, table)))
}

/// A pointer drag gesture.
///
/// The payload is locked on grab. Releasing without a valid hovered target cancels the gesture
/// and nothing is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    payload: GroupRange,
    target: Option<usize>,
}

impl DragSession {
    /// Start a drag at `index`.
    pub fn begin(
        commands: &[EventCommand],
        index: usize,
        table: &CodeTable,
    ) -> Result<Self, EditError> {
        let payload = begin_drag(commands, index, table)?;
        log::trace!("drag started on {}..={}", payload.start(), payload.end());
        Ok(Self {
            payload,
            target: None,
        })
    }

    /// Dragged range.
    pub fn payload(&self) -> GroupRange {
        self.payload
    }

    /// Currently held drop target.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Update the hovered drop index. Invalid and no-op targets clear the held target.
    pub fn hover(&mut self, commands: &[EventCommand], target: Option<usize>) {
        self.target = target.filter(|&t| {
            is_valid_drop_target(commands, t, self.payload)
                && !self.payload.contains(t)
                && t != self.payload.end() + 1
        });
    }

    /// Release the pointer. Returns `None` when the gesture is cancelled.
    pub fn finish(self, commands: &[EventCommand], table: &CodeTable) -> Option<MoveOutcome> {
        let target = self.target?;
        match complete_move(commands, self.payload, target, table) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::debug!("drag cancelled: {err}");
                None
            }
        }
    }

    /// Abandon the gesture.
    pub fn cancel(self) {
        log::trace!("drag on {}..={} cancelled", self.payload.start(), self.payload.end());
    }
}

/// Move the selection up past the adjacent structural group.
///
/// Directly below a block header the selection leaves the block; directly below an interior
/// marker it moves to the end of the preceding branch. A sibling block above is passed whole.
pub fn move_up(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<MoveOutcome> {
    let span = movable_span(commands, selection, table)?;
    if span.start() == 0 {
        return None;
    }
    let prev = span.start() - 1;
    let above = &commands[prev];

    let target = match table.role(above.code) {
        CodeRole::Marker if table.is_block_end(above.code) => {
            resolve_group_range(commands, prev, table).start()
        }
        CodeRole::Marker => match parent_index(commands, prev, table) {
            Some(parent) if parent + 1 == prev => parent,
            _ => prev,
        },
        CodeRole::BlockPrimary
            if resolve_group_range(commands, prev, table).contains(span.end()) =>
        {
            prev
        }
        _ => neighbour_group(commands, prev, table).start(),
    };

    Some(splice_move(commands, span, target, table))
}

/// Move the selection down past the adjacent structural group.
///
/// Directly above an interior or end marker the selection moves past that marker. Refused when
/// only the terminal command follows.
pub fn move_down(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<MoveOutcome> {
    let span = movable_span(commands, selection, table)?;
    let next = span.end() + 1;
    if next >= terminal_index(commands) {
        return None;
    }

    let target = match table.role(commands[next].code) {
        CodeRole::Marker => next + 1,
        _ => neighbour_group(commands, next, table).end() + 1,
    };

    Some(splice_move(commands, span, target, table))
}

/// Shift the group-expanded selection by `delta` indent levels.
///
/// Refused when any command would go below indent 0.
pub fn shift_indent(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    delta: isize,
    table: &CodeTable,
) -> Option<(Vec<EventCommand>, Vec<GroupRange>)> {
    let ranges = expand_selection_to_groups(commands, selection.iter().copied(), table);
    if ranges.is_empty() || delta == 0 {
        return None;
    }
    let underflows = ranges
        .iter()
        .flat_map(GroupRange::indices)
        .any(|i| commands[i].indent.checked_add_signed(delta).is_none());
    if underflows {
        return None;
    }

    let mut result = commands.to_vec();
    for index in ranges.iter().flat_map(GroupRange::indices) {
        result[index] = commands[index].rebased(delta, table);
    }
    Some((result, ranges))
}

// Covering span of the selection, lifted to whole logical commands and re-expanded until no
// group straddles its boundary.
fn movable_span(
    commands: &[EventCommand],
    selection: &BTreeSet<usize>,
    table: &CodeTable,
) -> Option<GroupRange> {
    let terminal = terminal_index(commands);
    let mut covered: BTreeSet<usize> = BTreeSet::new();
    for &index in selection.iter().filter(|i| **i < terminal) {
        covered.extend(neighbour_group(commands, index, table).indices());
    }

    let mut span = GroupRange::new(*covered.first()?, *covered.last()?);
    loop {
        let ranges = expand_selection_to_groups(commands, span.indices(), table);
        let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
            return None;
        };
        let grown = GroupRange::new(first.start().min(span.start()), last.end().max(span.end()));
        if grown == span {
            return Some(span);
        }
        span = grown;
    }
}

fn neighbour_group(commands: &[EventCommand], index: usize, table: &CodeTable) -> GroupRange {
    disabled_block_span(commands, index, table)
        .unwrap_or_else(|| resolve_enclosing_group(commands, index, table))
}

fn splice_move(
    commands: &[EventCommand],
    span: GroupRange,
    target: usize,
    table: &CodeTable,
) -> MoveOutcome {
    let mut rest: Vec<EventCommand> = Vec::with_capacity(commands.len());
    rest.extend_from_slice(&commands[..span.start()]);
    rest.extend_from_slice(&commands[span.end() + 1..]);

    let insert_at = if target > span.end() {
        target - span.len()
    } else {
        target
    };
    // Not simply the indent of the command at the drop point: dropping right before an else or
    // end marker joins the preceding branch body, one level below that marker.
    let required = required_indent_at(&rest, insert_at, table);
    let base = commands[span.indices()]
        .iter()
        .map(|c| c.indent)
        .min()
        .unwrap_or(required);
    let delta = required as isize - base as isize;

    let moved: Vec<EventCommand> = commands[span.indices()]
        .iter()
        .map(|c| c.rebased(delta, table))
        .collect();
    let moved_range = GroupRange::new(insert_at, insert_at + span.len() - 1);
    rest.splice(insert_at..insert_at, moved);

    log::debug!(
        "moved {}..={} to {}..={} (indent delta {delta})",
        span.start(),
        span.end(),
        moved_range.start(),
        moved_range.end()
    );
    MoveOutcome {
        commands: rest,
        from: span,
        moved: moved_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_editor_codes::code::*;

    #[test]
    fn test_required_indent_before_markers() {
        let table = CodeTable::standard();
        let commands = vec![
            EventCommand::new(CONDITIONAL, 0),
            EventCommand::placeholder(1),
            EventCommand::new(ELSE, 0),
            EventCommand::placeholder(1),
            EventCommand::new(CONDITIONAL_END, 0),
            EventCommand::placeholder(0),
        ];
        assert_eq!(required_indent_at(&commands, 0, &table), 0);
        assert_eq!(required_indent_at(&commands, 1, &table), 1);
        assert_eq!(required_indent_at(&commands, 2, &table), 1);
        assert_eq!(required_indent_at(&commands, 4, &table), 1);
        assert_eq!(required_indent_at(&commands, 5, &table), 0);
    }

    #[test]
    fn test_drag_session_cancel_without_target() {
        let table = CodeTable::standard();
        let commands = vec![
            EventCommand::new(EXIT_EVENT, 0),
            EventCommand::new(BREAK_LOOP, 0),
            EventCommand::placeholder(0),
        ];
        let mut session = DragSession::begin(&commands, 0, &table).unwrap();
        session.hover(&commands, Some(1));
        assert_eq!(session.target(), None);
        session.hover(&commands, Some(2));
        assert_eq!(session.target(), None);
        assert!(session.finish(&commands, &table).is_none());
    }
}
