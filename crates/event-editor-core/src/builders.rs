//! Insert/update builders for multi-command structures.
//!
//! Inserting a block header synthesizes its skeleton (body placeholders, branch markers, end
//! marker). Updating a header diffs the branches the parameter editor asks for against the
//! branches present and inserts or removes only the affected marker spans; nested content of
//! unaffected branches is left alone. Continuation primaries have their whole line run rebuilt.

use crate::command::EventCommand;
use crate::error::EditError;
use crate::movement::required_indent_at;
use crate::structure::{GroupRange, direct_markers, resolve_group_range, terminal_index};
use event_editor_codes::{Code, CodeRole, CodeTable, code};
use serde_json::{Value, json};

/// What a parameter editor hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterEditorResult {
    /// The finished argument list of the primary command.
    pub parameters: Vec<Value>,
    /// Additional commands for multi-command codes: continuation lines, or markers naming the
    /// optional branches the block should have.
    pub extra_commands: Vec<EventCommand>,
}

impl ParameterEditorResult {
    /// A result without extra commands.
    pub fn new(parameters: Vec<Value>) -> Self {
        Self {
            parameters,
            extra_commands: Vec::new(),
        }
    }

    /// Attach extra commands.
    pub fn with_extra_commands(mut self, extra_commands: Vec<EventCommand>) -> Self {
        self.extra_commands = extra_commands;
        self
    }

    fn requests(&self, code: Code) -> bool {
        self.extra_commands.iter().any(|c| c.code == code)
    }
}

/// Optional branches a block should have.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredBranches {
    /// Conditional: an else branch.
    pub else_branch: bool,
    /// Choice menu: one label per option.
    pub choices: Vec<String>,
    /// Choice menu: a cancel branch.
    pub cancel_branch: bool,
    /// Battle: an escape branch.
    pub escape_branch: bool,
    /// Battle: a lose branch.
    pub lose_branch: bool,
}

impl DesiredBranches {
    /// Derive the desired branches of a `code` block from an editor result.
    pub fn from_editor(code: Code, result: &ParameterEditorResult) -> Self {
        let mut branches = Self::default();
        match code {
            code::CONDITIONAL => branches.else_branch = result.requests(code::ELSE),
            code::SHOW_CHOICES => {
                branches.choices = result
                    .parameters
                    .first()
                    .and_then(Value::as_array)
                    .map(|labels| {
                        labels
                            .iter()
                            .map(|label| label.as_str().unwrap_or_default().to_string())
                            .collect()
                    })
                    .unwrap_or_default();
                branches.cancel_branch = result.requests(code::WHEN_CANCEL);
            }
            code::BATTLE => {
                branches.escape_branch = result.requests(code::IF_ESCAPE);
                branches.lose_branch = result.requests(code::IF_LOSE);
            }
            _ => {}
        }
        branches
    }

    /// A battle is a block only while it has an escape or lose branch.
    pub fn wants_battle_branches(&self) -> bool {
        self.escape_branch || self.lose_branch
    }
}

/// Result of an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    /// New command list.
    pub commands: Vec<EventCommand>,
    /// The built group in the new list.
    pub range: GroupRange,
}

fn marker(code: Code, indent: usize, parameters: Vec<Value>) -> [EventCommand; 2] {
    [
        EventCommand::with_parameters(code, indent, parameters),
        EventCommand::placeholder(indent + 1),
    ]
}

// Win branch, the requested escape and lose branches, then the end marker.
fn battle_branches(indent: usize, branches: &DesiredBranches) -> Vec<EventCommand> {
    let mut run = marker(code::IF_WIN, indent, Vec::new()).to_vec();
    if branches.escape_branch {
        run.extend(marker(code::IF_ESCAPE, indent, Vec::new()));
    }
    if branches.lose_branch {
        run.extend(marker(code::IF_LOSE, indent, Vec::new()));
    }
    run.push(EventCommand::new(code::BATTLE_END, indent));
    run
}

fn choice_branch(index: usize, label: &str, indent: usize) -> [EventCommand; 2] {
    marker(code::WHEN_CHOICE, indent, vec![json!(index), json!(label)])
}

fn primary_parameters(code: Code, result: &ParameterEditorResult, table: &CodeTable) -> Vec<Value> {
    if table.takes_no_arguments(code) {
        Vec::new()
    } else {
        result.parameters.clone()
    }
}

fn continuation_lines(
    primary: Code,
    indent: usize,
    result: &ParameterEditorResult,
    table: &CodeTable,
) -> Vec<EventCommand> {
    let Some(continuation) = table.continuation_of(primary) else {
        return Vec::new();
    };
    result
        .extra_commands
        .iter()
        .filter(|c| c.code == continuation)
        .map(|c| EventCommand::with_parameters(continuation, indent, c.parameters.clone()))
        .collect()
}

/// Build the full command run for a new `code` command at `indent`.
pub fn build_block(
    code: Code,
    indent: usize,
    result: &ParameterEditorResult,
    table: &CodeTable,
) -> Vec<EventCommand> {
    let head = EventCommand::with_parameters(code, indent, primary_parameters(code, result, table));
    let branches = DesiredBranches::from_editor(code, result);
    let mut run = vec![head];

    match code {
        code::CONDITIONAL => {
            run.push(EventCommand::placeholder(indent + 1));
            if branches.else_branch {
                run.extend(marker(code::ELSE, indent, Vec::new()));
            }
            run.push(EventCommand::new(code::CONDITIONAL_END, indent));
        }
        code::LOOP => {
            run.push(EventCommand::placeholder(indent + 1));
            run.push(EventCommand::new(code::REPEAT_ABOVE, indent));
        }
        code::SHOW_CHOICES => {
            for (i, label) in branches.choices.iter().enumerate() {
                run.extend(choice_branch(i, label, indent));
            }
            if branches.cancel_branch {
                run.extend(marker(code::WHEN_CANCEL, indent, Vec::new()));
            }
            run.push(EventCommand::new(code::CHOICES_END, indent));
        }
        code::BATTLE => {
            if branches.wants_battle_branches() {
                run.extend(battle_branches(indent, &branches));
            }
        }
        _ => match table.role(code) {
            CodeRole::BlockPrimary => {
                let end = table
                    .block_end_codes(code)
                    .and_then(|ends| ends.first().copied());
                if let Some(end) = end {
                    run.push(EventCommand::placeholder(indent + 1));
                    run.push(EventCommand::new(end, indent));
                }
            }
            CodeRole::ContinuationPrimary => {
                run.extend(continuation_lines(code, indent, result, table));
            }
            _ => {}
        },
    }

    run
}

/// Insert a new `code` command (with its skeleton) before `anchor`.
///
/// Without an anchor the command goes right before the terminal. The indent is the one
/// required at the anchor.
pub fn insert_command(
    commands: &[EventCommand],
    anchor: Option<usize>,
    code: Code,
    result: &ParameterEditorResult,
    table: &CodeTable,
) -> Result<BuildOutcome, EditError> {
    let terminal = terminal_index(commands);
    let anchor = anchor.unwrap_or(terminal);
    if anchor > terminal {
        return Err(EditError::IndexOutOfBounds {
            index: anchor,
            len: commands.len(),
        });
    }

    let indent = required_indent_at(commands, anchor, table);
    let run = build_block(code, indent, result, table);
    let range = GroupRange::new(anchor, anchor + run.len() - 1);

    let mut updated = commands.to_vec();
    updated.splice(anchor..anchor, run);
    log::debug!("inserted code {code} at {anchor} ({} commands)", range.len());
    Ok(BuildOutcome {
        commands: updated,
        range,
    })
}

struct Splice {
    at: usize,
    remove: usize,
    insert: Vec<EventCommand>,
}

impl Splice {
    fn insert(at: usize, insert: impl IntoIterator<Item = EventCommand>) -> Self {
        Self {
            at,
            remove: 0,
            insert: insert.into_iter().collect(),
        }
    }

    fn remove(from: usize, until: usize) -> Self {
        Self {
            at: from,
            remove: until - from,
            insert: Vec::new(),
        }
    }
}

// Applied back to front; at equal positions removals go first so an insertion lands in front
// of what remains.
fn apply_splices(commands: &mut Vec<EventCommand>, mut splices: Vec<Splice>) {
    splices.sort_by(|a, b| b.at.cmp(&a.at).then(b.remove.cmp(&a.remove)));
    for splice in splices {
        commands.splice(splice.at..splice.at + splice.remove, splice.insert);
    }
}

/// Apply an editor result to the command at `index`.
///
/// Block headers get their branches reconciled with [`DesiredBranches`]; continuation
/// primaries get their line run replaced.
pub fn update_command(
    commands: &[EventCommand],
    index: usize,
    result: &ParameterEditorResult,
    table: &CodeTable,
) -> Result<BuildOutcome, EditError> {
    let terminal = terminal_index(commands);
    let Some(command) = commands.get(index) else {
        return Err(EditError::IndexOutOfBounds {
            index,
            len: commands.len(),
        });
    };
    if index == terminal {
        return Err(EditError::TerminalProtected);
    }

    let head_code = command.code;
    let indent = command.indent;
    let mut updated = commands.to_vec();
    updated[index].parameters = primary_parameters(head_code, result, table);

    match table.role(head_code) {
        CodeRole::Marker | CodeRole::Continuation => {
            return Err(EditError::NotABlockHeader {
                index,
                code: head_code,
            });
        }
        CodeRole::ContinuationPrimary => {
            let run = resolve_group_range(commands, index, table);
            let lines = continuation_lines(head_code, indent, result, table);
            updated.splice(run.start() + 1..=run.end(), lines);
        }
        CodeRole::BlockPrimary => {
            let branches = DesiredBranches::from_editor(head_code, result);
            let splices = branch_splices(&mut updated, index, &branches, table);
            apply_splices(&mut updated, splices);
        }
        CodeRole::Plain => {}
    }

    let range = resolve_group_range(&updated, index, table);
    log::debug!(
        "updated code {head_code} at {index} (group {}..={})",
        range.start(),
        range.end()
    );
    Ok(BuildOutcome {
        commands: updated,
        range,
    })
}

// Branch edits for the block headed at `header`. Marker arguments that stay in place are
// rewritten directly in `commands`.
fn branch_splices(
    commands: &mut [EventCommand],
    header: usize,
    branches: &DesiredBranches,
    table: &CodeTable,
) -> Vec<Splice> {
    let markers: Vec<(usize, Code)> = direct_markers(commands, header, table)
        .into_iter()
        .map(|m| (m, commands[m].code))
        .collect();
    let indent = commands[header].indent;
    if commands[header].code == code::BATTLE {
        match (markers.last(), branches.wants_battle_branches()) {
            (None, true) => {
                return vec![Splice::insert(header + 1, battle_branches(indent, branches))];
            }
            (Some(&(end, _)), false) => return vec![Splice::remove(header + 1, end + 1)],
            _ => {}
        }
    }
    let Some(&(end, _)) = markers.last() else {
        return Vec::new();
    };
    let find = |code: Code| markers.iter().find(|(_, c)| *c == code).map(|(m, _)| *m);
    let next_after = |at: usize| {
        markers
            .iter()
            .map(|(m, _)| *m)
            .find(|&m| m > at)
            .unwrap_or(end)
    };
    let mut splices = Vec::new();

    match commands[header].code {
        code::CONDITIONAL => match (find(code::ELSE), branches.else_branch) {
            (None, true) => {
                splices.push(Splice::insert(end, marker(code::ELSE, indent, Vec::new())));
            }
            (Some(at), false) => splices.push(Splice::remove(at, end)),
            _ => {}
        },
        code::SHOW_CHOICES => {
            let whens: Vec<usize> = markers
                .iter()
                .filter(|(_, c)| *c == code::WHEN_CHOICE)
                .map(|(m, _)| *m)
                .collect();
            let cancel = find(code::WHEN_CANCEL);
            let after_whens = cancel.unwrap_or(end);
            let wanted = branches.choices.len();

            for (i, (&at, label)) in whens.iter().zip(&branches.choices).enumerate() {
                commands[at].parameters = vec![json!(i), json!(label)];
            }
            if wanted < whens.len() {
                splices.push(Splice::remove(whens[wanted], after_whens));
            } else if wanted > whens.len() {
                let added = (whens.len()..wanted)
                    .flat_map(|i| choice_branch(i, &branches.choices[i], indent));
                splices.push(Splice::insert(after_whens, added));
            }

            match (cancel, branches.cancel_branch) {
                (None, true) => {
                    let branch = marker(code::WHEN_CANCEL, indent, Vec::new());
                    splices.push(Splice::insert(end, branch));
                }
                (Some(at), false) => splices.push(Splice::remove(at, end)),
                _ => {}
            }
        }
        code::BATTLE => {
            if find(code::IF_WIN).is_none() {
                let branch = marker(code::IF_WIN, indent, Vec::new());
                splices.push(Splice::insert(header + 1, branch));
            }
            let lose = find(code::IF_LOSE);
            match (find(code::IF_ESCAPE), branches.escape_branch) {
                (None, true) => {
                    let branch = marker(code::IF_ESCAPE, indent, Vec::new());
                    splices.push(Splice::insert(lose.unwrap_or(end), branch));
                }
                (Some(at), false) => splices.push(Splice::remove(at, next_after(at))),
                _ => {}
            }
            match (lose, branches.lose_branch) {
                (None, true) => {
                    let branch = marker(code::IF_LOSE, indent, Vec::new());
                    splices.push(Splice::insert(end, branch));
                }
                (Some(at), false) => splices.push(Splice::remove(at, next_after(at))),
                _ => {}
            }
        }
        _ => {}
    }

    splices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_argument_codes_drop_parameters() {
        let table = CodeTable::standard();
        let result = ParameterEditorResult::new(vec![json!("ignored")]);
        let run = build_block(code::LOOP, 2, &result, &table);
        assert!(run[0].parameters.is_empty());
        assert_eq!(
            run.iter().map(|c| (c.code, c.indent)).collect::<Vec<_>>(),
            vec![(code::LOOP, 2), (code::END, 3), (code::REPEAT_ABOVE, 2)]
        );
    }

    #[test]
    fn test_desired_branches_from_editor() {
        let result = ParameterEditorResult::new(vec![json!(["Yes", "No"]), json!(-2)])
            .with_extra_commands(vec![EventCommand::new(code::WHEN_CANCEL, 0)]);
        let branches = DesiredBranches::from_editor(code::SHOW_CHOICES, &result);
        assert_eq!(branches.choices, vec!["Yes".to_string(), "No".to_string()]);
        assert!(branches.cancel_branch);
        assert!(!branches.else_branch);
    }
}
