use event_editor_core::{
    CodeTable, Command, CommandExecutor, CommandList, CommandResult, EditCommand, EditError,
    EventCommand, FoldCommand, GroupRange, SelectionCommand, SharedClipboard, begin_drag, code,
    complete_move,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn executor(commands: Vec<EventCommand>) -> CommandExecutor {
    CommandExecutor::new(CommandList::new(commands)).with_clipboard(SharedClipboard::new())
}

fn select(executor: &mut CommandExecutor, start: usize, end: usize) {
    executor
        .execute(Command::Selection(SelectionCommand::SelectRange { start, end }))
        .unwrap();
}

fn shapes(commands: &[EventCommand]) -> Vec<(i32, usize)> {
    commands.iter().map(|c| (c.code, c.indent)).collect()
}

fn plain(code: i32, indent: usize) -> EventCommand {
    EventCommand::with_parameters(code, indent, vec![json!(code)])
}

// 0 Exit, 1-3 Loop, 4 Conditional, 5 ph, 6 Else, 7 ph, 8 End, 9 Break, 10 terminal
fn document() -> Vec<EventCommand> {
    vec![
        plain(code::EXIT_EVENT, 0),
        EventCommand::new(code::LOOP, 0),
        EventCommand::placeholder(1),
        EventCommand::new(code::REPEAT_ABOVE, 0),
        EventCommand::new(code::CONDITIONAL, 0),
        EventCommand::placeholder(1),
        EventCommand::new(code::ELSE, 0),
        EventCommand::placeholder(1),
        EventCommand::new(code::CONDITIONAL_END, 0),
        plain(code::BREAK_LOOP, 0),
        EventCommand::placeholder(0),
    ]
}

#[test]
fn test_begin_drag_rules() {
    let table = CodeTable::standard();
    let commands = document();

    assert_eq!(begin_drag(&commands, 1, &table), Ok(GroupRange::new(1, 3)));
    assert_eq!(begin_drag(&commands, 0, &table), Ok(GroupRange::single(0)));
    assert_eq!(
        begin_drag(&commands, 6, &table),
        Err(EditError::NotDraggable { index: 6 })
    );
    assert_eq!(
        begin_drag(&commands, 5, &table),
        Err(EditError::NotDraggable { index: 5 })
    );
    assert_eq!(
        begin_drag(&commands, 10, &table),
        Err(EditError::TerminalProtected)
    );
    assert_eq!(
        begin_drag(&commands, 11, &table),
        Err(EditError::IndexOutOfBounds { index: 11, len: 11 })
    );
}

#[test]
fn test_drop_into_branch_body_rebases_indent() {
    let table = CodeTable::standard();
    let commands = document();

    let outcome = complete_move(&commands, GroupRange::new(1, 3), 6, &table)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.moved, GroupRange::new(3, 5));
    assert_eq!(
        shapes(&outcome.commands),
        vec![
            (code::EXIT_EVENT, 0),
            (code::CONDITIONAL, 0),
            (code::END, 1),
            (code::LOOP, 1),
            (code::END, 2),
            (code::REPEAT_ABOVE, 1),
            (code::ELSE, 0),
            (code::END, 1),
            (code::CONDITIONAL_END, 0),
            (code::BREAK_LOOP, 0),
            (code::END, 0),
        ]
    );
}

#[test]
fn test_drop_rejections() {
    let table = CodeTable::standard();
    let commands = document();
    let drag = GroupRange::new(1, 3);

    assert_eq!(complete_move(&commands, drag, 2, &table), Ok(None));
    assert_eq!(complete_move(&commands, drag, 4, &table), Ok(None));
    assert_eq!(
        complete_move(&commands, drag, 10, &table),
        Err(EditError::InvalidDropTarget { target: 10 })
    );
    assert_eq!(
        complete_move(&commands, GroupRange::new(9, 10), 0, &table),
        Err(EditError::TerminalProtected)
    );
}

#[test]
fn test_drag_session_through_executor() {
    let mut executor = executor(document());
    let mut session = executor.begin_drag(9).unwrap();
    session.hover(executor.commands(), Some(0));
    assert_eq!(session.target(), Some(0));

    assert_eq!(executor.finish_drag(session), CommandResult::Success);
    assert_eq!(executor.commands()[0].code, code::BREAK_LOOP);
    assert_eq!(executor.commands()[10].code, code::END);
    assert_eq!(
        executor.selection().indices().iter().copied().collect::<Vec<_>>(),
        vec![0]
    );
}

#[test]
fn test_drop_command_through_executor() {
    let mut executor = executor(document());
    let result = executor
        .execute(Command::Edit(EditCommand::Drop {
            drag: GroupRange::new(4, 8),
            target: 0,
        }))
        .unwrap();
    assert_eq!(result, CommandResult::Success);
    assert_eq!(executor.commands()[0].code, code::CONDITIONAL);
    assert_eq!(executor.commands()[5].code, code::EXIT_EVENT);
    assert!(executor.can_undo());
}

#[test]
fn test_move_down_passes_whole_sibling_block() {
    let mut executor = executor(document());
    select(&mut executor, 0, 0);
    executor.execute(Command::Edit(EditCommand::MoveDown)).unwrap();

    assert_eq!(executor.commands()[3].code, code::EXIT_EVENT);
    assert_eq!(executor.commands()[3].indent, 0);
    assert_eq!(
        executor.selection().indices().iter().copied().collect::<Vec<_>>(),
        vec![3]
    );
}

#[test]
fn test_move_down_enters_and_crosses_branches() {
    let mut executor = executor(document());
    select(&mut executor, 3, 3);
    // Selecting the loop's end marker moves the whole loop.
    executor.execute(Command::Edit(EditCommand::MoveDown)).unwrap();
    assert_eq!(
        shapes(&executor.commands()[1..9]),
        vec![
            (code::CONDITIONAL, 0),
            (code::END, 1),
            (code::ELSE, 0),
            (code::END, 1),
            (code::CONDITIONAL_END, 0),
            (code::LOOP, 0),
            (code::END, 1),
            (code::REPEAT_ABOVE, 0),
        ]
    );
}

#[test]
fn test_move_up_leaves_block_below_header() {
    let mut executor = executor(document());
    // Body placeholder of the conditional, directly under its header.
    select(&mut executor, 5, 5);
    executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap();
    assert_eq!(
        shapes(&executor.commands()[4..7]),
        vec![(code::END, 0), (code::CONDITIONAL, 0), (code::ELSE, 0)]
    );
}

#[test]
fn test_move_up_into_previous_branch() {
    let mut executor = executor(document());
    // Body of the else branch moves to the end of the then branch.
    select(&mut executor, 7, 7);
    executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap();
    assert_eq!(
        shapes(&executor.commands()[4..9]),
        vec![
            (code::CONDITIONAL, 0),
            (code::END, 1),
            (code::END, 1),
            (code::ELSE, 0),
            (code::CONDITIONAL_END, 0),
        ]
    );
}

#[test]
fn test_move_up_passes_block_above() {
    let mut executor = executor(document());
    select(&mut executor, 9, 9);
    executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap();
    assert_eq!(executor.commands()[4].code, code::BREAK_LOOP);
    assert_eq!(executor.commands()[5].code, code::CONDITIONAL);
}

#[test]
fn test_move_refused_at_edges() {
    let mut executor = executor(document());
    select(&mut executor, 0, 0);
    assert_eq!(
        executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap(),
        CommandResult::Unchanged
    );

    select(&mut executor, 9, 9);
    assert_eq!(
        executor.execute(Command::Edit(EditCommand::MoveDown)).unwrap(),
        CommandResult::Unchanged
    );
    assert_eq!(executor.undo_depth(), 0);
}

#[test]
fn test_folded_block_moves_with_its_fold() {
    let mut executor = executor(document());
    executor
        .execute(Command::Fold(FoldCommand::Toggle { index: 4 }))
        .unwrap();
    select(&mut executor, 4, 4);
    executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap();

    assert_eq!(executor.commands()[1].code, code::CONDITIONAL);
    assert!(executor.folds().is_folded(1));
    assert_eq!(executor.hidden_count(1), 4);
}

#[test]
fn test_indent_and_outdent() {
    let mut executor = executor(document());
    select(&mut executor, 2, 2);
    executor.execute(Command::Edit(EditCommand::Indent)).unwrap();
    assert_eq!(executor.commands()[2].indent, 2);

    executor.execute(Command::Edit(EditCommand::Outdent)).unwrap();
    executor.execute(Command::Edit(EditCommand::Outdent)).unwrap();
    assert_eq!(executor.commands()[2].indent, 0);

    // Refused once any command would go below zero.
    assert_eq!(
        executor.execute(Command::Edit(EditCommand::Outdent)).unwrap(),
        CommandResult::Unchanged
    );
}

#[test]
fn test_reversed_drag_bounds_are_normalized() {
    let table = CodeTable::standard();
    let commands = document();
    let drag = GroupRange::new(3, 1);
    assert_eq!((drag.start(), drag.end(), drag.len()), (1, 3, 3));

    let reversed = complete_move(&commands, drag, 6, &table).unwrap();
    let forward = complete_move(&commands, GroupRange::new(1, 3), 6, &table).unwrap();
    assert_eq!(reversed, forward);

    let mut executor = executor(commands);
    assert_eq!(
        executor
            .execute(Command::Edit(EditCommand::Drop { drag, target: 6 }))
            .unwrap(),
        CommandResult::Success
    );
    assert_eq!(executor.selection().primary(), Some(3));
}
