use event_editor_core::{
    Command, CommandExecutor, CommandList, EditCommand, EditorStateManager, EventCommand,
    FoldCommand, SearchCommand, SearchOptions, SelectionCommand, SharedClipboard, StateChangeType,
    code,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn manager() -> EditorStateManager {
    let commands = vec![
        EventCommand::new(code::LOOP, 0),
        EventCommand::with_parameters(code::COMMENT, 1, vec![json!("inside")]),
        EventCommand::new(code::REPEAT_ABOVE, 0),
        EventCommand::new(code::EXIT_EVENT, 0),
        EventCommand::placeholder(0),
    ];
    EditorStateManager::from_executor(
        CommandExecutor::new(CommandList::new(commands)).with_clipboard(SharedClipboard::new()),
    )
}

fn recorder(manager: &mut EditorStateManager) -> Arc<Mutex<Vec<StateChangeType>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.subscribe(move |change| {
        sink.lock().unwrap().push(change.change_type);
    });
    seen
}

#[test]
fn test_notifications_per_change_kind() {
    let mut manager = manager();
    let seen = recorder(&mut manager);

    manager
        .execute(Command::Selection(SelectionCommand::SelectRange { start: 3, end: 3 }))
        .unwrap();
    manager.execute(Command::Edit(EditCommand::Delete)).unwrap();
    manager
        .execute(Command::Fold(FoldCommand::Toggle { index: 0 }))
        .unwrap();
    manager
        .execute(Command::Search(SearchCommand::Find {
            query: "inside".to_string(),
            options: SearchOptions::default(),
        }))
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().clone(),
        vec![
            StateChangeType::SelectionChanged,
            StateChangeType::DocumentModified,
            StateChangeType::FoldingChanged,
            StateChangeType::FoldingChanged,
            StateChangeType::SearchChanged,
        ]
    );
    assert_eq!(manager.version(), 5);
}

#[test]
fn test_versions_and_has_changed_since() {
    let mut manager = manager();
    let before = manager.version();
    manager
        .execute(Command::Fold(FoldCommand::Toggle { index: 1 }))
        .unwrap();
    assert!(!manager.has_changed_since(before));

    manager
        .execute(Command::Fold(FoldCommand::FoldAll))
        .unwrap();
    assert!(manager.has_changed_since(before));
}

#[test]
fn test_full_state_snapshot() {
    let mut manager = manager();
    manager
        .execute(Command::Fold(FoldCommand::Toggle { index: 0 }))
        .unwrap();
    manager
        .execute(Command::Selection(SelectionCommand::SelectRange { start: 3, end: 3 }))
        .unwrap();

    let state = manager.get_full_state();
    assert_eq!(state.document.command_count, 5);
    assert!(!state.document.is_modified);
    assert_eq!(state.selection.selected, vec![3]);
    assert_eq!(state.selection.primary, Some(3));
    assert_eq!(state.folding.folded, vec![0]);
    assert_eq!(state.folding.hidden_count, 2);
    assert_eq!(state.folding.visible_count, 3);
    assert!(!state.undo_redo.can_undo);
    assert!(state.search.matches.is_empty());
}

#[test]
fn test_drag_through_manager_notifies() {
    let mut manager = manager();
    let seen = recorder(&mut manager);

    let mut session = manager.begin_drag(3).unwrap();
    session.hover(manager.executor().commands(), Some(0));
    manager.finish_drag(session);

    assert_eq!(manager.executor().commands()[0].code, code::EXIT_EVENT);
    let seen = seen.lock().unwrap().clone();
    assert!(seen.contains(&StateChangeType::DocumentModified));
    assert!(manager.get_document_state().is_modified);
    assert!(manager.get_undo_redo_state().can_undo);
}
