#![warn(missing_docs)]
//! Event Editor Core - Headless Structural Editor for Event Command Lists
//!
//! # Overview
//!
//! `event-editor-core` edits scripted event logic stored as a flat, ordered list of commands
//! whose nesting (conditionals, loops, choice menus, battle branches, multi-line text, disabled
//! blocks) is encoded only through an indent number and marker codes. It never builds a tree:
//! block structure is re-derived on demand by the structural range resolver, and every
//! operation acts on whole structural groups.
//!
//! It does not render anything. The host supplies display text for commands and delivers
//! pre-resolved indices (clicked rows, drop targets).
//!
//! # Core Features
//!
//! - **Structural Grouping**: continuation runs and blocks with same-code nesting
//! - **Folding**: collapse any group with a body, derived hidden rows and counts
//! - **Clipboard**: structural copy/cut/paste with indent re-basing, shared across editors
//! - **Moves**: pointer drag and keyboard moves of whole groups
//! - **Disable/Enable**: reversible comment encoding of whole blocks
//! - **Find/Replace**: over rendered text and string arguments, folding-aware
//! - **Builders**: block skeletons on insert, branch diffing on update
//! - **History**: snapshot undo/redo with clean-point tracking
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface & State Management       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Clipboard / Moves / Disable / Search /     │
//! │  Builders / Folding / Selection             │  ← Operations
//! ├─────────────────────────────────────────────┤
//! │  History (snapshot undo/redo)               │  ← Mutation discipline
//! ├─────────────────────────────────────────────┤
//! │  Structural Range Resolver                  │  ← Structure inference
//! ├─────────────────────────────────────────────┤
//! │  Command Model + Code Table                 │  ← Data
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Using Command Interface
//!
//! ```rust
//! use event_editor_core::{
//!     Command, CommandExecutor, CommandList, EditCommand, ParameterEditorResult,
//!     SelectionCommand, code,
//! };
//! use serde_json::json;
//!
//! let mut executor = CommandExecutor::new(CommandList::default());
//!
//! // Insert a conditional with an else branch
//! executor
//!     .execute(Command::Edit(EditCommand::Insert {
//!         code: code::CONDITIONAL,
//!         result: ParameterEditorResult::new(vec![json!(0), json!(1), json!(0)])
//!             .with_extra_commands(vec![event_editor_core::EventCommand::new(code::ELSE, 0)]),
//!     }))
//!     .unwrap();
//! assert_eq!(executor.commands().len(), 6);
//!
//! // Disable the whole block, then enable it again
//! executor
//!     .execute(Command::Selection(SelectionCommand::SelectRange { start: 0, end: 0 }))
//!     .unwrap();
//! executor.execute(Command::Edit(EditCommand::ToggleDisabled)).unwrap();
//! assert!(executor.commands()[..5].iter().all(|c| c.code == code::COMMENT));
//! executor.execute(Command::Edit(EditCommand::ToggleDisabled)).unwrap();
//! assert_eq!(executor.commands()[0].code, code::CONDITIONAL);
//! ```
//!
//! ## Using State Management
//!
//! ```rust
//! use event_editor_core::{CommandList, EditorStateManager};
//!
//! let mut manager = EditorStateManager::new(CommandList::default());
//!
//! manager.subscribe(|change| {
//!     println!("State changed: {:?}", change.change_type);
//! });
//!
//! let doc_state = manager.get_document_state();
//! println!("Commands: {}", doc_state.command_count);
//! ```
//!
//! # Module Description
//!
//! - [`command`] - Command records and the shared command list
//! - [`structure`] - Structural range resolution
//! - [`history`] - Snapshot undo/redo
//! - [`folding`] - Fold state and derived visibility
//! - [`clipboard`] - Structural copy/cut/paste/delete and the shared clipboard
//! - [`movement`] - Pointer drag and keyboard moves
//! - [`disable`] - Reversible disable/enable encoding
//! - [`search`] - Find/replace
//! - [`builders`] - Insert/update builders
//! - [`render`] - Display-text hook and fold previews
//! - [`commands`] - Unified command interface
//! - [`state`] - State management and query interface

pub mod builders;
pub mod clipboard;
pub mod command;
pub mod commands;
pub mod config;
pub mod disable;
pub mod error;
pub mod folding;
pub mod history;
pub mod movement;
pub mod render;
pub mod search;
mod selection_set;
pub mod state;
pub mod structure;

pub use builders::{
    BuildOutcome, DesiredBranches, ParameterEditorResult, build_block, insert_command,
    update_command,
};
pub use clipboard::{
    CLIPBOARD_MARKER, ClipboardEnvelope, ClipboardError, DeleteOutcome, MemoryClipboard,
    PasteOutcome, PlatformClipboard, SharedClipboard, copy_commands, delete_commands,
    paste_commands,
};
pub use command::{CommandList, CommandState, EventCommand};
pub use commands::{
    ClipboardCommand, Command, CommandExecutor, CommandResult, EditCommand, FoldCommand,
    SearchCommand, SelectionCommand,
};
pub use config::EditorConfig;
pub use disable::{
    DISABLED_PREFIX, DisabledPayload, ToggleOutcome, disable_commands, disabled_block_members,
    disabled_block_span, enable_commands, is_all_disabled, new_block_id, toggle_disabled,
};
pub use error::{ConfigError, EditError};
pub use event_editor_codes::{Code, CodeRole, CodeTable, code};
pub use folding::{FoldState, foldable_indices, is_foldable};
pub use history::{DEFAULT_HISTORY_LIMIT, History};
pub use movement::{
    DragSession, MoveOutcome, begin_drag, complete_move, move_down, move_up, required_indent_at,
    shift_indent,
};
pub use render::{
    DisplayText, PlainDisplayText, RenderContext, fold_preview, truncate_to_width,
};
pub use search::{
    SearchError, SearchOptions, SearchPattern, command_matches, find_matches, replace_all,
    replace_at, replace_in_command,
};
pub use selection_set::{ClickModifier, SelectionSet};
pub use state::{
    DocumentState, EditorState, EditorStateManager, FoldingState, SearchState, SelectionState,
    StateChange, StateChangeCallback, StateChangeType, UndoRedoState,
};
pub use structure::{
    GroupRange, expand_selection_to_groups, is_valid_drop_target, parent_index,
    resolve_enclosing_group, resolve_group_range, terminal_index,
};
