//! Editor State Interface
//!
//! Provides a state query interface for the editor, used for frontend rendering and state
//! synchronization.
//!
//! # Overview
//!
//! The state interface layer exposes the editor's internal state to the frontend in a
//! structured, immutable manner. It supports:
//!
//! - **State Queries**: document, selection, folding, undo/redo and search snapshots
//! - **Version Tracking**: a version number bumped on every observable change
//! - **Change Notifications**: subscribe to state change events
//!
//! # Example
//!
//! ```rust
//! use event_editor_core::{
//!     Command, CommandList, EditorStateManager, FoldCommand, code, EventCommand,
//! };
//!
//! let mut manager = EditorStateManager::new(CommandList::new(vec![
//!     EventCommand::new(code::LOOP, 0),
//!     EventCommand::placeholder(1),
//!     EventCommand::new(code::REPEAT_ABOVE, 0),
//! ]));
//!
//! manager.subscribe(|change| {
//!     println!("State changed: {:?}", change.change_type);
//! });
//!
//! manager
//!     .execute(Command::Fold(FoldCommand::Toggle { index: 0 }))
//!     .unwrap();
//! assert_eq!(manager.get_folding_state().hidden_count, 2);
//! assert_eq!(manager.version(), 1);
//! ```

use crate::commands::{Command, CommandExecutor, CommandResult};
use crate::command::CommandList;
use crate::error::EditError;
use crate::folding::FoldState;
use crate::movement::DragSession;
use crate::selection_set::SelectionSet;
use crate::structure::GroupRange;

/// Document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Number of commands, terminal included
    pub command_count: usize,
    /// Whether document has been modified since the last save
    pub is_modified: bool,
    /// State version number
    pub version: u64,
}

/// Selection state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    /// Selected indices in ascending order
    pub selected: Vec<usize>,
    /// Smallest selected index
    pub primary: Option<usize>,
    /// Last clicked index
    pub last_clicked: Option<usize>,
    /// Group highlight of a single selected row
    pub group_highlight: Option<GroupRange>,
}

/// Undo/redo stack state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoRedoState {
    /// Can undo
    pub can_undo: bool,
    /// Can redo
    pub can_redo: bool,
    /// Undo stack depth
    pub undo_depth: usize,
    /// Redo stack depth
    pub redo_depth: usize,
}

/// Folding state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldingState {
    /// Collapsed header indices
    pub folded: Vec<usize>,
    /// Count of hidden rows
    pub hidden_count: usize,
    /// Count of visible rows
    pub visible_count: usize,
}

/// Search state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    /// Matching indices of the active search
    pub matches: Vec<usize>,
}

/// State change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeType {
    /// Document content modified
    DocumentModified,
    /// Selection changed
    SelectionChanged,
    /// Folding state changed
    FoldingChanged,
    /// Search matches changed
    SearchChanged,
}

/// State change record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// Change type
    pub change_type: StateChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
}

impl StateChange {
    /// Create a new state change record.
    pub fn new(change_type: StateChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
        }
    }
}

/// Complete editor state snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    /// Document state
    pub document: DocumentState,
    /// Selection state
    pub selection: SelectionState,
    /// Undo/redo state
    pub undo_redo: UndoRedoState,
    /// Folding state
    pub folding: FoldingState,
    /// Search state
    pub search: SearchState,
}

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

struct Observed {
    commands: CommandList,
    selection: SelectionSet,
    folds: FoldState,
    matches: Vec<usize>,
}

/// Editor state manager
///
/// Wraps a [`CommandExecutor`]. Commands go through [`execute()`](EditorStateManager::execute),
/// which compares the observable state before and after and, for every kind of change that
/// actually happened, bumps the version and notifies subscribers. Commands that succeed without
/// changing anything do not bump the version.
pub struct EditorStateManager {
    executor: CommandExecutor,
    state_version: u64,
    is_modified: bool,
    callbacks: Vec<StateChangeCallback>,
}

impl EditorStateManager {
    /// Create a new state manager with a default executor
    pub fn new(commands: CommandList) -> Self {
        Self::from_executor(CommandExecutor::new(commands))
    }

    /// Wrap a configured executor
    pub fn from_executor(executor: CommandExecutor) -> Self {
        Self {
            executor,
            state_version: 0,
            is_modified: false,
            callbacks: Vec::new(),
        }
    }

    /// The wrapped executor
    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Execute a command and notify subscribers of what changed
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, EditError> {
        let before = self.observe();
        let result = self.executor.execute(command)?;
        self.publish_changes(before);
        Ok(result)
    }

    /// Start a pointer drag on `index`
    pub fn begin_drag(&self, index: usize) -> Result<DragSession, EditError> {
        self.executor.begin_drag(index)
    }

    /// Release a pointer drag and notify subscribers
    pub fn finish_drag(&mut self, session: DragSession) -> CommandResult {
        let before = self.observe();
        let result = self.executor.finish_drag(session);
        self.publish_changes(before);
        result
    }

    /// Get current version number
    pub fn version(&self) -> u64 {
        self.state_version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.state_version > version
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Mark a change made outside [`execute()`](Self::execute) and increment version number
    pub fn mark_modified(&mut self, change_type: StateChangeType) {
        self.mark_modified_internal(change_type, None);
    }

    /// Mark document as unmodified (e.g., after saving)
    pub fn mark_saved(&mut self) {
        self.executor.mark_clean();
        self.is_modified = false;
    }

    /// Get the complete state
    pub fn get_full_state(&self) -> EditorState {
        EditorState {
            document: self.get_document_state(),
            selection: self.get_selection_state(),
            undo_redo: self.get_undo_redo_state(),
            folding: self.get_folding_state(),
            search: self.get_search_state(),
        }
    }

    /// Get document state
    pub fn get_document_state(&self) -> DocumentState {
        DocumentState {
            command_count: self.executor.commands().len(),
            is_modified: self.is_modified,
            version: self.state_version,
        }
    }

    /// Get selection state
    pub fn get_selection_state(&self) -> SelectionState {
        let selection = self.executor.selection();
        SelectionState {
            selected: selection.indices().iter().copied().collect(),
            primary: selection.primary(),
            last_clicked: selection.last_clicked(),
            group_highlight: self.executor.group_highlight(),
        }
    }

    /// Get undo/redo state
    pub fn get_undo_redo_state(&self) -> UndoRedoState {
        UndoRedoState {
            can_undo: self.executor.can_undo(),
            can_redo: self.executor.can_redo(),
            undo_depth: self.executor.undo_depth(),
            redo_depth: self.executor.redo_depth(),
        }
    }

    /// Get folding state
    pub fn get_folding_state(&self) -> FoldingState {
        let hidden = self.executor.hidden_indices();
        FoldingState {
            folded: self.executor.folds().folded().iter().copied().collect(),
            hidden_count: hidden.len(),
            visible_count: self.executor.commands().len() - hidden.len(),
        }
    }

    /// Get search state
    pub fn get_search_state(&self) -> SearchState {
        SearchState {
            matches: self.executor.search_matches().to_vec(),
        }
    }

    fn observe(&self) -> Observed {
        Observed {
            commands: self.executor.commands().clone(),
            selection: self.executor.selection().clone(),
            folds: self.executor.folds().clone(),
            matches: self.executor.search_matches().to_vec(),
        }
    }

    fn publish_changes(&mut self, before: Observed) {
        if !CommandList::ptr_eq(&before.commands, self.executor.commands()) {
            let is_modified = !self.executor.is_clean();
            self.mark_modified_internal(StateChangeType::DocumentModified, Some(is_modified));
        }
        if &before.selection != self.executor.selection() {
            self.mark_modified_internal(StateChangeType::SelectionChanged, None);
        }
        if &before.folds != self.executor.folds() {
            self.mark_modified_internal(StateChangeType::FoldingChanged, None);
        }
        if before.matches != self.executor.search_matches() {
            self.mark_modified_internal(StateChangeType::SearchChanged, None);
        }
    }

    fn mark_modified_internal(
        &mut self,
        change_type: StateChangeType,
        is_modified_override: Option<bool>,
    ) {
        let old_version = self.state_version;
        self.state_version += 1;

        // Only document content changes affect the modified flag.
        if matches!(change_type, StateChangeType::DocumentModified) {
            self.is_modified = is_modified_override.unwrap_or(true);
        }

        let change = StateChange::new(change_type, old_version, self.state_version);
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}
