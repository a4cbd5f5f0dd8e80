//! Command Interface Layer
//!
//! Provides a unified command interface for convenient frontend integration.
//!
//! # Overview
//!
//! [`CommandExecutor`] owns one editor instance: the command history, the selection, the fold
//! state and the active search. Every host request is expressed as a [`Command`]:
//!
//! - **Edit**: delete, cut, paste, indent, disable toggle, moves, structural insert/update,
//!   replace, undo and redo
//! - **Selection**: click semantics and range selection
//! - **Fold**: toggle, fold all, unfold all
//! - **Search**: find and clear
//! - **Clipboard**: copy
//!
//! Every document mutation is committed through the history as a new [`CommandList`]; fold
//! indices and the selection are then brought in line with the new list.
//!
//! # Example
//!
//! ```rust
//! use event_editor_core::{
//!     Command, CommandExecutor, CommandList, EditCommand, ParameterEditorResult,
//!     SelectionCommand, code,
//! };
//!
//! let mut executor = CommandExecutor::new(CommandList::default());
//!
//! executor
//!     .execute(Command::Edit(EditCommand::Insert {
//!         code: code::LOOP,
//!         result: ParameterEditorResult::default(),
//!     }))
//!     .unwrap();
//! assert_eq!(executor.commands().len(), 4);
//!
//! executor
//!     .execute(Command::Selection(SelectionCommand::SelectAll))
//!     .unwrap();
//! executor.execute(Command::Edit(EditCommand::Delete)).unwrap();
//! assert_eq!(executor.commands().len(), 1);
//! ```

use crate::builders::{BuildOutcome, ParameterEditorResult, insert_command, update_command};
use crate::clipboard::{SharedClipboard, copy_commands, delete_commands, paste_commands};
use crate::command::{CommandList, EventCommand};
use crate::config::EditorConfig;
use crate::disable::{ToggleOutcome, toggle_disabled};
use crate::error::EditError;
use crate::folding::FoldState;
use crate::history::History;
use crate::movement::{DragSession, MoveOutcome, complete_move, move_down, move_up, shift_indent};
use crate::render::{DisplayText, PlainDisplayText, RenderContext, fold_preview};
use crate::search::{SearchOptions, SearchPattern, find_matches, replace_all, replace_at};
use crate::selection_set::{ClickModifier, SelectionSet};
use crate::structure::{GroupRange, resolve_group_range, terminal_index};
use event_editor_codes::{Code, CodeTable};

/// Document editing commands
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Delete the group-expanded selection
    Delete,
    /// Copy then delete the selection
    Cut,
    /// Paste the clipboard at the primary selection (or before the terminal)
    Paste,
    /// Shift the selection one indent level deeper
    Indent,
    /// Shift the selection one indent level shallower
    Outdent,
    /// Disable the selection, or re-enable it when it is entirely disabled
    ToggleDisabled,
    /// Move the selection up past the adjacent group
    MoveUp,
    /// Move the selection down past the adjacent group
    MoveDown,
    /// Complete a pointer drag
    Drop {
        /// Dragged range (as returned by a drag grab).
        drag: GroupRange,
        /// Index the group is dropped in front of.
        target: usize,
    },
    /// Insert a new command (with its skeleton) at the primary selection
    Insert {
        /// Operation code.
        code: Code,
        /// Parameter editor output.
        result: ParameterEditorResult,
    },
    /// Apply a parameter editor result to an existing command
    Update {
        /// Index of the edited command.
        index: usize,
        /// Parameter editor output.
        result: ParameterEditorResult,
    },
    /// Replace matches of the active search inside one command
    Replace {
        /// Index of the command.
        index: usize,
        /// Replacement text.
        replacement: String,
    },
    /// Replace every match of the active search
    ReplaceAll {
        /// Replacement text.
        replacement: String,
    },
    /// Undo
    Undo,
    /// Redo
    Redo,
}

/// Selection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Click a row
    Click {
        /// Clicked index.
        index: usize,
        /// Held modifier.
        modifier: ClickModifier,
    },
    /// Select a contiguous range
    SelectRange {
        /// First index.
        start: usize,
        /// Last index (inclusive).
        end: usize,
    },
    /// Select every command except the terminal
    SelectAll,
    /// Clear the selection
    Clear,
}

/// Folding commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldCommand {
    /// Toggle the fold headed at `index`
    Toggle {
        /// Header index.
        index: usize,
    },
    /// Collapse every foldable group
    FoldAll,
    /// Expand everything
    UnfoldAll,
}

/// Search commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    /// Search and remember the pattern for replace
    Find {
        /// Query text.
        query: String,
        /// Search options.
        options: SearchOptions,
    },
    /// Forget the active search
    Clear,
}

/// Clipboard commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardCommand {
    /// Copy the group-expanded selection
    Copy,
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Document editing commands
    Edit(EditCommand),
    /// Selection commands
    Selection(SelectionCommand),
    /// Folding commands
    Fold(FoldCommand),
    /// Search commands
    Search(SearchCommand),
    /// Clipboard commands
    Clipboard(ClipboardCommand),
}

/// Command execution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Success, no return value
    Success,
    /// Nothing to do (empty undo stack, no-op move, nothing matched, ...)
    Unchanged,
    /// Copy result: number of commands placed on the clipboard
    Copied {
        /// Number of copied commands.
        count: usize,
    },
    /// Search result: matching indices in ascending order
    Matches(Vec<usize>),
    /// Replace result: how many occurrences were replaced
    Replaced {
        /// Number of occurrences replaced.
        replaced: usize,
    },
}

struct ActiveSearch {
    pattern: SearchPattern,
    matches: Vec<usize>,
}

/// Command executor
///
/// Holds one editor instance. The clipboard defaults to the process-wide
/// [`SharedClipboard::global`], so a copy in one executor can be pasted into another.
///
/// # Example
///
/// ```rust
/// use event_editor_core::{
///     Command, CommandExecutor, CommandList, EditCommand, EventCommand, SelectionCommand,
/// };
///
/// let commands = CommandList::new(vec![
///     EventCommand::new(115, 0),
///     EventCommand::new(113, 0),
/// ]);
/// let mut executor = CommandExecutor::new(commands);
///
/// executor
///     .execute(Command::Selection(SelectionCommand::SelectRange { start: 1, end: 1 }))
///     .unwrap();
/// executor.execute(Command::Edit(EditCommand::MoveUp)).unwrap();
/// assert_eq!(executor.commands()[0].code, 113);
///
/// executor.execute(Command::Edit(EditCommand::Undo)).unwrap();
/// assert_eq!(executor.commands()[0].code, 115);
/// ```
pub struct CommandExecutor {
    history: History,
    selection: SelectionSet,
    folds: FoldState,
    clipboard: SharedClipboard,
    table: CodeTable,
    config: EditorConfig,
    renderer: Box<dyn DisplayText + Send>,
    search: Option<ActiveSearch>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("commands", &self.history.current().len())
            .field("selection", &self.selection)
            .field("folds", &self.folds)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CommandExecutor {
    /// Create an executor with the standard code table and default configuration
    pub fn new(commands: CommandList) -> Self {
        let config = EditorConfig::default();
        Self {
            history: History::new(commands, config.history_limit),
            selection: SelectionSet::new(),
            folds: FoldState::new(),
            clipboard: SharedClipboard::global(),
            table: CodeTable::standard(),
            config,
            renderer: Box::new(PlainDisplayText),
            search: None,
        }
    }

    /// Use a custom code table
    pub fn with_table(mut self, table: CodeTable) -> Self {
        self.table = table;
        self
    }

    /// Apply a configuration. Resets the history to the current list.
    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.history = History::new(self.history.current().clone(), config.history_limit);
        self.config = config;
        self
    }

    /// Use a specific clipboard handle
    pub fn with_clipboard(mut self, clipboard: SharedClipboard) -> Self {
        self.clipboard = clipboard;
        self
    }

    /// Use a host display-text function
    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: DisplayText + Send + 'static,
    {
        self.renderer = Box::new(renderer);
        self
    }

    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, EditError> {
        match command {
            Command::Edit(edit_cmd) => self.execute_edit(edit_cmd),
            Command::Selection(selection_cmd) => self.execute_selection(selection_cmd),
            Command::Fold(fold_cmd) => Ok(self.execute_fold(fold_cmd)),
            Command::Search(search_cmd) => Ok(self.execute_search(search_cmd)),
            Command::Clipboard(ClipboardCommand::Copy) => Ok(self.copy()),
        }
    }

    /// Batch execute commands, stopping at the first error
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, EditError> {
        commands
            .into_iter()
            .map(|command| self.execute(command))
            .collect()
    }

    /// The current command list
    pub fn commands(&self) -> &CommandList {
        self.history.current()
    }

    /// The selection
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// The fold state
    pub fn folds(&self) -> &FoldState {
        &self.folds
    }

    /// The code table
    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    /// The configuration
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The clipboard handle
    pub fn clipboard(&self) -> &SharedClipboard {
        &self.clipboard
    }

    /// Matches of the active search (empty without one)
    pub fn search_matches(&self) -> &[usize] {
        self.search
            .as_ref()
            .map_or(&[][..], |search| search.matches.as_slice())
    }

    /// Can undo
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Can redo
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// Redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Whether the current list is at the clean point
    pub fn is_clean(&self) -> bool {
        self.history.is_clean()
    }

    /// Mark the current list as the clean point (call after saving)
    pub fn mark_clean(&mut self) {
        self.history.mark_clean();
    }

    /// Indices hidden by collapsed folds
    pub fn hidden_indices(&self) -> std::collections::BTreeSet<usize> {
        self.folds.hidden_indices(self.commands(), &self.table)
    }

    /// Visible indices in order
    pub fn visible_indices(&self) -> Vec<usize> {
        self.folds.visible_indices(self.commands(), &self.table)
    }

    /// Rows hidden by the fold at `index`
    pub fn hidden_count(&self, index: usize) -> usize {
        self.folds.hidden_count(self.commands(), index, &self.table)
    }

    /// Host display text of the command at `index`
    pub fn display_text(&self, index: usize) -> Option<String> {
        let commands = self.commands();
        let command = commands.get(index)?;
        let context = RenderContext { commands, index };
        Some(self.renderer.display_text(command, &context))
    }

    /// Label of the collapsed fold at `index`
    pub fn fold_preview(&self, index: usize) -> Option<String> {
        if !self.folds.is_folded(index) {
            return None;
        }
        let text = self.display_text(index)?;
        Some(fold_preview(
            &text,
            self.hidden_count(index),
            self.config.fold_preview_width,
        ))
    }

    /// Group highlight of a single selected row
    pub fn group_highlight(&self) -> Option<GroupRange> {
        self.selection.group_highlight(self.commands(), &self.table)
    }

    /// Start a pointer drag on `index`
    pub fn begin_drag(&self, index: usize) -> Result<DragSession, EditError> {
        DragSession::begin(self.commands(), index, &self.table)
    }

    /// Release a pointer drag. A session without a valid target is cancelled.
    pub fn finish_drag(&mut self, session: DragSession) -> CommandResult {
        match session.finish(self.commands(), &self.table) {
            Some(outcome) => self.apply_move("drop", outcome),
            None => CommandResult::Unchanged,
        }
    }

    fn execute_edit(&mut self, command: EditCommand) -> Result<CommandResult, EditError> {
        match command {
            EditCommand::Delete => self.delete("delete"),
            EditCommand::Cut => {
                self.copy();
                self.delete("cut")
            }
            EditCommand::Paste => self.paste(),
            EditCommand::Indent => Ok(self.shift(1)),
            EditCommand::Outdent => Ok(self.shift(-1)),
            EditCommand::ToggleDisabled => self.toggle_disabled(),
            EditCommand::MoveUp => {
                let outcome = move_up(self.commands(), self.selection.indices(), &self.table);
                Ok(outcome.map_or(CommandResult::Unchanged, |o| self.apply_move("move up", o)))
            }
            EditCommand::MoveDown => {
                let outcome = move_down(self.commands(), self.selection.indices(), &self.table);
                Ok(outcome.map_or(CommandResult::Unchanged, |o| {
                    self.apply_move("move down", o)
                }))
            }
            EditCommand::Drop { drag, target } => {
                let outcome = complete_move(self.commands(), drag, target, &self.table)?;
                Ok(outcome.map_or(CommandResult::Unchanged, |o| self.apply_move("drop", o)))
            }
            EditCommand::Insert { code, result } => {
                let outcome = insert_command(
                    self.commands(),
                    self.selection.primary(),
                    code,
                    &result,
                    &self.table,
                )?;
                let range = outcome.range;
                self.commit("insert", outcome.commands);
                self.folds.apply_insertion(range.start(), range.len());
                self.after_document_change();
                self.selection.select_indices([range.start()]);
                Ok(CommandResult::Success)
            }
            EditCommand::Update { index, result } => {
                let before = self.commands().clone();
                let outcome = update_command(&before, index, &result, &self.table)?;
                self.apply_update(&before, index, outcome);
                Ok(CommandResult::Success)
            }
            EditCommand::Replace { index, replacement } => Ok(self.replace(index, &replacement)),
            EditCommand::ReplaceAll { replacement } => Ok(self.replace_all(&replacement)),
            EditCommand::Undo => Ok(self.step_history(History::undo)),
            EditCommand::Redo => Ok(self.step_history(History::redo)),
        }
    }

    fn execute_selection(&mut self, command: SelectionCommand) -> Result<CommandResult, EditError> {
        let len = self.commands().len();
        match command {
            SelectionCommand::Click { index, modifier } => {
                if index >= len {
                    return Err(EditError::IndexOutOfBounds { index, len });
                }
                let commands = self.history.current();
                self.selection.click(commands, index, modifier, &self.table);
            }
            SelectionCommand::SelectRange { start, end } => {
                let range = GroupRange::new(start, end);
                if range.end() >= len {
                    return Err(EditError::IndexOutOfBounds {
                        index: range.end(),
                        len,
                    });
                }
                self.selection.select_range(range);
            }
            SelectionCommand::SelectAll => {
                let commands = self.history.current();
                self.selection.select_all(commands);
            }
            SelectionCommand::Clear => self.selection.clear(),
        }
        Ok(CommandResult::Success)
    }

    fn execute_fold(&mut self, command: FoldCommand) -> CommandResult {
        let commands = self.history.current();
        match command {
            FoldCommand::Toggle { index } => {
                if !self.folds.toggle(commands, index, &self.table) {
                    return CommandResult::Unchanged;
                }
            }
            FoldCommand::FoldAll => self.folds.fold_all(commands, &self.table),
            FoldCommand::UnfoldAll => self.folds.unfold_all(),
        }
        CommandResult::Success
    }

    fn execute_search(&mut self, command: SearchCommand) -> CommandResult {
        match command {
            SearchCommand::Find { query, options } => {
                let pattern = match SearchPattern::new(&query, options) {
                    Ok(pattern) => pattern,
                    Err(err) => {
                        log::debug!("search for {query:?} yields no matches: {err}");
                        self.search = None;
                        return CommandResult::Matches(Vec::new());
                    }
                };
                let matches = self.find(&pattern);
                self.reveal_matches(&matches);
                self.search = Some(ActiveSearch {
                    pattern,
                    matches: matches.clone(),
                });
                CommandResult::Matches(matches)
            }
            SearchCommand::Clear => {
                self.search = None;
                CommandResult::Success
            }
        }
    }

    fn find(&self, pattern: &SearchPattern) -> Vec<usize> {
        find_matches(self.commands(), pattern, self.renderer.as_ref(), &self.table)
    }

    fn copy(&mut self) -> CommandResult {
        let copied = copy_commands(self.commands(), self.selection.indices(), &self.table);
        if copied.is_empty() {
            return CommandResult::Unchanged;
        }
        let count = copied.len();
        self.clipboard.store(copied);
        CommandResult::Copied { count }
    }

    fn delete(&mut self, operation: &str) -> Result<CommandResult, EditError> {
        if self.selection.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let terminal = terminal_index(self.commands());
        let Some(outcome) = delete_commands(self.commands(), self.selection.indices(), &self.table)
        else {
            if self.selection.contains(terminal) {
                return Err(EditError::TerminalProtected);
            }
            return Ok(CommandResult::Unchanged);
        };

        self.commit(operation, outcome.commands);
        self.folds.apply_removal(&outcome.removed);
        self.after_document_change();
        self.selection.select_indices([outcome.select]);
        Ok(CommandResult::Success)
    }

    fn paste(&mut self) -> Result<CommandResult, EditError> {
        let clipboard = self.clipboard.load().ok_or(EditError::NothingToPaste)?;
        let outcome = paste_commands(
            self.commands(),
            &clipboard,
            self.selection.primary(),
            &self.table,
        )
        .ok_or(EditError::NothingToPaste)?;

        let inserted = outcome.inserted;
        self.commit("paste", outcome.commands);
        self.folds.apply_insertion(inserted.start(), inserted.len());
        self.after_document_change();
        self.selection.select_range(inserted);
        Ok(CommandResult::Success)
    }

    fn shift(&mut self, delta: isize) -> CommandResult {
        match shift_indent(self.commands(), self.selection.indices(), delta, &self.table) {
            Some((commands, _)) => {
                self.commit(if delta > 0 { "indent" } else { "outdent" }, commands);
                self.after_document_change();
                CommandResult::Success
            }
            None => CommandResult::Unchanged,
        }
    }

    fn toggle_disabled(&mut self) -> Result<CommandResult, EditError> {
        if self.selection.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let Some(outcome) = toggle_disabled(self.commands(), self.selection.indices(), &self.table)
        else {
            return Ok(CommandResult::Unchanged);
        };

        match outcome {
            ToggleOutcome::Disabled { commands, ranges } => {
                self.commit("disable", commands);
                self.after_document_change();
                self.selection
                    .select_indices(ranges.iter().flat_map(GroupRange::indices));
            }
            ToggleOutcome::Enabled { commands, restored } => {
                self.commit("enable", commands);
                self.after_document_change();
                self.selection.select_indices(restored);
            }
        }
        Ok(CommandResult::Success)
    }

    fn apply_move(&mut self, operation: &str, outcome: MoveOutcome) -> CommandResult {
        let MoveOutcome {
            commands,
            from,
            moved,
        } = outcome;
        self.commit(operation, commands);
        self.folds.apply_move(from, moved.start());
        self.after_document_change();
        self.selection.select_range(moved);
        CommandResult::Success
    }

    fn apply_update(&mut self, before: &[EventCommand], index: usize, outcome: BuildOutcome) {
        let old_group = resolve_group_range(before, index, &self.table);
        let grown = outcome.commands.len() as isize - before.len() as isize;
        self.commit("update", outcome.commands);

        // Branch edits happen inside the old group; folds after it shift by the size change.
        if grown > 0 {
            self.folds.apply_insertion(old_group.end(), grown.unsigned_abs());
        } else if grown < 0 {
            let removed = grown.unsigned_abs();
            let start = (old_group.end() + 1).saturating_sub(removed);
            self.folds
                .apply_removal(&[GroupRange::new(start, old_group.end())]);
        }
        self.after_document_change();
        self.selection.select_indices([index]);
    }

    fn replace(&mut self, index: usize, replacement: &str) -> CommandResult {
        let Some(search) = &self.search else {
            return CommandResult::Unchanged;
        };
        let outcome = replace_at(
            self.commands(),
            index,
            &search.pattern,
            replacement,
            &self.table,
        );
        match outcome {
            Some((commands, replaced)) => {
                self.commit("replace", commands);
                self.after_document_change();
                CommandResult::Replaced { replaced }
            }
            None => CommandResult::Unchanged,
        }
    }

    fn replace_all(&mut self, replacement: &str) -> CommandResult {
        let Some(search) = &self.search else {
            return CommandResult::Unchanged;
        };
        let outcome = replace_all(self.commands(), &search.pattern, replacement, &self.table);
        match outcome {
            Some((commands, replaced, _)) => {
                self.commit("replace all", commands);
                self.after_document_change();
                CommandResult::Replaced { replaced }
            }
            None => CommandResult::Unchanged,
        }
    }

    fn step_history(&mut self, step: fn(&mut History, &mut FoldState) -> bool) -> CommandResult {
        if !step(&mut self.history, &mut self.folds) {
            return CommandResult::Unchanged;
        }
        self.after_document_change();
        CommandResult::Success
    }

    fn commit(&mut self, operation: &str, commands: Vec<EventCommand>) {
        let before = self.history.current().len();
        let next = CommandList::new(commands);
        log::debug!("{operation}: {before} -> {} commands", next.len());
        self.history.commit(next, self.folds.clone());
    }

    fn after_document_change(&mut self) {
        let commands = self.history.current();
        self.selection.clamp_to(commands.len());
        self.folds.retain_foldable(commands, &self.table);

        let Some(matches) = self
            .search
            .as_ref()
            .map(|search| self.find(&search.pattern))
        else {
            return;
        };
        self.reveal_matches(&matches);
        if let Some(search) = self.search.as_mut() {
            search.matches = matches;
        }
    }

    fn reveal_matches(&mut self, matches: &[usize]) {
        if !self.config.unfold_on_search {
            return;
        }
        let commands = self.history.current();
        let expanded = self.folds.unfold_containing(commands, matches, &self.table);
        if !expanded.is_empty() {
            log::debug!("search expanded folds {expanded:?}");
        }
    }
}
